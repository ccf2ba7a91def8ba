use crate::bbox::{BBox, DetectionResult};
use crate::error::DetectError;

/// Object detector run on session start and on reacquisition.
///
/// The model behind it is loaded once and reused for every call. An empty
/// result is a valid answer, not an error.
pub trait Detector<F> {
    fn detect(&mut self, frame: &F) -> Result<Vec<DetectionResult>, DetectError>;
}

/// Boxes used to seed the tracker set, in detection order
pub fn seed_boxes(detections: &[DetectionResult]) -> Vec<BBox> {
    detections.iter().map(|d| d.bbox).collect()
}
