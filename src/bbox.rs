use std::fmt;

use ndarray::{Array3, ArrayView3};

use crate::error::TrackerError;

/// Pixel extent of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameSize {
    pub width: i32,
    pub height: i32,
}

impl FrameSize {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Anything the session can push through detectors and trackers.
///
/// The core only needs the pixel extent; the pixel container itself is
/// whatever the backend works with.
pub trait Frame {
    fn size(&self) -> FrameSize;
}

/// HWC image, the layout `opencv::core::Mat` data is viewed as
impl Frame for Array3<u8> {
    fn size(&self) -> FrameSize {
        let (h, w, _) = self.dim();
        FrameSize::new(w as i32, h as i32)
    }
}

impl Frame for ArrayView3<'_, u8> {
    fn size(&self) -> FrameSize {
        let (h, w, _) = self.dim();
        FrameSize::new(w as i32, h as i32)
    }
}

/// Bounding box [x, y, width, height], top-left origin, pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Right edge, saturating for garbage backend output
    #[inline]
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Whether the box lies inside the frame. Touching the edge counts.
    pub fn fits_within(&self, size: FrameSize) -> bool {
        self.x >= 0 && self.y >= 0 && self.right() <= size.width && self.bottom() <= size.height
    }

    /// Check the box can seed a tracker on a frame of `size`
    pub fn validate(&self, size: FrameSize) -> Result<(), TrackerError> {
        if self.is_degenerate() {
            return Err(TrackerError::DegenerateBox(*self));
        }
        if !self.fits_within(size) {
            return Err(TrackerError::OutOfFrame {
                bbox: *self,
                frame: size,
            });
        }
        Ok(())
    }

    /// Intersect with the frame, used by detectors whose raw output spills
    /// past the border. The result may be degenerate.
    pub fn clip(&self, size: FrameSize) -> Self {
        let x1 = self.x.clamp(0, size.width);
        let y1 = self.y.clamp(0, size.height);
        let x2 = self.right().clamp(0, size.width);
        let y2 = self.bottom().clamp(0, size.height);
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }
}

/// One object found by a detector pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionResult {
    pub bbox: BBox,
    pub label: Option<String>,
    pub confidence: Option<f32>,
}

impl DetectionResult {
    pub fn new(bbox: BBox) -> Self {
        Self {
            bbox,
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}
