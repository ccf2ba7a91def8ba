//! OpenCV-backed collaborators: video capture, the tracker catalog, a
//! Darknet detector and a HighGUI window.

pub mod capture;
pub mod display;
pub mod dnn;
pub mod trackers;

use opencv::core::{Mat, Rect};
use opencv::prelude::*;

use crate::bbox::{BBox, Frame, FrameSize};

pub use capture::VideoFileSource;
pub use display::HighGuiRenderer;
pub use dnn::{YoloConfig, YoloDetector};
pub use trackers::{OpenCvTracker, OpenCvTrackerFactory};

impl Frame for Mat {
    fn size(&self) -> FrameSize {
        FrameSize::new(self.cols(), self.rows())
    }
}

impl From<BBox> for Rect {
    fn from(bbox: BBox) -> Self {
        Rect::new(bbox.x, bbox.y, bbox.width, bbox.height)
    }
}

impl From<Rect> for BBox {
    fn from(rect: Rect) -> Self {
        BBox::new(rect.x, rect.y, rect.width, rect.height)
    }
}
