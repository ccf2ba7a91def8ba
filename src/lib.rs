pub mod bbox;
pub mod config;
pub mod detector;
pub mod error;
pub mod multi;
pub mod render;
pub mod session;
pub mod source;
pub mod tracker;

#[cfg(feature = "opencv")]
pub mod cv;

#[cfg(test)]
mod testing;

pub use bbox::{BBox, DetectionResult, Frame, FrameSize};
pub use config::SessionConfig;
pub use detector::Detector;
pub use error::{ConfigError, DetectError, SessionError, SourceError, TrackerError};
pub use multi::{MultiTracker, MultiUpdate};
pub use render::{FpsMeter, LogRenderer, Renderer};
pub use session::{CancellationToken, FrameReport, RunSummary, SessionState, TrackingSession};
pub use source::FrameSource;
pub use tracker::{Tracker, TrackerAlgorithm, TrackerFactory, TrackingResult};
