use std::path::PathBuf;

use thiserror::Error;

use crate::bbox::{BBox, FrameSize};
use crate::session::SessionState;
use crate::tracker::TrackerAlgorithm;

/// Failures building or driving a single-object tracker
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Degenerate bounding box {0:?}: width and height must be positive")]
    DegenerateBox(BBox),
    #[error("Bounding box {bbox:?} lies outside the {frame} frame")]
    OutOfFrame { bbox: BBox, frame: FrameSize },
    #[error("Failed to create {0} tracker: {1}")]
    CreateError(TrackerAlgorithm, String),
    #[error("Failed to initialize tracker: {0}")]
    InitError(String),
    #[error("Failed to update tracker: {0}")]
    UpdateError(String),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to open video source {path:?}: {reason}")]
    OpenError { path: PathBuf, reason: String },
    #[error("Failed to read frame: {0}")]
    ReadError(String),
    #[error("Video source produced no frames")]
    Empty,
}

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Failed to load detector model: {0}")]
    LoadError(String),
    #[error("Failed to run detection: {0}")]
    RunError(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failure_threshold must be at least 1")]
    ZeroThreshold,
}

/// Terminal failures of a tracking session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Failed to start tracking: {0}")]
    Init(#[from] TrackerError),
    #[error("Initial detection failed: {0}")]
    Detect(#[from] DetectError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to render frame: {0}")]
    Render(String),
    #[error("Operation not allowed in {0:?} state")]
    InvalidState(SessionState),
}
