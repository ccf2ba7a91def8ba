use std::path::{Path, PathBuf};

use log::{debug, warn};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio;

use crate::error::SourceError;
use crate::source::{FrameSource, open_with_retry};

/// Video file (or stream URL) read through `cv::VideoCapture`.
///
/// The capture is released when the source is dropped.
pub struct VideoFileSource {
    path: PathBuf,
    capture: videoio::VideoCapture,
}

impl VideoFileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let capture = open_with_retry(path, open_capture)?;
        debug!("Opened {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            capture,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_capture(path: &Path) -> Result<videoio::VideoCapture, SourceError> {
    let open_error = |reason: String| SourceError::OpenError {
        path: path.to_path_buf(),
        reason,
    };
    let name = path
        .to_str()
        .ok_or_else(|| open_error("path is not valid UTF-8".to_string()))?;

    let capture = videoio::VideoCapture::from_file(name, videoio::CAP_ANY)
        .map_err(|e| open_error(e.to_string()))?;
    if !capture.is_opened().map_err(|e| open_error(e.to_string()))? {
        return Err(open_error("capture is not opened".to_string()));
    }
    Ok(capture)
}

impl FrameSource for VideoFileSource {
    type Frame = Mat;

    fn read(&mut self) -> Result<Option<Mat>, SourceError> {
        let mut frame = Mat::default();
        let ok = self
            .capture
            .read(&mut frame)
            .map_err(|e| SourceError::ReadError(e.to_string()))?;
        if !ok || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }
}

impl Drop for VideoFileSource {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release {}: {}", self.path.display(), e);
        }
    }
}
