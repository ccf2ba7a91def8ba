use std::path::Path;

use log::warn;

use crate::bbox::Frame;
use crate::error::SourceError;

/// Sequential, pull-based frame reader.
///
/// Implementations release the underlying handle when dropped.
pub trait FrameSource {
    type Frame: Frame;

    /// Next frame, or `None` once the stream is exhausted
    fn read(&mut self) -> Result<Option<Self::Frame>, SourceError>;
}

/// Open a source, retrying once before giving up
pub fn open_with_retry<S, O>(path: &Path, mut open: O) -> Result<S, SourceError>
where
    O: FnMut(&Path) -> Result<S, SourceError>,
{
    match open(path) {
        Ok(source) => Ok(source),
        Err(e) => {
            warn!("Could not open {}: {}. Attempting to re-open", path.display(), e);
            open(path)
        }
    }
}
