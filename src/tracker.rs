use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bbox::BBox;
use crate::error::TrackerError;

/// Outcome of one tracker update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackingResult {
    pub success: bool,
    pub bbox: BBox,
}

impl TrackingResult {
    pub fn found(bbox: BBox) -> Self {
        Self {
            success: true,
            bbox,
        }
    }

    pub fn lost(bbox: BBox) -> Self {
        Self {
            success: false,
            bbox,
        }
    }
}

/// Single-object tracking algorithm instance.
///
/// One instance follows exactly one object. What counts as "lost" is up to
/// the algorithm; callers only look at `success` and, when it is set, the
/// refreshed box.
pub trait Tracker<F> {
    /// Seed the tracker with the object's location on `frame`
    fn init(&mut self, frame: &F, bbox: BBox) -> Result<(), TrackerError>;

    /// Locate the object on the next frame
    fn update(&mut self, frame: &F) -> Result<TrackingResult, TrackerError>;
}

/// Tracking algorithm catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrackerAlgorithm {
    Boosting,
    Mil,
    #[default]
    Kcf,
    Tld,
    MedianFlow,
    Goturn,
    Mosse,
    Csrt,
}

impl TrackerAlgorithm {
    pub const ALL: [TrackerAlgorithm; 8] = [
        TrackerAlgorithm::Boosting,
        TrackerAlgorithm::Mil,
        TrackerAlgorithm::Kcf,
        TrackerAlgorithm::Tld,
        TrackerAlgorithm::MedianFlow,
        TrackerAlgorithm::Goturn,
        TrackerAlgorithm::Mosse,
        TrackerAlgorithm::Csrt,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TrackerAlgorithm::Boosting => "BOOSTING",
            TrackerAlgorithm::Mil => "MIL",
            TrackerAlgorithm::Kcf => "KCF",
            TrackerAlgorithm::Tld => "TLD",
            TrackerAlgorithm::MedianFlow => "MEDIANFLOW",
            TrackerAlgorithm::Goturn => "GOTURN",
            TrackerAlgorithm::Mosse => "MOSSE",
            TrackerAlgorithm::Csrt => "CSRT",
        }
    }
}

impl fmt::Display for TrackerAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown tracker algorithm {0:?}, expected one of BOOSTING, MIL, KCF, TLD, MEDIANFLOW, GOTURN, MOSSE, CSRT")]
pub struct ParseAlgorithmError(pub String);

impl FromStr for TrackerAlgorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();

        TrackerAlgorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == normalized)
            .ok_or_else(|| ParseAlgorithmError(s.to_string()))
    }
}

/// Builds one tracker instance per algorithm variant
pub trait TrackerFactory<F> {
    fn create(&self, algorithm: TrackerAlgorithm) -> Result<Box<dyn Tracker<F>>, TrackerError>;
}

impl<F, C> TrackerFactory<F> for C
where
    C: Fn(TrackerAlgorithm) -> Result<Box<dyn Tracker<F>>, TrackerError>,
{
    fn create(&self, algorithm: TrackerAlgorithm) -> Result<Box<dyn Tracker<F>>, TrackerError> {
        self(algorithm)
    }
}
