use opencv::core::{Mat, Ptr, Rect};
use opencv::prelude::*;
use opencv::{tracking, video};

use crate::bbox::BBox;
use crate::error::TrackerError;
use crate::tracker::{Tracker, TrackerAlgorithm, TrackerFactory, TrackingResult};

/// Any OpenCV tracker behind the common `cv::Tracker` interface.
///
/// Legacy-only algorithms (boosting, TLD, median-flow, MOSSE) are wrapped
/// with `upgradeTrackingAPI`.
pub struct OpenCvTracker {
    algorithm: TrackerAlgorithm,
    inner: Ptr<video::Tracker>,
    last: BBox,
}

impl OpenCvTracker {
    pub fn new(algorithm: TrackerAlgorithm) -> Result<Self, TrackerError> {
        let inner =
            create(algorithm).map_err(|e| TrackerError::CreateError(algorithm, e.to_string()))?;
        Ok(Self {
            algorithm,
            inner,
            last: BBox::default(),
        })
    }

    pub fn algorithm(&self) -> TrackerAlgorithm {
        self.algorithm
    }
}

fn create(algorithm: TrackerAlgorithm) -> opencv::Result<Ptr<video::Tracker>> {
    let tracker: Ptr<video::Tracker> = match algorithm {
        TrackerAlgorithm::Kcf => {
            tracking::TrackerKCF::create(tracking::TrackerKCF_Params::default()?)?.into()
        }
        TrackerAlgorithm::Csrt => {
            tracking::TrackerCSRT::create(&tracking::TrackerCSRT_Params::default()?)?.into()
        }
        TrackerAlgorithm::Mil => {
            video::TrackerMIL::create(video::TrackerMIL_Params::default()?)?.into()
        }
        TrackerAlgorithm::Goturn => {
            video::TrackerGOTURN::create(&video::TrackerGOTURN_Params::default()?)?.into()
        }
        TrackerAlgorithm::Boosting => upgrade(
            tracking::legacy_TrackerBoosting::create(
                &tracking::legacy_TrackerBoosting_Params::default()?,
            )?
            .into(),
        )?,
        TrackerAlgorithm::Tld => upgrade(
            tracking::legacy_TrackerTLD::create(&tracking::legacy_TrackerTLD_Params::default()?)?
                .into(),
        )?,
        TrackerAlgorithm::MedianFlow => upgrade(
            tracking::legacy_TrackerMedianFlow::create(
                &tracking::legacy_TrackerMedianFlow_Params::default()?,
            )?
            .into(),
        )?,
        TrackerAlgorithm::Mosse => upgrade(tracking::legacy_TrackerMOSSE::create()?.into())?,
    };
    Ok(tracker)
}

fn upgrade(legacy: Ptr<tracking::legacy_Tracker>) -> opencv::Result<Ptr<video::Tracker>> {
    tracking::upgrade_tracking_api(&legacy)
}

impl Tracker<Mat> for OpenCvTracker {
    fn init(&mut self, frame: &Mat, bbox: BBox) -> Result<(), TrackerError> {
        self.inner
            .init(frame, Rect::from(bbox))
            .map_err(|e| TrackerError::InitError(format!("{}: {}", self.algorithm, e)))?;
        self.last = bbox;
        Ok(())
    }

    fn update(&mut self, frame: &Mat) -> Result<TrackingResult, TrackerError> {
        let mut rect = Rect::from(self.last);
        let found = self
            .inner
            .update(frame, &mut rect)
            .map_err(|e| TrackerError::UpdateError(format!("{}: {}", self.algorithm, e)))?;
        if !found {
            return Ok(TrackingResult::lost(self.last));
        }
        self.last = BBox::from(rect);
        Ok(TrackingResult::found(self.last))
    }
}

/// Dispatches each catalog entry to its OpenCV implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCvTrackerFactory;

impl TrackerFactory<Mat> for OpenCvTrackerFactory {
    fn create(&self, algorithm: TrackerAlgorithm) -> Result<Box<dyn Tracker<Mat>>, TrackerError> {
        Ok(Box::new(OpenCvTracker::new(algorithm)?))
    }
}
