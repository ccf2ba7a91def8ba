use log::{debug, warn};

use crate::bbox::{BBox, Frame};
use crate::error::TrackerError;
use crate::tracker::{Tracker, TrackerAlgorithm, TrackerFactory};

/// Batch update outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiUpdate {
    /// AND over every tracker; vacuously true with no trackers
    pub all_ok: bool,
    /// Latest known box per tracker, index-aligned with the tracker set
    pub boxes: Vec<BBox>,
}

/// Fixed set of single-object trackers, one per tracked object.
///
/// The set is built whole and replaced whole. There is no way to add or drop
/// an individual tracker.
pub struct MultiTracker<F> {
    algorithm: Option<TrackerAlgorithm>,
    trackers: Vec<Box<dyn Tracker<F>>>,
    boxes: Vec<BBox>,
}

impl<F: Frame> MultiTracker<F> {
    /// Tracker set with nothing to track
    pub fn empty() -> Self {
        Self {
            algorithm: None,
            trackers: Vec::new(),
            boxes: Vec::new(),
        }
    }

    /// Build and initialize one tracker per box, in order.
    ///
    /// Fails as a whole if any box is unusable or any tracker refuses to
    /// initialize.
    pub fn create_and_init<T>(
        factory: &T,
        algorithm: TrackerAlgorithm,
        frame: &F,
        boxes: &[BBox],
    ) -> Result<Self, TrackerError>
    where
        T: TrackerFactory<F> + ?Sized,
    {
        let size = frame.size();
        for bbox in boxes {
            bbox.validate(size)?;
        }

        let mut trackers = Vec::with_capacity(boxes.len());
        for bbox in boxes {
            let mut tracker = factory.create(algorithm)?;
            tracker.init(frame, *bbox)?;
            trackers.push(tracker);
        }
        debug!("Initialized {} {} trackers", trackers.len(), algorithm);

        Ok(Self {
            algorithm: Some(algorithm),
            trackers,
            boxes: boxes.to_vec(),
        })
    }

    /// Advance every tracker by one frame
    pub fn update(&mut self, frame: &F) -> MultiUpdate {
        let size = frame.size();
        let mut all_ok = true;

        let pairs = self.trackers.iter_mut().zip(self.boxes.iter_mut());
        for (index, (tracker, last)) in pairs.enumerate() {
            let ok = match tracker.update(frame) {
                Ok(result) if result.success && result.bbox.validate(size).is_ok() => {
                    *last = result.bbox;
                    true
                }
                Ok(result) if result.success => {
                    debug!(
                        "Tracker {} reported {:?} outside the {} frame",
                        index, result.bbox, size
                    );
                    false
                }
                Ok(_) => false,
                Err(e) => {
                    warn!("Tracker {} failed to update: {}", index, e);
                    false
                }
            };
            all_ok &= ok;
        }

        MultiUpdate {
            all_ok,
            boxes: self.boxes.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    pub fn boxes(&self) -> &[BBox] {
        &self.boxes
    }

    /// Algorithm the set was built with, `None` for an empty set
    pub fn algorithm(&self) -> Option<TrackerAlgorithm> {
        self.algorithm
    }
}

impl<F: Frame> Default for MultiTracker<F> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingInit, ScriptedFactory, TestFrame};

    fn boxes() -> Vec<BBox> {
        vec![
            BBox::new(10, 10, 40, 40),
            BBox::new(100, 50, 30, 60),
            BBox::new(300, 200, 20, 20),
        ]
    }

    #[test]
    fn test_one_tracker_per_box() {
        let factory = ScriptedFactory::new();
        let multi =
            MultiTracker::create_and_init(&factory, TrackerAlgorithm::Kcf, &TestFrame::ok(), &boxes())
                .unwrap();
        assert_eq!(multi.len(), 3);
        assert_eq!(multi.boxes(), boxes().as_slice());
        assert_eq!(multi.algorithm(), Some(TrackerAlgorithm::Kcf));
        assert_eq!(factory.created(), 3);
        assert_eq!(factory.seeds(), boxes());
    }

    #[test]
    fn test_degenerate_box_fails_whole_set() {
        let factory = ScriptedFactory::new();
        let mut seeds = boxes();
        seeds.push(BBox::new(0, 0, 0, 10));
        let result =
            MultiTracker::create_and_init(&factory, TrackerAlgorithm::Kcf, &TestFrame::ok(), &seeds);
        assert!(matches!(result, Err(TrackerError::DegenerateBox(_))));
        assert_eq!(factory.created(), 0);
    }

    #[test]
    fn test_edge_touching_box_is_accepted() {
        let factory = ScriptedFactory::new();
        let frame = TestFrame::ok();
        let size = frame.size();
        let edge = BBox::new(size.width - 20, size.height - 20, 20, 20);
        let multi =
            MultiTracker::create_and_init(&factory, TrackerAlgorithm::Csrt, &frame, &[edge]).unwrap();
        assert_eq!(multi.len(), 1);
    }

    #[test]
    fn test_tracker_init_failure_fails_whole_set() {
        let factory = |_: TrackerAlgorithm| -> Result<Box<dyn Tracker<TestFrame>>, TrackerError> {
            Ok(Box::new(FailingInit))
        };
        let result =
            MultiTracker::create_and_init(&factory, TrackerAlgorithm::Mil, &TestFrame::ok(), &boxes());
        assert!(matches!(result, Err(TrackerError::InitError(_))));
    }

    #[test]
    fn test_update_all_ok() {
        let factory = ScriptedFactory::new();
        let mut multi =
            MultiTracker::create_and_init(&factory, TrackerAlgorithm::Kcf, &TestFrame::ok(), &boxes())
                .unwrap();
        let update = multi.update(&TestFrame::ok());
        assert!(update.all_ok);
        // scripted trackers move one pixel right per successful update
        assert_eq!(update.boxes[0], BBox::new(11, 10, 40, 40));
        assert_eq!(update.boxes.len(), 3);
    }

    #[test]
    fn test_single_loss_degrades_batch_and_keeps_last_box() {
        let factory = ScriptedFactory::new();
        let mut multi =
            MultiTracker::create_and_init(&factory, TrackerAlgorithm::Kcf, &TestFrame::ok(), &boxes())
                .unwrap();
        let update = multi.update(&TestFrame::lose_seeds(&[BBox::new(100, 50, 30, 60)]));
        assert!(!update.all_ok);
        assert_eq!(update.boxes[0], BBox::new(11, 10, 40, 40));
        assert_eq!(update.boxes[1], BBox::new(100, 50, 30, 60));
        assert_eq!(update.boxes[2], BBox::new(301, 200, 20, 20));
    }

    #[test]
    fn test_out_of_frame_result_counts_as_loss() {
        let factory = ScriptedFactory::new();
        let frame = TestFrame::ok();
        let size = frame.size();
        let edge = BBox::new(size.width - 20, 0, 20, 20);
        let mut multi =
            MultiTracker::create_and_init(&factory, TrackerAlgorithm::Kcf, &frame, &[edge]).unwrap();
        let update = multi.update(&frame);
        assert!(!update.all_ok);
        assert_eq!(update.boxes, vec![edge]);
    }

    #[test]
    fn test_update_error_counts_as_loss() {
        let factory = ScriptedFactory::new();
        let mut multi =
            MultiTracker::create_and_init(&factory, TrackerAlgorithm::Kcf, &TestFrame::ok(), &boxes())
                .unwrap();
        multi.update(&TestFrame::ok());

        let update = multi.update(&TestFrame::fail_updates());
        assert!(!update.all_ok);
        assert_eq!(update.boxes[0], BBox::new(11, 10, 40, 40));
        assert_eq!(update.boxes[2], BBox::new(301, 200, 20, 20));
        assert_eq!(multi.len(), 3);
    }

    #[test]
    fn test_empty_set_is_vacuously_ok() {
        let mut multi = MultiTracker::<TestFrame>::empty();
        let update = multi.update(&TestFrame::lose_all());
        assert!(update.all_ok);
        assert!(update.boxes.is_empty());
        assert!(multi.is_empty());
    }
}
