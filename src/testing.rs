//! Scripted collaborators for unit tests

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::bbox::{BBox, DetectionResult, Frame, FrameSize};
use crate::detector::Detector;
use crate::error::{DetectError, SourceError, TrackerError};
use crate::source::FrameSource;
use crate::tracker::{Tracker, TrackerAlgorithm, TrackerFactory, TrackingResult};

#[derive(Debug, Clone, PartialEq)]
enum Loss {
    None,
    All,
    Seeds(Vec<BBox>),
    /// Backend failure rather than a lost object
    Error,
}

/// Frame that tells scripted trackers whether they keep their object
#[derive(Debug, Clone, PartialEq)]
pub struct TestFrame {
    size: FrameSize,
    loss: Loss,
}

impl TestFrame {
    pub fn ok() -> Self {
        Self {
            size: FrameSize::new(640, 480),
            loss: Loss::None,
        }
    }

    pub fn lose_all() -> Self {
        Self {
            loss: Loss::All,
            ..Self::ok()
        }
    }

    /// Every tracker fails with an update error
    pub fn fail_updates() -> Self {
        Self {
            loss: Loss::Error,
            ..Self::ok()
        }
    }

    /// Only the trackers seeded with these boxes lose their object
    pub fn lose_seeds(seeds: &[BBox]) -> Self {
        Self {
            loss: Loss::Seeds(seeds.to_vec()),
            ..Self::ok()
        }
    }

    fn loses(&self, seed: BBox) -> bool {
        match &self.loss {
            Loss::None | Loss::Error => false,
            Loss::All => true,
            Loss::Seeds(seeds) => seeds.contains(&seed),
        }
    }
}

impl Frame for TestFrame {
    fn size(&self) -> FrameSize {
        self.size
    }
}

/// Moves its box one pixel right per frame unless the frame says otherwise
pub struct ScriptedTracker {
    seed: BBox,
    current: BBox,
    state: Rc<FactoryState>,
}

impl Tracker<TestFrame> for ScriptedTracker {
    fn init(&mut self, _frame: &TestFrame, bbox: BBox) -> Result<(), TrackerError> {
        self.seed = bbox;
        self.current = bbox;
        self.state.seeds.borrow_mut().push(bbox);
        Ok(())
    }

    fn update(&mut self, frame: &TestFrame) -> Result<TrackingResult, TrackerError> {
        if frame.loss == Loss::Error {
            return Err(TrackerError::UpdateError("backend fault".to_string()));
        }
        if frame.loses(self.seed) {
            return Ok(TrackingResult::lost(BBox::default()));
        }
        self.current.x += 1;
        Ok(TrackingResult::found(self.current))
    }
}

impl Drop for ScriptedTracker {
    fn drop(&mut self) {
        self.state.live.set(self.state.live.get() - 1);
    }
}

#[derive(Default)]
struct FactoryState {
    created: Cell<usize>,
    live: Cell<usize>,
    seeds: RefCell<Vec<BBox>>,
}

/// Cloneable handle; clones share counters so a test can keep one while the
/// session owns another
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    state: Rc<FactoryState>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trackers created over the factory's lifetime
    pub fn created(&self) -> usize {
        self.state.created.get()
    }

    /// Trackers not yet dropped
    pub fn live(&self) -> usize {
        self.state.live.get()
    }

    /// Boxes every tracker was seeded with, in order
    pub fn seeds(&self) -> Vec<BBox> {
        self.state.seeds.borrow().clone()
    }
}

impl TrackerFactory<TestFrame> for ScriptedFactory {
    fn create(&self, _algorithm: TrackerAlgorithm) -> Result<Box<dyn Tracker<TestFrame>>, TrackerError> {
        self.state.created.set(self.state.created.get() + 1);
        self.state.live.set(self.state.live.get() + 1);
        Ok(Box::new(ScriptedTracker {
            seed: BBox::default(),
            current: BBox::default(),
            state: self.state.clone(),
        }))
    }
}

/// Refuses every box
pub struct FailingInit;

impl Tracker<TestFrame> for FailingInit {
    fn init(&mut self, _frame: &TestFrame, _bbox: BBox) -> Result<(), TrackerError> {
        Err(TrackerError::InitError("refused".to_string()))
    }

    fn update(&mut self, _frame: &TestFrame) -> Result<TrackingResult, TrackerError> {
        Ok(TrackingResult::default())
    }
}

/// Pops one scripted answer per call, then repeats the fallback
pub struct StubDetector {
    script: VecDeque<Result<Vec<BBox>, DetectError>>,
    fallback: Vec<BBox>,
    calls: Rc<Cell<usize>>,
}

impl StubDetector {
    pub fn new(fallback: Vec<BBox>) -> Self {
        Self {
            script: VecDeque::new(),
            fallback,
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn then(mut self, answer: Result<Vec<BBox>, DetectError>) -> Self {
        self.script.push_back(answer);
        self
    }

    pub fn calls(&self) -> Rc<Cell<usize>> {
        self.calls.clone()
    }
}

impl Detector<TestFrame> for StubDetector {
    fn detect(&mut self, _frame: &TestFrame) -> Result<Vec<DetectionResult>, DetectError> {
        self.calls.set(self.calls.get() + 1);
        let boxes = match self.script.pop_front() {
            Some(answer) => answer?,
            None => self.fallback.clone(),
        };
        Ok(boxes
            .into_iter()
            .map(|bbox| DetectionResult::new(bbox).with_label("object"))
            .collect())
    }
}

/// In-memory stream that records when it is released
pub struct VecSource {
    frames: VecDeque<Result<TestFrame, SourceError>>,
    released: Rc<Cell<bool>>,
}

impl VecSource {
    pub fn new(frames: impl IntoIterator<Item = TestFrame>) -> Self {
        Self {
            frames: frames.into_iter().map(Ok).collect(),
            released: Rc::new(Cell::new(false)),
        }
    }

    pub fn then_fail(mut self) -> Self {
        self.frames
            .push_back(Err(SourceError::ReadError("device unplugged".to_string())));
        self
    }

    pub fn released(&self) -> Rc<Cell<bool>> {
        self.released.clone()
    }
}

impl FrameSource for VecSource {
    type Frame = TestFrame;

    fn read(&mut self) -> Result<Option<TestFrame>, SourceError> {
        self.frames.pop_front().transpose()
    }
}

impl Drop for VecSource {
    fn drop(&mut self) {
        self.released.set(true);
    }
}
