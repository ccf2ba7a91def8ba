use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::bbox::BBox;
use crate::config::SessionConfig;
use crate::detector::{Detector, seed_boxes};
use crate::error::{SessionError, SourceError};
use crate::multi::MultiTracker;
use crate::render::{FpsMeter, Renderer};
use crate::source::FrameSource;
use crate::tracker::TrackerFactory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Tracking,
    /// Tracking loss below the reacquisition threshold
    Degraded,
    Reacquiring,
    Terminated,
}

/// Cooperative stop flag, checked once per frame boundary
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened on one frame, handed to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// 0 for the frame the session was seeded from
    pub frame_index: u64,
    pub state: SessionState,
    /// Best-effort box per tracked object, even while degraded
    pub boxes: Vec<BBox>,
    pub degraded: bool,
    pub failure_count: u32,
    /// The tracker set was rebuilt from a fresh detection on this frame
    pub reacquired: bool,
    pub fps: f64,
}

/// A frame together with its report
pub struct ProcessedFrame<F> {
    pub frame: F,
    pub report: FrameReport,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub reacquisitions: u64,
    pub average_fps: f64,
}

/// Frame loop driving a tracker set over one video stream.
///
/// Seeds the tracker set from the detector on the first frame, then updates
/// it every frame. Losses are tolerated for up to `failure_threshold`
/// consecutive frames; one more and the whole set is rebuilt from a fresh
/// detection.
pub struct TrackingSession<S, D, T>
where
    S: FrameSource,
{
    config: SessionConfig,
    source: Option<S>,
    detector: D,
    factory: T,
    trackers: MultiTracker<S::Frame>,
    state: SessionState,
    failure_count: u32,
    frames: u64,
    reacquisitions: u64,
    cancel: CancellationToken,
    fps: FpsMeter,
}

impl<S, D, T> TrackingSession<S, D, T>
where
    S: FrameSource,
    D: Detector<S::Frame>,
    T: TrackerFactory<S::Frame>,
{
    pub fn new(config: SessionConfig, source: S, detector: D, factory: T) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            config,
            source: Some(source),
            detector,
            factory,
            trackers: MultiTracker::empty(),
            state: SessionState::Uninitialized,
            failure_count: 0,
            frames: 0,
            reacquisitions: 0,
            cancel: CancellationToken::new(),
            fps: FpsMeter::new(),
        })
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn tracked_objects(&self) -> usize {
        self.trackers.len()
    }

    pub fn boxes(&self) -> &[BBox] {
        self.trackers.boxes()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    /// Read the first frame, detect, and seed the tracker set.
    ///
    /// Any failure here is fatal and terminates the session.
    pub fn start(&mut self) -> Result<ProcessedFrame<S::Frame>, SessionError> {
        if self.state != SessionState::Uninitialized {
            return Err(SessionError::InvalidState(self.state));
        }
        let timer = Instant::now();

        let frame = match self.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Err(self.fail(SourceError::Empty)),
            Err(e) => return Err(self.fail(e)),
        };

        let detections = match self.detector.detect(&frame) {
            Ok(detections) => detections,
            Err(e) => return Err(self.fail(e)),
        };
        let boxes = seed_boxes(&detections);

        match MultiTracker::create_and_init(&self.factory, self.config.tracker, &frame, &boxes) {
            Ok(trackers) => self.trackers = trackers,
            Err(e) => return Err(self.fail(e)),
        }
        self.failure_count = 0;
        self.state = SessionState::Tracking;
        info!(
            "Tracking {} objects with {} tracker",
            self.trackers.len(),
            self.config.tracker
        );

        let fps = self.fps.record(timer.elapsed());
        let report = self.report(boxes, false, fps);
        Ok(ProcessedFrame { frame, report })
    }

    /// Process the next frame.
    ///
    /// Returns `None` once the session has terminated through end of stream
    /// or cancellation. An uninitialized session is started first.
    pub fn step(&mut self) -> Result<Option<ProcessedFrame<S::Frame>>, SessionError> {
        if self.state == SessionState::Terminated {
            return Ok(None);
        }
        if self.cancel.is_cancelled() {
            info!("Cancelled after {} frames", self.frames);
            self.terminate();
            return Ok(None);
        }
        if self.state == SessionState::Uninitialized {
            return self.start().map(Some);
        }

        let frame = match self.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("End of stream after {} frames", self.frames);
                self.terminate();
                return Ok(None);
            }
            Err(e) => return Err(self.fail(e)),
        };
        let timer = Instant::now();

        let update = self.trackers.update(&frame);
        let mut reacquired = false;
        let boxes = if update.all_ok {
            self.failure_count = 0;
            self.state = SessionState::Tracking;
            update.boxes
        } else {
            self.failure_count += 1;
            if self.failure_count <= self.config.failure_threshold {
                debug!(
                    "Tracking failure detected ({}/{})",
                    self.failure_count, self.config.failure_threshold
                );
                self.state = SessionState::Degraded;
                update.boxes
            } else {
                info!(
                    "Tracking lost for {} consecutive frames, reacquiring",
                    self.failure_count
                );
                self.reinitialize(&frame);
                reacquired = true;
                self.trackers.boxes().to_vec()
            }
        };

        let fps = self.fps.record(timer.elapsed());
        let report = self.report(boxes, reacquired, fps);
        Ok(Some(ProcessedFrame { frame, report }))
    }

    /// Drop every tracker and reseed from a fresh detection on `frame`.
    ///
    /// Detection or initialization failures leave the session tracking
    /// nothing rather than failing it. Returns the number of objects now
    /// tracked. Only a started session can reacquire.
    pub fn reacquire(&mut self, frame: &S::Frame) -> Result<usize, SessionError> {
        if !matches!(self.state, SessionState::Tracking | SessionState::Degraded) {
            return Err(SessionError::InvalidState(self.state));
        }
        self.reinitialize(frame);
        Ok(self.trackers.len())
    }

    /// Step until the session terminates, rendering every processed frame
    pub fn run<R>(&mut self, renderer: &mut R) -> Result<RunSummary, SessionError>
    where
        R: Renderer<S::Frame> + ?Sized,
    {
        while let Some(mut processed) = self.step()? {
            if let Err(e) = renderer.render(&mut processed.frame, &processed.report) {
                return Err(self.fail(e));
            }
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames: self.frames,
            reacquisitions: self.reacquisitions,
            average_fps: self.fps.average(),
        }
    }

    /// Release the source and every tracker. Idempotent.
    pub fn terminate(&mut self) {
        if self.state == SessionState::Terminated {
            return;
        }
        self.source = None;
        self.trackers = MultiTracker::empty();
        self.state = SessionState::Terminated;
        debug!("Session terminated, source released");
    }

    fn reinitialize(&mut self, frame: &S::Frame) {
        self.state = SessionState::Reacquiring;
        // the old set goes before the new one is built
        self.trackers = MultiTracker::empty();

        let trackers = match self.detector.detect(frame) {
            Ok(detections) => {
                let boxes = seed_boxes(&detections);
                MultiTracker::create_and_init(&self.factory, self.config.tracker, frame, &boxes)
                    .unwrap_or_else(|e| {
                        warn!("Reinitialization failed, tracking nothing: {}", e);
                        MultiTracker::empty()
                    })
            }
            Err(e) => {
                warn!("Redetection failed, tracking nothing: {}", e);
                MultiTracker::empty()
            }
        };

        self.trackers = trackers;
        self.failure_count = 0;
        self.reacquisitions += 1;
        self.state = SessionState::Tracking;
        info!("Reacquired {} objects", self.trackers.len());
    }

    fn read_frame(&mut self) -> Result<Option<S::Frame>, SourceError> {
        match self.source.as_mut() {
            Some(source) => source.read(),
            None => Ok(None),
        }
    }

    fn fail(&mut self, e: impl Into<SessionError>) -> SessionError {
        let e = e.into();
        error!("{}", e);
        self.terminate();
        e
    }

    fn report(&mut self, boxes: Vec<BBox>, reacquired: bool, fps: f64) -> FrameReport {
        let frame_index = self.frames;
        self.frames += 1;
        FrameReport {
            frame_index,
            state: self.state,
            boxes,
            degraded: self.state == SessionState::Degraded,
            failure_count: self.failure_count,
            reacquired,
            fps,
        }
    }
}
