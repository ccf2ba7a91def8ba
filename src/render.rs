use std::collections::VecDeque;
use std::time::Duration;

use log::{debug, info};

use crate::error::SessionError;
use crate::session::FrameReport;

/// Number of frames the FPS estimate is averaged over
pub const FPS_WINDOW: usize = 30;

/// Per-frame consumer of tracking output. Display only, nothing flows back
/// into the session.
pub trait Renderer<F> {
    fn render(&mut self, frame: &mut F, report: &FrameReport) -> Result<(), SessionError>;
}

/// Rolling FPS average over the last `FPS_WINDOW` frames
#[derive(Debug, Clone, Default)]
pub struct FpsMeter {
    history: VecDeque<f64>,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(FPS_WINDOW + 1),
        }
    }

    /// Record one frame's processing time and return the updated average
    pub fn record(&mut self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.history.push_back(1.0 / secs);
            if self.history.len() > FPS_WINDOW {
                self.history.pop_front();
            }
        }
        self.average()
    }

    pub fn average(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }
}

/// Headless renderer that only logs
#[derive(Debug, Default)]
pub struct LogRenderer;

impl<F> Renderer<F> for LogRenderer {
    fn render(&mut self, _frame: &mut F, report: &FrameReport) -> Result<(), SessionError> {
        if report.reacquired {
            info!(
                "Frame {}: reacquired {} objects",
                report.frame_index,
                report.boxes.len()
            );
        } else if report.degraded {
            info!(
                "Frame {}: tracking failure detected ({} consecutive)",
                report.frame_index, report.failure_count
            );
        }
        debug!(
            "Frame {}: {:?} boxes={:?} fps={:.1}",
            report.frame_index, report.state, report.boxes, report.fps
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_meter() {
        assert_eq!(FpsMeter::new().average(), 0.0);
    }

    #[test]
    fn test_average() {
        let mut meter = FpsMeter::new();
        meter.record(Duration::from_millis(100));
        let fps = meter.record(Duration::from_millis(50));
        assert!((fps - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut meter = FpsMeter::new();
        for _ in 0..FPS_WINDOW {
            meter.record(Duration::from_millis(10));
        }
        for _ in 0..FPS_WINDOW {
            meter.record(Duration::from_millis(20));
        }
        assert!((meter.average() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_is_ignored() {
        let mut meter = FpsMeter::new();
        assert_eq!(meter.record(Duration::ZERO), 0.0);
    }
}
