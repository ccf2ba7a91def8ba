use opencv::core::{self, Mat, Rect};
use opencv::{highgui, imgproc};

use crate::error::SessionError;
use crate::render::Renderer;
use crate::session::{CancellationToken, FrameReport};
use crate::tracker::TrackerAlgorithm;

const KEY_ESC: i32 = 27;

/// HighGUI window showing tracked boxes, the tracker name and FPS.
///
/// ESC or `q` in the window cancels the session through its token.
pub struct HighGuiRenderer {
    window: String,
    label: String,
    cancel: CancellationToken,
}

impl HighGuiRenderer {
    pub fn new(window: impl Into<String>, algorithm: TrackerAlgorithm, cancel: CancellationToken) -> Self {
        Self {
            window: window.into(),
            label: format!("{} Tracker", algorithm),
            cancel,
        }
    }

    fn draw(&self, frame: &mut Mat, report: &FrameReport) -> opencv::Result<()> {
        let box_color = if report.degraded {
            core::Scalar::new(0.0, 0.0, 255.0, 0.0) // Red
        } else {
            core::Scalar::new(255.0, 0.0, 0.0, 0.0) // Blue
        };
        let text_color = core::Scalar::new(50.0, 170.0, 50.0, 0.0);

        for bbox in &report.boxes {
            imgproc::rectangle(frame, Rect::from(*bbox), box_color, 2, imgproc::LINE_8, 0)?;
        }

        put_text(frame, &self.label, 20, text_color)?;
        put_text(frame, &format!("FPS : {}", report.fps as i32), 50, text_color)?;
        if report.degraded {
            put_text(
                frame,
                "Tracking failure detected",
                80,
                core::Scalar::new(0.0, 0.0, 255.0, 0.0),
            )?;
        }
        Ok(())
    }
}

fn put_text(frame: &mut Mat, text: &str, y: i32, color: core::Scalar) -> opencv::Result<()> {
    imgproc::put_text(
        frame,
        text,
        core::Point::new(100, y),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.75,
        color,
        2,
        imgproc::LINE_8,
        false,
    )
}

/// ESC or `q`, ignoring modifier bits above the low byte
fn is_quit_key(key: i32) -> bool {
    let key = key & 0xFF;
    key == KEY_ESC || key == 'q' as i32
}

impl Renderer<Mat> for HighGuiRenderer {
    fn render(&mut self, frame: &mut Mat, report: &FrameReport) -> Result<(), SessionError> {
        let shown = self
            .draw(frame, report)
            .and_then(|_| highgui::imshow(&self.window, &*frame))
            .and_then(|_| highgui::wait_key(1));
        let key = shown.map_err(|e| SessionError::Render(e.to_string()))?;

        if is_quit_key(key) {
            self.cancel.cancel();
        }
        Ok(())
    }
}

impl Drop for HighGuiRenderer {
    fn drop(&mut self) {
        let _ = highgui::destroy_window(&self.window);
    }
}
