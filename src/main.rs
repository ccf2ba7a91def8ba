#[cfg(feature = "opencv")]
mod app {
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use clap::Parser;
    use log::info;

    use multi_tracker::cv::{
        HighGuiRenderer, OpenCvTrackerFactory, VideoFileSource, YoloConfig, YoloDetector,
    };
    use multi_tracker::{
        CancellationToken, LogRenderer, Renderer, SessionConfig, TrackerAlgorithm, TrackingSession,
    };

    #[derive(Parser, Debug)]
    #[command(name = "multi_tracker", about = "Multi-object tracking with detector reacquisition")]
    struct Args {
        /// Video file or stream URL
        video: PathBuf,
        /// Session config (JSON); flags below override it
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// BOOSTING, MIL, KCF, TLD, MEDIANFLOW, GOTURN, MOSSE or CSRT
        #[arg(long)]
        tracker: Option<TrackerAlgorithm>,
        /// Consecutive failed frames tolerated before redetecting
        #[arg(long)]
        failure_threshold: Option<u32>,
        #[arg(long, default_value = "cfg/yolov3.cfg")]
        yolo_cfg: PathBuf,
        #[arg(long, default_value = "weights/yolov3.weights")]
        yolo_weights: PathBuf,
        #[arg(long, default_value = "data/coco.names")]
        class_names: PathBuf,
        #[arg(long, default_value_t = 0.6)]
        conf: f32,
        #[arg(long, default_value_t = 0.4)]
        nms: f32,
        /// Log frames instead of opening a window
        #[arg(long)]
        headless: bool,
    }

    pub fn run() -> Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let args = Args::parse();

        let mut config = match &args.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::default(),
        };
        if let Some(tracker) = args.tracker {
            config.tracker = tracker;
        }
        if let Some(threshold) = args.failure_threshold {
            config.failure_threshold = threshold;
        }
        info!(
            "{} tracker, failure threshold {}",
            config.tracker, config.failure_threshold
        );

        let detector = YoloDetector::new(YoloConfig {
            cfg: args.yolo_cfg.clone(),
            weights: args.yolo_weights.clone(),
            names: Some(args.class_names.clone()),
            conf_threshold: args.conf,
            nms_threshold: args.nms,
            ..YoloConfig::default()
        })
        .context("Failed to load detector")?;
        let source = VideoFileSource::open(&args.video)?;

        let algorithm = config.tracker;
        let cancel = CancellationToken::new();
        let mut session = TrackingSession::new(config, source, detector, OpenCvTrackerFactory)?
            .with_cancellation(cancel.clone());

        let mut renderer: Box<dyn Renderer<opencv::core::Mat>> = if args.headless {
            Box::new(LogRenderer)
        } else {
            Box::new(HighGuiRenderer::new("MultiTracker", algorithm, cancel))
        };

        let summary = session
            .run(renderer.as_mut())
            .with_context(|| format!("Tracking {} failed", args.video.display()))?;
        info!(
            "Processed {} frames, {} reacquisitions, average FPS {:.1}",
            summary.frames, summary.reacquisitions, summary.average_fps
        );
        Ok(())
    }
}

#[cfg(feature = "opencv")]
fn main() -> anyhow::Result<()> {
    app::run()
}

#[cfg(not(feature = "opencv"))]
fn main() {
    println!("OpenCV support not enabled.");
    println!("Build with: cargo build --features opencv");
}
