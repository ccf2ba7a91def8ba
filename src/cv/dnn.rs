use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use opencv::core::{self, Mat, Rect, Scalar, Size, Vector};
use opencv::dnn;
use opencv::prelude::*;

use crate::bbox::{BBox, DetectionResult, Frame};
use crate::detector::Detector;
use crate::error::DetectError;

/// YOLOv3 (Darknet) detector configuration
#[derive(Debug, Clone)]
pub struct YoloConfig {
    pub cfg: PathBuf,
    pub weights: PathBuf,
    /// One class name per line, COCO order
    pub names: Option<PathBuf>,
    pub input_size: i32,
    pub conf_threshold: f32,
    pub nms_threshold: f32,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            cfg: PathBuf::from("cfg/yolov3.cfg"),
            weights: PathBuf::from("weights/yolov3.weights"),
            names: Some(PathBuf::from("data/coco.names")),
            input_size: 416,
            conf_threshold: 0.6,
            nms_threshold: 0.4,
        }
    }
}

/// Darknet YOLO model on OpenCV's DNN module, loaded once
pub struct YoloDetector {
    config: YoloConfig,
    net: dnn::Net,
    output_names: Vector<String>,
    class_names: Vec<String>,
}

impl YoloDetector {
    pub fn new(config: YoloConfig) -> Result<Self, DetectError> {
        let cfg = path_str(&config.cfg)?;
        let weights = path_str(&config.weights)?;
        let net = dnn::read_net_from_darknet(cfg, weights)
            .map_err(|e| DetectError::LoadError(e.to_string()))?;
        let output_names = net
            .get_unconnected_out_layers_names()
            .map_err(|e| DetectError::LoadError(e.to_string()))?;

        let class_names = match &config.names {
            Some(path) => fs::read_to_string(path)
                .map_err(|e| DetectError::LoadError(format!("{}: {}", path.display(), e)))?
                .lines()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .collect(),
            None => Vec::new(),
        };
        info!(
            "Loaded {} ({} classes)",
            config.weights.display(),
            class_names.len()
        );

        Ok(Self {
            config,
            net,
            output_names,
            class_names,
        })
    }

    fn forward(&mut self, frame: &Mat) -> opencv::Result<Vec<Candidate>> {
        let size = Size::new(self.config.input_size, self.config.input_size);
        // BGR capture -> RGB network input, scaled to [0, 1]
        let blob = dnn::blob_from_image(
            frame,
            1.0 / 255.0,
            size,
            Scalar::default(),
            true,
            false,
            core::CV_32F,
        )?;
        self.net.set_input(&blob, "", 1.0, Scalar::default())?;

        let mut outputs = Vector::<Mat>::new();
        self.net.forward(&mut outputs, &self.output_names)?;

        let frame_w = frame.cols() as f32;
        let frame_h = frame.rows() as f32;
        let mut candidates = Vec::new();
        for output in outputs.iter() {
            for row in 0..output.rows() {
                let data = output.at_row::<f32>(row)?;
                if let Some(candidate) =
                    decode_row(data, frame_w, frame_h, self.config.conf_threshold)
                {
                    candidates.push(candidate);
                }
            }
        }
        Ok(candidates)
    }

    fn label(&self, class_id: usize) -> String {
        self.class_names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| class_id.to_string())
    }
}

fn path_str(path: &Path) -> Result<&str, DetectError> {
    path.to_str()
        .ok_or_else(|| DetectError::LoadError(format!("{} is not valid UTF-8", path.display())))
}

struct Candidate {
    rect: Rect,
    class_id: usize,
    score: f32,
}

/// Decode one YOLO output row: [cx, cy, w, h, objectness, class scores...],
/// coordinates relative to the frame
fn decode_row(data: &[f32], frame_w: f32, frame_h: f32, threshold: f32) -> Option<Candidate> {
    if data.len() <= 5 {
        return None;
    }
    let (class_id, class_score) = data[5..]
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, s)| if s > best.1 { (i, s) } else { best });
    if class_score <= threshold {
        return None;
    }

    let cx = data[0] * frame_w;
    let cy = data[1] * frame_h;
    let w = data[2] * frame_w;
    let h = data[3] * frame_h;
    Some(Candidate {
        rect: Rect::new(
            (cx - w / 2.0) as i32,
            (cy - h / 2.0) as i32,
            w as i32,
            h as i32,
        ),
        class_id,
        score: class_score,
    })
}

impl Detector<Mat> for YoloDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<DetectionResult>, DetectError> {
        let candidates = self
            .forward(frame)
            .map_err(|e| DetectError::RunError(e.to_string()))?;

        let rects: Vector<Rect> = candidates.iter().map(|c| c.rect).collect();
        let scores: Vector<f32> = candidates.iter().map(|c| c.score).collect();
        let mut keep = Vector::<i32>::new();
        dnn::nms_boxes(
            &rects,
            &scores,
            self.config.conf_threshold,
            self.config.nms_threshold,
            &mut keep,
            1.0,
            0,
        )
        .map_err(|e| DetectError::RunError(e.to_string()))?;

        let size = Frame::size(frame);
        let detections: Vec<DetectionResult> = keep
            .iter()
            .filter_map(|index| candidates.get(index as usize))
            .filter_map(|c| {
                let bbox = BBox::from(c.rect).clip(size);
                if bbox.is_degenerate() {
                    return None;
                }
                Some(
                    DetectionResult::new(bbox)
                        .with_label(self.label(c.class_id))
                        .with_confidence(c.score),
                )
            })
            .collect();

        for detection in &detections {
            debug!(
                "{}: {:.2} at {:?}",
                detection.label.as_deref().unwrap_or("?"),
                detection.confidence.unwrap_or_default(),
                detection.bbox
            );
        }
        Ok(detections)
    }
}
