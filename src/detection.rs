use crate::config::DetectorSettings;
use crate::counter::{collect_detections, Detection};
use crate::pipeline::Detector;
use crate::*;

pub type ClassID = i32;

/// Darknet YOLO run through OpenCV's `dnn::DetectionModel`.
///
/// NMS happens inside the model call; only boxes of the configured target
/// classes come out.
pub struct YoloDetector {
    model: dnn::DetectionModel,
    classes: Vec<String>,
    targets: Option<Vec<ClassID>>,
    confidence: f32,
    nms: f32,
}

impl YoloDetector {
    pub fn new(settings: &DetectorSettings) -> Result<Self> {
        let classes = load_classes(&settings.classes)?;
        let targets = if settings.targets.is_empty() {
            None
        } else {
            Some(resolve_targets(&classes, &settings.targets))
        };

        let weights = settings.weights.to_string_lossy();
        let config = settings.model_config.to_string_lossy();
        let mut model = dnn::DetectionModel::new(&weights, &config)?;
        model.set_input_size(cv::Size::new(settings.input_size, settings.input_size))?;
        model.set_input_scale((1. / 255.).into())?;
        model.set_input_mean(cv::Scalar::default())?;
        model.set_input_swap_rb(true)?;

        log::info!(
            "loaded {} ({} classes, counting {})",
            settings.weights.display(),
            classes.len(),
            match targets {
                None => "all".to_string(),
                Some(_) => settings.targets.join(", "),
            }
        );

        Ok(Self {
            model,
            classes,
            targets,
            confidence: settings.confidence,
            nms: settings.nms,
        })
    }

    fn class_name(&self, id: ClassID) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
    }

    fn is_target(&self, id: ClassID) -> bool {
        self.targets.as_ref().map_or(true, |t| t.contains(&id))
    }
}

impl Detector<cv::Mat> for YoloDetector {
    fn detect(&mut self, frame: &cv::Mat) -> Result<Vec<Detection>> {
        let mut class_ids = cv::Vector::<ClassID>::new();
        let mut scores = cv::Vector::<f32>::new();
        let mut rects = cv::Vector::<cv::Rect>::new();
        self.model.detect(
            frame,
            &mut class_ids,
            &mut scores,
            &mut rects,
            self.confidence,
            self.nms,
        )?;

        let boxes = class_ids
            .iter()
            .zip(scores.iter())
            .zip(rects.iter())
            .filter(|((id, _), _)| self.is_target(*id))
            .map(|((id, score), rect)| -> Result<Detection> {
                let detection = Detection::from_rect(rect)?;
                Ok(match self.class_name(id) {
                    Some(name) => detection.with_label(name, score),
                    None => detection,
                })
            });
        Ok(collect_detections(boxes))
    }
}

pub fn load_classes(file: &path::Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(file)?;
    Ok(parse_classes(&raw))
}

fn parse_classes(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Class ids for the target names. Names missing from the class list are
/// reported and skipped.
fn resolve_targets(classes: &[String], targets: &[String]) -> Vec<ClassID> {
    targets
        .iter()
        .filter_map(|target| {
            let id = classes.iter().position(|c| c == target);
            if id.is_none() {
                log::warn!("target class {target:?} is not in the class list");
            }
            id.map(|i| i as ClassID)
        })
        .collect()
}
