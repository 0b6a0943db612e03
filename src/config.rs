//! Settings shared by both binaries.
//!
//! Defaults, then an optional TOML file (`--config` or
//! `REGIONCOUNT_CONFIG`), then command line flags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::keymap::{parse_key, KeyAction, Keymap};
use crate::region::{RegionColor, DELETE_TOLERANCE_PX};
use crate::render::{DisplayColor, Palette, RenderStyle};

const WEIGHTS_FILE: &str = "data/yolov3.weights";
const CONFIG_FILE: &str = "data/yolov3.cfg";
const CLASSES_FILE: &str = "data/yolov3.txt";
/// Below one pixel the cursor preview turns into a solid smear of dots.
const MIN_DOT_SPACING: f64 = 1.;
const DEFAULT_TARGETS: [&str; 5] = ["car", "truck", "motorcycle", "bicycle", "bus"];

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    detector: Option<DetectorFile>,
    video: Option<VideoFile>,
    render: Option<RenderFile>,
    palette: Option<BTreeMap<String, String>>,
    keys: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectorFile {
    weights: Option<PathBuf>,
    model_config: Option<PathBuf>,
    classes: Option<PathBuf>,
    confidence: Option<f32>,
    nms: Option<f32>,
    input_size: Option<i32>,
    targets: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct VideoFile {
    skip_frames: Option<u32>,
    width: Option<i32>,
    height: Option<i32>,
    record_fps: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RenderFile {
    dot_spacing: Option<f64>,
    dot_radius: Option<i32>,
    delete_tolerance: Option<f64>,
    label_scale: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    pub weights: PathBuf,
    pub model_config: PathBuf,
    pub classes: PathBuf,
    pub confidence: f32,
    pub nms: f32,
    pub input_size: i32,
    /// Class names that are counted. Empty keeps every class.
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoSettings {
    pub skip_frames: u32,
    pub width: i32,
    pub height: i32,
    pub record_fps: f64,
    pub record: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub detector: DetectorSettings,
    pub video: VideoSettings,
    pub style: RenderStyle,
    pub delete_tolerance: f64,
    pub palette: Palette,
    pub keymap: Keymap,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            detector: DetectorSettings {
                weights: WEIGHTS_FILE.into(),
                model_config: CONFIG_FILE.into(),
                classes: CLASSES_FILE.into(),
                confidence: 0.5,
                nms: 0.2,
                input_size: 416,
                targets: DEFAULT_TARGETS.iter().map(|t| t.to_string()).collect(),
            },
            video: VideoSettings {
                skip_frames: 0,
                width: 1600,
                height: 830,
                record_fps: 30.,
                record: None,
            },
            style: RenderStyle::default(),
            delete_tolerance: DELETE_TOLERANCE_PX,
            palette: Palette::default(),
            keymap: Keymap::default(),
        }
    }
}

/// Flags understood by every binary.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct CommonArgs {
    /// TOML settings file
    #[arg(long, env = "REGIONCOUNT_CONFIG")]
    pub config: Option<PathBuf>,
    /// Darknet weights
    #[arg(long)]
    pub weights: Option<PathBuf>,
    /// Darknet network description (.cfg)
    #[arg(long)]
    pub model_config: Option<PathBuf>,
    /// Class names, one per line
    #[arg(long)]
    pub classes: Option<PathBuf>,
    /// Frames to drop from the start of each stream
    #[arg(long)]
    pub skip_frames: Option<u32>,
    #[arg(long)]
    pub width: Option<i32>,
    #[arg(long)]
    pub height: Option<i32>,
    /// Record annotated video: a file for `annotate`, a folder of
    /// `<stream>.mp4` files for the dashboard
    #[arg(long)]
    pub record: Option<PathBuf>,
}

impl Settings {
    pub fn load(args: &CommonArgs) -> Result<Self> {
        let mut settings = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_args(args);
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(raw)?;
        let mut settings = Self::default();

        if let Some(d) = file.detector {
            let s = &mut settings.detector;
            if let Some(p) = d.weights {
                s.weights = p;
            }
            if let Some(p) = d.model_config {
                s.model_config = p;
            }
            if let Some(p) = d.classes {
                s.classes = p;
            }
            s.confidence = d.confidence.unwrap_or(s.confidence);
            s.nms = d.nms.unwrap_or(s.nms);
            s.input_size = d.input_size.unwrap_or(s.input_size);
            if let Some(targets) = d.targets {
                s.targets = targets;
            }
        }

        if let Some(v) = file.video {
            let s = &mut settings.video;
            s.skip_frames = v.skip_frames.unwrap_or(s.skip_frames);
            s.width = v.width.unwrap_or(s.width);
            s.height = v.height.unwrap_or(s.height);
            s.record_fps = v.record_fps.unwrap_or(s.record_fps);
        }

        if let Some(r) = file.render {
            let s = &mut settings.style;
            s.dot_spacing = r.dot_spacing.unwrap_or(s.dot_spacing);
            s.dot_radius = r.dot_radius.unwrap_or(s.dot_radius);
            s.label_scale = r.label_scale.unwrap_or(s.label_scale);
            settings.delete_tolerance = r.delete_tolerance.unwrap_or(settings.delete_tolerance);
        }

        for (color, hex) in file.palette.unwrap_or_default() {
            let color: RegionColor = color.parse()?;
            settings.palette.set(color, DisplayColor::from_hex(&hex)?);
        }

        for (key, action) in file.keys.unwrap_or_default() {
            let key = parse_key(&key)?;
            if action.eq_ignore_ascii_case("none") {
                settings.keymap.unbind(key);
            } else {
                settings.keymap.bind(key, action.parse::<KeyAction>()?);
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    fn apply_args(&mut self, args: &CommonArgs) {
        if let Some(p) = &args.weights {
            self.detector.weights = p.clone();
        }
        if let Some(p) = &args.model_config {
            self.detector.model_config = p.clone();
        }
        if let Some(p) = &args.classes {
            self.detector.classes = p.clone();
        }
        self.video.skip_frames = args.skip_frames.unwrap_or(self.video.skip_frames);
        self.video.width = args.width.unwrap_or(self.video.width);
        self.video.height = args.height.unwrap_or(self.video.height);
        if args.record.is_some() {
            self.video.record = args.record.clone();
        }
    }

    fn validate(&self) -> Result<()> {
        let d = &self.detector;
        if !(0. ..=1.).contains(&d.confidence) || !(0. ..=1.).contains(&d.nms) {
            return Err(Error::Setting("detector thresholds must lie in [0, 1]".into()));
        }
        if self.video.width <= 0 || self.video.height <= 0 {
            return Err(Error::Setting("frame size must be positive".into()));
        }

        let s = &self.style;
        if !(s.dot_spacing >= MIN_DOT_SPACING) {
            return Err(Error::Setting(format!(
                "render.dot_spacing must be at least {MIN_DOT_SPACING}"
            )));
        }
        if s.dot_radius < 0 {
            return Err(Error::Setting("render.dot_radius must not be negative".into()));
        }
        if !(s.label_scale > 0.) {
            return Err(Error::Setting("render.label_scale must be positive".into()));
        }
        if !(self.delete_tolerance >= 0.) {
            return Err(Error::Setting(
                "render.delete_tolerance must not be negative".into(),
            ));
        }
        Ok(())
    }
}
