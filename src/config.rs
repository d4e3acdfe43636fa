//! Configuration system for the sheet-to-MIDI processor

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub preprocess: PreprocessConfig,
    pub detection: DetectionConfig,
    pub midi: MidiConfig,
    pub annotation: AnnotationConfig,
    pub qa: QaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            preprocess: PreprocessConfig::default(),
            detection: DetectionConfig::default(),
            midi: MidiConfig::default(),
            annotation: AnnotationConfig::default(),
            qa: QaConfig::default(),
        }
    }
}

/// Image preprocessing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Output width in pixels; aspect ratio is not preserved
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Gaussian blur kernel size (odd)
    pub blur_kernel: usize,
    /// Gaussian blur sigma; <= 0 derives it from the kernel size
    pub blur_sigma: f64,
    /// Neighbourhood size of the adaptive threshold (odd, > 1)
    pub threshold_block_size: usize,
    /// Constant subtracted from the local Gaussian mean
    pub threshold_offset: f64,
    /// Value written for foreground pixels
    pub max_value: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 1000,
            blur_kernel: 5,
            blur_sigma: 0.0,
            threshold_block_size: 11,
            threshold_offset: 2.0,
            max_value: 255,
        }
    }
}

/// Template matching configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub template_path: PathBuf,
    /// Minimum normalized correlation coefficient for a match
    pub threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from("quarter_note_template.png"),
            threshold: 0.6,
        }
    }
}

/// MIDI generation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    pub output_path: PathBuf,
    /// Pitch assigned to a detection at `reference_y`
    pub base_pitch: i32,
    pub reference_y: i32,
    /// Vertical pixels per semitone
    pub pixels_per_step: i32,
    pub velocity: u8,
    pub channel: u8,
    pub note_on_delta: u32,
    pub note_off_delta: u32,
    pub ticks_per_beat: u16,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("output.mid"),
            base_pitch: 60,
            reference_y: 1000,
            pixels_per_step: 10,
            velocity: 64,
            channel: 0,
            note_on_delta: 100,
            note_off_delta: 200,
            ticks_per_beat: 480,
        }
    }
}

/// How the annotation canvas derives its size from the image shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasSizing {
    /// Width and height taken from the image's column and row counts
    ImageDimensions,
    /// Height given the whole `[rows, cols, channels]` descriptor. Never a
    /// valid size; kept to reproduce the legacy overlay.
    ShapeDescriptor,
}

/// Annotation overlay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub window_title: String,
    pub prompt_title: String,
    pub prompt_message: String,
    pub outline_color: [u8; 3],
    pub canvas_sizing: CanvasSizing,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            window_title: "Sheet Music Annotator".to_string(),
            prompt_title: "Input".to_string(),
            prompt_message: "Add annotation comment:".to_string(),
            outline_color: [255, 0, 0],
            canvas_sizing: CanvasSizing::ImageDimensions,
        }
    }
}

/// QA artifacts configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    pub generate_artifacts: bool,
    pub output_dir: PathBuf,
    pub detection_color: [u8; 3],
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            generate_artifacts: false,
            output_dir: PathBuf::from("qa"),
            detection_color: [255, 0, 0],
        }
    }
}

/// Validate configuration parameters
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    let pre = &config.preprocess;
    if pre.width == 0 || pre.height == 0 {
        anyhow::bail!("preprocess width and height must be non-zero");
    }
    if pre.blur_kernel == 0 || pre.blur_kernel % 2 == 0 {
        anyhow::bail!("blur_kernel must be odd and positive, got {}", pre.blur_kernel);
    }
    if pre.threshold_block_size < 3 || pre.threshold_block_size % 2 == 0 {
        anyhow::bail!(
            "threshold_block_size must be odd and > 1, got {}",
            pre.threshold_block_size
        );
    }

    let threshold = config.detection.threshold;
    if !(-1.0..=1.0).contains(&threshold) {
        anyhow::bail!("detection threshold must lie in [-1, 1], got {}", threshold);
    }

    let midi = &config.midi;
    if midi.pixels_per_step == 0 {
        anyhow::bail!("pixels_per_step must be non-zero");
    }
    if midi.velocity > 127 {
        anyhow::bail!("velocity must be <= 127, got {}", midi.velocity);
    }
    if midi.channel > 15 {
        anyhow::bail!("channel must be <= 15, got {}", midi.channel);
    }
    if midi.ticks_per_beat == 0 || midi.ticks_per_beat > 0x7fff {
        anyhow::bail!("ticks_per_beat must be in 1..=32767");
    }
    // Delta times are 28-bit variable-length quantities
    if midi.note_on_delta >= 1 << 28 || midi.note_off_delta >= 1 << 28 {
        anyhow::bail!("note deltas must fit in 28 bits");
    }

    Ok(())
}

/// Load configuration from JSON file
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Save configuration to JSON file
pub fn save_config<P: AsRef<std::path::Path>>(config: &Config, path: P) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
