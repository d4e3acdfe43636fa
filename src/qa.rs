//! QA artifacts generation

use crate::config::Config;
use crate::error::{Result as SheetErrorResult, SheetError};
use crate::sheet::SheetState;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Summary written to `statistics.json`
#[derive(Debug, Clone, Serialize)]
pub struct DetectionStatistics {
    pub source: Option<String>,
    pub original_size: (u32, u32),
    pub binary_size: Option<(u32, u32)>,
    pub foreground_pixels: Option<usize>,
    pub template_size: Option<(u32, u32)>,
    pub threshold: f32,
    pub detections: usize,
    pub min_pitch: Option<i32>,
    pub max_pitch: Option<i32>,
    pub out_of_range_pitches: usize,
    pub pitch_histogram: BTreeMap<i32, usize>,
}

/// Generate QA artifacts (images, statistics)
pub fn generate_artifacts(
    state: &SheetState,
    output_dir: &Path,
    config: &Config,
) -> SheetErrorResult<()> {
    fs::create_dir_all(output_dir)?;

    if let Some(binary) = &state.binary {
        let path = output_dir.join("binary.png");
        binary
            .as_gray()
            .save(&path)
            .map_err(|e| SheetError::QaGenerationError(format!("{}: {}", path.display(), e)))?;

        let overlay = detection_overlay(state, config.qa.detection_color);
        let path = output_dir.join("detections.png");
        overlay
            .save(&path)
            .map_err(|e| SheetError::QaGenerationError(format!("{}: {}", path.display(), e)))?;
    }

    let stats = compute_statistics(state, config);
    let json = serde_json::to_string_pretty(&stats)?;
    fs::write(output_dir.join("statistics.json"), json)?;

    info!(dir = %output_dir.display(), "QA artifacts generated");
    Ok(())
}

/// Binary image in color with a hollow box at every detection
pub fn detection_overlay(state: &SheetState, color: [u8; 3]) -> RgbImage {
    let Some(binary) = &state.binary else {
        return RgbImage::new(0, 0);
    };

    let gray = binary.as_gray();
    let mut canvas = RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    });

    let (tw, th) = state.template_size.unwrap_or((1, 1));
    for p in &state.positions {
        let rect = Rect::at(p.x as i32, p.y as i32).of_size(tw.max(1), th.max(1));
        draw_hollow_rect_mut(&mut canvas, rect, Rgb(color));
    }

    canvas
}

/// Counts and pitch distribution for the current state
pub fn compute_statistics(state: &SheetState, config: &Config) -> DetectionStatistics {
    let mut pitch_histogram = BTreeMap::new();
    for note in &state.note_events {
        *pitch_histogram.entry(note.pitch).or_insert(0) += 1;
    }

    DetectionStatistics {
        source: state
            .source_path
            .as_ref()
            .map(|p| p.display().to_string()),
        original_size: state.dimensions(),
        binary_size: state.binary.as_ref().map(|b| (b.width(), b.height())),
        foreground_pixels: state.binary.as_ref().map(|b| b.foreground_count()),
        template_size: state.template_size,
        threshold: config.detection.threshold,
        detections: state.positions.len(),
        min_pitch: state.note_events.iter().map(|n| n.pitch).min(),
        max_pitch: state.note_events.iter().map(|n| n.pitch).max(),
        out_of_range_pitches: state
            .note_events
            .iter()
            .filter(|n| !n.in_midi_range())
            .count(),
        pitch_histogram,
    }
}
