//! Image I/O and the per-run pipeline state

use crate::error::{Result as SheetErrorResult, SheetError};
use crate::vision::{read_grayscale, read_rgb};
use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Top-left corner of a template match, in binary-image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A note-on/note-off pair derived from one detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Detection this note came from
    pub position: Position,
    /// MIDI pitch, not clamped to 0..=127.
    ///
    /// A MIDI key is seven bits, so an out-of-range pitch is written as
    /// `pitch mod 128` (160 is written as 32). See [`NoteEvent::in_midi_range`].
    pub pitch: i32,
    pub velocity: u8,
    /// Ticks before the note-on
    pub on_delta: u32,
    /// Ticks between note-on and note-off
    pub off_delta: u32,
}

impl NoteEvent {
    /// Whether the pitch fits in a MIDI data byte
    pub fn in_midi_range(&self) -> bool {
        (0..=127).contains(&self.pitch)
    }
}

/// Single-channel image whose pixels are either 0 or the foreground value
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryImage(GrayImage);

impl BinaryImage {
    /// Wrap a grayscale image, rejecting any pixel outside `{0, foreground}`
    pub fn new(img: GrayImage, foreground: u8) -> SheetErrorResult<Self> {
        if let Some(p) = img.pixels().find(|p| p.0[0] != 0 && p.0[0] != foreground) {
            return Err(SheetError::InvalidImageFormat(format!(
                "binary image contains value {}",
                p.0[0]
            )));
        }
        Ok(Self(img))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    /// Number of foreground pixels
    pub fn foreground_count(&self) -> usize {
        self.0.pixels().filter(|p| p.0[0] != 0).count()
    }
}

/// Pipeline state for one sheet image
#[derive(Debug, Clone)]
pub struct SheetState {
    /// Path the image was loaded from, if any
    pub source_path: Option<PathBuf>,
    /// Original image as 8-bit grayscale
    pub gray: GrayImage,

    // Pass 0: preprocessing
    /// Resized, blurred and thresholded image
    pub binary: Option<BinaryImage>,

    // Pass 1: note detection
    /// Template matches in row-major scan order
    pub positions: Vec<Position>,
    /// Template size used for detection (width, height)
    pub template_size: Option<(u32, u32)>,

    // Pass 2: note mapping
    /// One note per detection, in detection order
    pub note_events: Vec<NoteEvent>,
}

impl SheetState {
    /// Load an image file as grayscale and create initial state
    pub fn load<P: AsRef<Path>>(path: P) -> SheetErrorResult<Self> {
        let path = path.as_ref();
        let gray = load_grayscale(path)?;
        let mut state = Self::from_gray(gray);
        state.source_path = Some(path.to_path_buf());
        Ok(state)
    }

    /// Create state from an in-memory grayscale image
    pub fn from_gray(gray: GrayImage) -> Self {
        SheetState {
            source_path: None,
            gray,
            binary: None,
            positions: Vec::new(),
            template_size: None,
            note_events: Vec::new(),
        }
    }

    /// Original image dimensions (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.gray.dimensions()
    }
}

/// Load an image file as 8-bit grayscale; color files are reduced to BT.601 luma
pub fn load_grayscale<P: AsRef<Path>>(path: P) -> SheetErrorResult<GrayImage> {
    let path = path.as_ref();
    let img = read_grayscale(path)?;
    debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        "Loaded grayscale image"
    );
    Ok(img)
}

/// Load an image file as 8-bit RGB, the form shown by the annotation overlay
pub fn load_color<P: AsRef<Path>>(path: P) -> SheetErrorResult<RgbImage> {
    read_rgb(path.as_ref())
}

/// Shape descriptor `[rows, cols, channels]` of an RGB image
pub fn shape_of(img: &RgbImage) -> Vec<usize> {
    vec![img.height() as usize, img.width() as usize, 3]
}

/// Validate that an input image exists and decodes to a usable size
pub fn validate_image_file<P: AsRef<Path>>(path: P) -> SheetErrorResult<()> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SheetError::InputValidationError(format!(
            "Image file does not exist: {}",
            path.display()
        )));
    }

    let gray = load_grayscale(path)?;
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Err(SheetError::InputValidationError(
            "Image has no pixels".to_string(),
        ));
    }

    let min = gray.pixels().map(|p| p.0[0]).min().unwrap_or(0);
    let max = gray.pixels().map(|p| p.0[0]).max().unwrap_or(0);
    if min == max {
        warn!(value = min, "Image is a single flat color; no notes will be found");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    fn temp_png(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sheet2midi_{}_{}.png", name, std::process::id()))
    }

    #[test]
    fn test_binary_image_rejects_gray_levels() {
        let img = GrayImage::from_pixel(4, 4, Luma([128]));
        assert!(BinaryImage::new(img, 255).is_err());

        let mut img = GrayImage::new(4, 4);
        img.put_pixel(1, 2, Luma([255]));
        let binary = BinaryImage::new(img, 255).unwrap();
        assert_eq!(binary.foreground_count(), 1);
    }

    #[test]
    fn test_note_range() {
        let note = NoteEvent {
            position: Position::new(0, 0),
            pitch: 160,
            velocity: 64,
            on_delta: 100,
            off_delta: 200,
        };
        assert!(!note.in_midi_range());
    }

    #[test]
    fn test_shape_descriptor_is_rows_cols_channels() {
        let img = RgbImage::new(30, 20);
        assert_eq!(shape_of(&img), vec![20, 30, 3]);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = validate_image_file("definitely/not/here.png").unwrap_err();
        assert!(matches!(err, SheetError::InputValidationError(_)));

        let err = SheetState::load("definitely/not/here.png").unwrap_err();
        assert!(matches!(err, SheetError::ImageLoadError(_)));
    }

    #[test]
    fn test_color_scan_uses_bt601_luma() {
        let path = temp_png("red");
        RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])).save(&path).unwrap();

        let gray = load_grayscale(&path).unwrap();
        let color = load_color(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        // 0.299 * 255
        assert!(gray.pixels().all(|p| *p == Luma([76])));
        assert_eq!(color.get_pixel(3, 3), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_state_remembers_source() {
        let path = temp_png("source");
        GrayImage::from_pixel(6, 2, Luma([90])).save(&path).unwrap();

        let state = SheetState::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(state.source_path.as_deref(), Some(path.as_path()));
        assert_eq!(state.dimensions(), (6, 2));
        assert!(state.binary.is_none());
    }
}
