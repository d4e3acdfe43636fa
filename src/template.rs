//! Note template loaded once at startup and shared read-only by detection

use crate::error::{Result as SheetErrorResult, SheetError};
use crate::vision::read_grayscale;
use image::GrayImage;
use std::path::Path;
use tracing::info;

/// Handle to the grayscale note template used for matching
#[derive(Debug, Clone)]
pub struct NoteTemplate {
    image: GrayImage,
}

impl NoteTemplate {
    /// Load the template image from disk as 8-bit grayscale
    pub fn load<P: AsRef<Path>>(path: P) -> SheetErrorResult<Self> {
        let path = path.as_ref();
        let img = read_grayscale(path)
            .map_err(|e| SheetError::TemplateLoadError(format!("{}: {}", path.display(), e)))?;
        let template = Self::from_gray(&img)?;
        info!(
            path = %path.display(),
            width = template.width(),
            height = template.height(),
            "Loaded note template"
        );
        Ok(template)
    }

    /// Build a template from an in-memory grayscale image
    pub fn from_gray(img: &GrayImage) -> SheetErrorResult<Self> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(SheetError::TemplateLoadError(
                "template image is empty".to_string(),
            ));
        }
        Ok(Self { image: img.clone() })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }
}
