//! Pass 0: Resize, Blur & Adaptive Threshold

use crate::config::{Config, PreprocessConfig};
use crate::error::{Result as SheetErrorResult, SheetError};
use crate::sheet::{BinaryImage, SheetState};
use crate::vision::{adaptive_threshold_inv, gaussian_blur, gray_to_mat, mat_to_gray, resize_linear};
use image::GrayImage;
use opencv::prelude::*;
use tracing::{debug, info};

/// Turn a grayscale sheet into an inverted binary image (ink = foreground).
///
/// The image is stretched to the configured size with bilinear
/// interpolation regardless of its aspect ratio before filtering.
pub fn preprocess(gray: &GrayImage, params: &PreprocessConfig) -> SheetErrorResult<BinaryImage> {
    if gray.width() == 0 || gray.height() == 0 {
        return Err(SheetError::InvalidImageFormat(
            "cannot preprocess an empty image".to_string(),
        ));
    }
    if params.width == 0 || params.height == 0 {
        return Err(SheetError::InvalidConfigParameter(format!(
            "target size {}x{} is empty",
            params.width, params.height
        )));
    }
    if params.blur_kernel % 2 == 0
        || params.threshold_block_size % 2 == 0
        || params.threshold_block_size < 3
    {
        return Err(SheetError::InvalidConfigParameter(format!(
            "kernel sizes must be odd (blur {}, block {} > 1)",
            params.blur_kernel, params.threshold_block_size
        )));
    }

    let src = gray_to_mat(gray)?;
    let resized = resize_linear(&src, params.width, params.height)?;
    debug!(
        from = ?gray.dimensions(),
        to = ?(resized.cols(), resized.rows()),
        "Resized sheet"
    );

    let blurred = gaussian_blur(&resized, params.blur_kernel, params.blur_sigma)?;
    let binary = adaptive_threshold_inv(
        &blurred,
        params.max_value,
        params.threshold_block_size,
        params.threshold_offset,
    )?;

    BinaryImage::new(mat_to_gray(&binary)?, params.max_value)
}

pub fn run(state: &mut SheetState, config: &Config) -> SheetErrorResult<()> {
    info!("Pass 0: Resize, Blur & Adaptive Threshold");

    let binary = preprocess(&state.gray, &config.preprocess)?;
    debug!(
        foreground = binary.foreground_count(),
        "Binary image ready"
    );
    state.binary = Some(binary);

    Ok(())
}
