//! OpenCV operations used by the pipeline, plus conversions between OpenCV
//! matrices and `image` buffers.
//!
//! Everything the passes compute goes through OpenCV so the pixels agree with
//! `imread`/`resize`/`GaussianBlur`/`adaptiveThreshold`/`matchTemplate`.
//! The `image` buffers are what the rest of the crate stores and saves.

use crate::error::{Result as SheetErrorResult, SheetError};
use image::{GrayImage, RgbImage};
use ndarray::Array2;
use opencv::core::{Mat, Scalar, Size, CV_8UC1, CV_8UC3};
use opencv::prelude::*;
use opencv::{imgcodecs, imgproc};
use std::path::Path;

fn is_empty(mat: &Mat) -> bool {
    mat.rows() <= 0 || mat.cols() <= 0
}

/// Decode an image file. OpenCV reports unreadable files as an empty matrix.
fn read(path: &Path, flags: i32) -> SheetErrorResult<Mat> {
    let name = path.to_str().ok_or_else(|| {
        SheetError::ImageLoadError(format!("path is not valid UTF-8: {}", path.display()))
    })?;
    let mat = imgcodecs::imread(name, flags)?;
    if is_empty(&mat) {
        return Err(SheetError::ImageLoadError(format!(
            "cannot read image {}",
            path.display()
        )));
    }
    Ok(mat)
}

/// Decode as 8-bit grayscale (BT.601 luma for color files)
pub fn read_grayscale(path: &Path) -> SheetErrorResult<GrayImage> {
    mat_to_gray(&read(path, imgcodecs::IMREAD_GRAYSCALE)?)
}

/// Decode as 8-bit RGB
pub fn read_rgb(path: &Path) -> SheetErrorResult<RgbImage> {
    let bgr = read(path, imgcodecs::IMREAD_COLOR)?;
    let mut rgb = Mat::default();
    imgproc::cvt_color_def(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB)?;
    if rgb.typ() != CV_8UC3 {
        return Err(SheetError::InvalidImageFormat(format!(
            "expected 8-bit RGB, got OpenCV type {}",
            rgb.typ()
        )));
    }
    let bytes = rgb.try_clone()?.data_bytes()?.to_vec();
    RgbImage::from_raw(rgb.cols() as u32, rgb.rows() as u32, bytes).ok_or_else(|| {
        SheetError::InvalidImageFormat("RGB buffer size does not match its shape".to_string())
    })
}

/// Copy a grayscale image into a single-channel 8-bit matrix
pub fn gray_to_mat(img: &GrayImage) -> SheetErrorResult<Mat> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(SheetError::InvalidImageFormat(
            "cannot convert an empty image".to_string(),
        ));
    }
    let mut mat =
        Mat::new_rows_cols_with_default(height as i32, width as i32, CV_8UC1, Scalar::all(0.0))?;
    mat.data_bytes_mut()?.copy_from_slice(img.as_raw());
    Ok(mat)
}

/// Copy a single-channel 8-bit matrix into a grayscale image
pub fn mat_to_gray(mat: &Mat) -> SheetErrorResult<GrayImage> {
    if mat.typ() != CV_8UC1 {
        return Err(SheetError::InvalidImageFormat(format!(
            "expected 8-bit single channel, got OpenCV type {}",
            mat.typ()
        )));
    }
    // A clone is always continuous
    let bytes = mat.try_clone()?.data_bytes()?.to_vec();
    GrayImage::from_raw(mat.cols() as u32, mat.rows() as u32, bytes).ok_or_else(|| {
        SheetError::InvalidImageFormat("gray buffer size does not match its shape".to_string())
    })
}

/// Bilinear resize to exactly `width` x `height`
pub fn resize_linear(src: &Mat, width: u32, height: u32) -> SheetErrorResult<Mat> {
    let mut dst = Mat::default();
    imgproc::resize(
        src,
        &mut dst,
        Size::new(width as i32, height as i32),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;
    Ok(dst)
}

/// Square Gaussian blur; `sigma <= 0` derives sigma from the kernel size
pub fn gaussian_blur(src: &Mat, ksize: usize, sigma: f64) -> SheetErrorResult<Mat> {
    let mut dst = Mat::default();
    imgproc::gaussian_blur_def(src, &mut dst, Size::new(ksize as i32, ksize as i32), sigma)?;
    Ok(dst)
}

/// Gaussian adaptive threshold, inverted so dark ink becomes `max_value`
pub fn adaptive_threshold_inv(
    src: &Mat,
    max_value: u8,
    block_size: usize,
    c: f64,
) -> SheetErrorResult<Mat> {
    let mut dst = Mat::default();
    imgproc::adaptive_threshold(
        src,
        &mut dst,
        max_value as f64,
        imgproc::ADAPTIVE_THRESH_GAUSSIAN_C,
        imgproc::THRESH_BINARY_INV,
        block_size as i32,
        c,
    )?;
    Ok(dst)
}

/// Normalized correlation coefficient of `template` at every offset in `image`.
///
/// The map is `(rows - th + 1, cols - tw + 1)`, indexed `[[y, x]]`. The
/// template must fit inside the image.
pub fn match_template_ccoeff_normed(image: &Mat, template: &Mat) -> SheetErrorResult<Array2<f32>> {
    let mut result = Mat::default();
    imgproc::match_template_def(image, template, &mut result, imgproc::TM_CCOEFF_NORMED)?;

    let shape = (result.rows() as usize, result.cols() as usize);
    let scores = result.try_clone()?.data_typed::<f32>()?.to_vec();
    Array2::from_shape_vec(shape, scores)
        .map_err(|e| SheetError::ProcessingPipelineError(format!("score map: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_gray_mat_round_trip() {
        let img = GrayImage::from_fn(7, 3, |x, y| Luma([(x * 10 + y) as u8]));
        let mat = gray_to_mat(&img).unwrap();
        assert_eq!((mat.cols(), mat.rows()), (7, 3));
        assert_eq!(*mat.at_2d::<u8>(2, 5).unwrap(), 52);
        assert_eq!(mat_to_gray(&mat).unwrap(), img);
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let err = gray_to_mat(&GrayImage::new(0, 0)).unwrap_err();
        assert!(matches!(err, SheetError::InvalidImageFormat(_)));
    }

    #[test]
    fn test_blur_preserves_constant_image() {
        let mat = gray_to_mat(&GrayImage::from_pixel(9, 6, Luma([137]))).unwrap();
        let blurred = mat_to_gray(&gaussian_blur(&mat, 5, 0.0).unwrap()).unwrap();
        assert!(blurred.pixels().all(|p| p.0[0] == 137));
    }

    #[test]
    fn test_adaptive_threshold_marks_dark_stroke() {
        let img = GrayImage::from_fn(15, 15, |x, _| Luma([if x == 7 { 20 } else { 200 }]));
        let mat = gray_to_mat(&img).unwrap();
        let out = mat_to_gray(&adaptive_threshold_inv(&mat, 255, 11, 2.0).unwrap()).unwrap();
        for y in 0..15 {
            assert_eq!(out.get_pixel(7, y).0[0], 255);
            assert_eq!(out.get_pixel(0, y).0[0], 0);
        }
    }

    #[test]
    fn test_exact_match_scores_one() {
        let mut image = GrayImage::new(8, 8);
        image.put_pixel(4, 3, Luma([255]));
        image.put_pixel(4, 4, Luma([255]));
        let mut template = GrayImage::new(3, 3);
        template.put_pixel(1, 1, Luma([255]));
        template.put_pixel(1, 2, Luma([255]));

        let scores = match_template_ccoeff_normed(
            &gray_to_mat(&image).unwrap(),
            &gray_to_mat(&template).unwrap(),
        )
        .unwrap();
        assert_eq!(scores.dim(), (6, 6));
        assert!((scores[[2, 3]] - 1.0).abs() < 1e-4);
        assert!(scores.iter().all(|&s| s <= 1.0 + 1e-4));
    }

    #[test]
    fn test_unreadable_file_is_a_load_error() {
        let err = read_grayscale(Path::new("no/such/sheet.png")).unwrap_err();
        assert!(matches!(err, SheetError::ImageLoadError(_)));
    }
}
