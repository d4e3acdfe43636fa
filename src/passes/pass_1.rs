//! Pass 1: Template Matching Note Detection

use crate::config::Config;
use crate::error::{Result as SheetErrorResult, SheetError};
use crate::sheet::{BinaryImage, Position, SheetState};
use crate::template::NoteTemplate;
use crate::vision::{gray_to_mat, match_template_ccoeff_normed};
use tracing::{debug, info};

/// Find every location where the template correlates with the binary image
/// at or above `threshold`.
///
/// Positions are the match's top-left corner, in row-major order of the
/// score map. Neighbouring matches of one symbol are all kept.
pub fn detect_notes(
    binary: &BinaryImage,
    template: &NoteTemplate,
    threshold: f32,
) -> SheetErrorResult<Vec<Position>> {
    if template.width() > binary.width() || template.height() > binary.height() {
        return Err(SheetError::TemplateTooLarge(format!(
            "template {}x{} does not fit in image {}x{}",
            template.width(),
            template.height(),
            binary.width(),
            binary.height()
        )));
    }

    let image = gray_to_mat(binary.as_gray())?;
    let templ = gray_to_mat(template.image())?;
    let scores = match_template_ccoeff_normed(&image, &templ)?;

    let positions: Vec<Position> = scores
        .indexed_iter()
        .filter(|&(_, &score)| score >= threshold)
        .map(|((y, x), _)| Position::new(x as u32, y as u32))
        .collect();

    debug!(
        candidates = scores.len(),
        matches = positions.len(),
        threshold,
        "Template matching complete"
    );

    Ok(positions)
}

pub fn run(state: &mut SheetState, template: &NoteTemplate, config: &Config) -> SheetErrorResult<()> {
    info!("Pass 1: Template Matching Note Detection");

    let binary = state.binary.as_ref().ok_or_else(|| {
        SheetError::ProcessingPipelineError(
            "note detection requires a preprocessed image".to_string(),
        )
    })?;

    state.positions = detect_notes(binary, template, config.detection.threshold)?;
    state.template_size = Some((template.width(), template.height()));

    Ok(())
}
