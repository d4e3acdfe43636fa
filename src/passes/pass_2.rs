//! Pass 2: Vertical Position to Pitch Mapping

use crate::config::{Config, MidiConfig};
use crate::error::{Result as SheetErrorResult, SheetError};
use crate::sheet::{NoteEvent, Position, SheetState};
use tracing::{info, warn};

/// Pitch for a detection at row `y`: `base + floor((reference_y - y) / step)`.
///
/// Higher on the page means higher pitch. The result is not clamped.
pub fn pitch_for_y(y: i32, params: &MidiConfig) -> i32 {
    params.base_pitch + (params.reference_y - y).div_euclid(params.pixels_per_step)
}

/// Map detections to fixed-length notes; timing ignores position and order
pub fn map_notes(positions: &[Position], params: &MidiConfig) -> Vec<NoteEvent> {
    positions
        .iter()
        .map(|&position| NoteEvent {
            position,
            pitch: pitch_for_y(position.y as i32, params),
            velocity: params.velocity,
            on_delta: params.note_on_delta,
            off_delta: params.note_off_delta,
        })
        .collect()
}

pub fn run(state: &mut SheetState, config: &Config) -> SheetErrorResult<()> {
    info!("Pass 2: Vertical Position to Pitch Mapping");

    if config.midi.pixels_per_step == 0 {
        return Err(SheetError::InvalidConfigParameter(
            "pixels_per_step must be non-zero".to_string(),
        ));
    }

    state.note_events = map_notes(&state.positions, &config.midi);

    let out_of_range = state
        .note_events
        .iter()
        .filter(|n| !n.in_midi_range())
        .count();
    if out_of_range > 0 {
        warn!(
            out_of_range,
            "Some pitches fall outside 0..=127 and will wrap in the MIDI data byte"
        );
    }

    Ok(())
}
