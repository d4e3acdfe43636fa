//! MIDI export functionality

use crate::config::MidiConfig;
use crate::error::{Result as SheetErrorResult, SheetError};
use crate::sheet::NoteEvent;
use midly::num::{u15, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Low seven bits of a pitch, as carried by a MIDI data byte
fn data_byte(pitch: i32) -> u7 {
    u7::from(pitch.rem_euclid(128) as u8)
}

/// Build a one-track file: note-on then note-off for each event, in order
pub fn build_smf(notes: &[NoteEvent], params: &MidiConfig) -> Smf<'static> {
    let channel = u4::from(params.channel);
    let mut track_events = Vec::with_capacity(notes.len() * 2 + 1);

    for note in notes {
        let key = data_byte(note.pitch);
        let vel = u7::from(note.velocity);

        track_events.push(TrackEvent {
            delta: u28::from(note.on_delta),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, vel },
            },
        });
        track_events.push(TrackEvent {
            delta: u28::from(note.off_delta),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff { key, vel },
            },
        });
    }

    track_events.push(TrackEvent {
        delta: u28::from(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    Smf {
        header: Header {
            format: Format::Parallel,
            timing: Timing::Metrical(u15::from(params.ticks_per_beat)),
        },
        tracks: vec![track_events],
    }
}

/// Serialize note events to Standard MIDI File bytes
pub fn encode_midi(notes: &[NoteEvent], params: &MidiConfig) -> SheetErrorResult<Vec<u8>> {
    let smf = build_smf(notes, params);
    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| SheetError::MidiExportError(format!("Failed to write MIDI data: {:?}", e)))?;
    Ok(bytes)
}

/// Write note events to `path`, replacing any existing file
pub fn export_midi(notes: &[NoteEvent], path: &Path, params: &MidiConfig) -> SheetErrorResult<()> {
    let midi_data = encode_midi(notes, params)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(path)?;
    file.write_all(&midi_data)?;

    debug!(notes = notes.len(), bytes = midi_data.len(), "MIDI file written");
    println!("MIDI saved as {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Position;

    fn note(pitch: i32) -> NoteEvent {
        NoteEvent {
            position: Position::new(0, 0),
            pitch,
            velocity: 64,
            on_delta: 100,
            off_delta: 200,
        }
    }

    #[test]
    fn test_data_byte_wraps_out_of_range_pitch() {
        assert_eq!(data_byte(60).as_int(), 60);
        assert_eq!(data_byte(127).as_int(), 127);
        assert_eq!(data_byte(160).as_int(), 32);
    }

    #[test]
    fn test_empty_track_has_only_end_of_track() {
        let smf = build_smf(&[], &MidiConfig::default());
        assert_eq!(smf.tracks.len(), 1);
        assert_eq!(smf.tracks[0].len(), 1);
        assert!(matches!(
            smf.tracks[0][0].kind,
            TrackEventKind::Meta(MetaMessage::EndOfTrack)
        ));
    }

    #[test]
    fn test_header_uses_configured_resolution() {
        let smf = build_smf(&[note(60)], &MidiConfig::default());
        assert_eq!(smf.header.timing, Timing::Metrical(u15::from(480)));
        assert_eq!(smf.tracks[0].len(), 3);
    }
}
