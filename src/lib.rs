//! Sheet-to-MIDI Conversion System
//!
//! Binarizes a photographed or scanned page of sheet music, finds note heads
//! by matching a single template, maps each match's height on the page to a
//! pitch and writes the notes to a Standard MIDI File. An optional overlay
//! lets the user box regions of the original image and attach comments.
//!
//! Image decoding and all pixel operations go through OpenCV.
//!
//! The file picker and the annotation window need the `gui` cargo feature
//! (FLTK). Without it the binary only offers the headless `convert`,
//! `validate-config` and `show-config` commands, and the default interactive
//! run exits with an error pointing at `--features gui`.

pub mod annotation;
pub mod config;
pub mod error;
#[cfg(feature = "gui")]
pub mod gui;
pub mod midi;
pub mod passes;
pub mod qa;
pub mod sheet;
pub mod template;
pub mod vision;

pub use config::Config;
pub use error::{Result as SheetErrorResult, SheetError};
pub use sheet::{NoteEvent, Position, SheetState};
pub use template::NoteTemplate;

use std::path::{Path, PathBuf};
use tracing::info;

/// Blocking request for the image to convert; `None` means cancelled
pub trait ImagePicker {
    fn pick_image(&mut self) -> Option<PathBuf>;
}

impl<F> ImagePicker for F
where
    F: FnMut() -> Option<PathBuf>,
{
    fn pick_image(&mut self) -> Option<PathBuf> {
        self()
    }
}

/// What a completed conversion produced
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub input_path: PathBuf,
    pub positions: Vec<Position>,
    pub note_events: Vec<NoteEvent>,
    pub midi_path: PathBuf,
}

/// Main processing pipeline for sheet-to-MIDI conversion
#[derive(Debug)]
pub struct SheetToMidi {
    config: Config,
    template: NoteTemplate,
}

impl SheetToMidi {
    /// Create a processor, loading the note template named by the configuration
    pub fn new(config: Config) -> SheetErrorResult<Self> {
        let template = NoteTemplate::load(&config.detection.template_path)?;
        Ok(Self::with_template(config, template))
    }

    /// Create a processor around an already loaded template
    pub fn with_template(config: Config, template: NoteTemplate) -> Self {
        Self { config, template }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn template(&self) -> &NoteTemplate {
        &self.template
    }

    /// Convert one image file and write the MIDI file
    pub fn process<P: AsRef<Path>>(&self, input_path: P) -> SheetErrorResult<ConversionReport> {
        let input_path = input_path.as_ref();

        let mut state = SheetState::load(input_path)?;
        self.run_pipeline(&mut state)?;
        self.export_results(&state)?;

        Ok(ConversionReport {
            input_path: input_path.to_path_buf(),
            positions: state.positions,
            note_events: state.note_events,
            midi_path: self.config.midi.output_path.clone(),
        })
    }

    /// Ask for an image, then convert it.
    ///
    /// Returns `Ok(None)` without touching any file when the picker is
    /// cancelled or yields an empty path.
    pub fn process_picked(
        &self,
        picker: &mut dyn ImagePicker,
    ) -> SheetErrorResult<Option<ConversionReport>> {
        let input_path = match picker.pick_image() {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => {
                println!("No image selected, exiting.");
                return Ok(None);
            }
        };

        self.process(input_path).map(Some)
    }

    /// Execute the preprocessing, detection and mapping passes
    pub fn run_pipeline(&self, state: &mut SheetState) -> SheetErrorResult<()> {
        // Pass 0: Resize, Blur & Adaptive Threshold
        passes::pass_0::run(state, &self.config)?;

        // Pass 1: Template Matching Note Detection
        passes::pass_1::run(state, &self.template, &self.config)?;
        println!("Detected {} notes.", state.positions.len());

        // Pass 2: Vertical Position to Pitch Mapping
        passes::pass_2::run(state, &self.config)?;

        Ok(())
    }

    /// Write the MIDI file and, when enabled, QA artifacts
    fn export_results(&self, state: &SheetState) -> SheetErrorResult<()> {
        midi::export_midi(
            &state.note_events,
            &self.config.midi.output_path,
            &self.config.midi,
        )?;

        if self.config.qa.generate_artifacts {
            qa::generate_artifacts(state, &self.config.qa.output_dir, &self.config)?;
        }

        info!(notes = state.note_events.len(), "Conversion finished");
        Ok(())
    }
}

/// Validate configuration and input files
pub fn validate_input<P: AsRef<Path>>(input_path: P, config: &Config) -> SheetErrorResult<()> {
    // Check input file exists and is a readable image
    sheet::validate_image_file(input_path)?;

    // Validate configuration
    config::validate_config(config)
        .map_err(|e| SheetError::ConfigValidationFailed(e.to_string()))?;

    Ok(())
}
