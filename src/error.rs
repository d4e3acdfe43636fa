//! Error types for the sheet-to-MIDI system

use std::fmt;

/// Custom error type for sheet-to-MIDI processing
#[derive(Debug, Clone)]
pub enum SheetError {
    /// E001: Image could not be read or decoded
    ImageLoadError(String),
    /// E002: Image has an unusable format or size
    InvalidImageFormat(String),
    /// E003: Configuration validation failed
    ConfigValidationFailed(String),
    /// E004: Note template could not be loaded
    TemplateLoadError(String),
    /// E005: Template does not fit inside the image it is matched against
    TemplateTooLarge(String),
    /// E006: File I/O error
    FileIoError(String),
    /// E007: Invalid configuration parameter
    InvalidConfigParameter(String),
    /// E008: Processing pipeline error
    ProcessingPipelineError(String),
    /// E009: MIDI export error
    MidiExportError(String),
    /// E010: QA artifact generation error
    QaGenerationError(String),
    /// E011: Input validation error
    InputValidationError(String),
    /// E012: Annotation canvas could not be sized from the image shape
    CanvasSizingError(String),
    /// E013: GUI toolkit error
    GuiError(String),
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetError::ImageLoadError(msg) => {
                write!(f, "E001: Image load error - {}", msg)
            }
            SheetError::InvalidImageFormat(msg) => {
                write!(f, "E002: Invalid image format - {}", msg)
            }
            SheetError::ConfigValidationFailed(msg) => {
                write!(f, "E003: Configuration validation failed - {}", msg)
            }
            SheetError::TemplateLoadError(msg) => {
                write!(f, "E004: Template load error - {}", msg)
            }
            SheetError::TemplateTooLarge(msg) => {
                write!(f, "E005: Template larger than image - {}", msg)
            }
            SheetError::FileIoError(msg) => {
                write!(f, "E006: File I/O error - {}", msg)
            }
            SheetError::InvalidConfigParameter(msg) => {
                write!(f, "E007: Invalid configuration parameter - {}", msg)
            }
            SheetError::ProcessingPipelineError(msg) => {
                write!(f, "E008: Processing pipeline error - {}", msg)
            }
            SheetError::MidiExportError(msg) => {
                write!(f, "E009: MIDI export error - {}", msg)
            }
            SheetError::QaGenerationError(msg) => {
                write!(f, "E010: QA artifact generation error - {}", msg)
            }
            SheetError::InputValidationError(msg) => {
                write!(f, "E011: Input validation error - {}", msg)
            }
            SheetError::CanvasSizingError(msg) => {
                write!(f, "E012: Canvas sizing error - {}", msg)
            }
            SheetError::GuiError(msg) => {
                write!(f, "E013: GUI error - {}", msg)
            }
        }
    }
}

impl std::error::Error for SheetError {}

impl From<std::io::Error> for SheetError {
    fn from(err: std::io::Error) -> Self {
        SheetError::FileIoError(format!("File I/O error: {}", err))
    }
}

impl From<serde_json::Error> for SheetError {
    fn from(err: serde_json::Error) -> Self {
        SheetError::QaGenerationError(format!("JSON serialization error: {}", err))
    }
}

impl From<opencv::Error> for SheetError {
    fn from(err: opencv::Error) -> Self {
        SheetError::ProcessingPipelineError(format!("OpenCV error: {}", err))
    }
}

/// Result type alias for sheet-to-MIDI operations
pub type Result<T> = std::result::Result<T, SheetError>;
