//! Error types for sheet composition and preset storage

use thiserror::Error;

/// Label sheet error types
#[derive(Debug, Error)]
pub enum LabelError {
    /// No non-empty label lines were supplied
    #[error("No labels provided.")]
    NoLabels,

    /// Margins, padding, font and code size leave no room for a single row
    #[error("Settings produce zero rows per page.")]
    ZeroRows,

    /// A configuration field is out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The code symbol could not be encoded for an item
    #[error("Failed to generate code for: {item} ({reason})")]
    CodeGeneration { item: String, reason: String },

    /// Import data is not a preset array or export object
    #[error("Invalid presets file format: {0}")]
    InvalidPresetFile(String),

    /// No preset with the given name exists
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// Font file could not be parsed or embedded
    #[error("Font error: {0}")]
    Font(String),

    /// PDF assembly failed
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for label sheet operations
pub type LabelResult<T> = Result<T, LabelError>;
