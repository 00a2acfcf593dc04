//! contourgen-export: Pure format serializers (sans-IO)
//!
//! Turns generalization results into output formats: a CSV statistics
//! table and a diagnostic SVG overlay. Every function returns a `String`;
//! writing it somewhere is the caller's job.

pub mod csv;
pub mod svg;

pub use csv::{StatsRow, to_csv};
pub use svg::{OverlayLayers, SvgMetadata, to_overlay_svg};

/// Errors from the export serializers.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The CSV writer rejected a record.
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] ::csv::Error),

    /// The CSV writer could not flush its buffer.
    #[error("CSV flush failed: {0}")]
    Flush(String),

    /// The serialized output was not valid UTF-8.
    #[error("output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
