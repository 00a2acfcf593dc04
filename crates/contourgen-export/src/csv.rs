//! CSV statistics export.
//!
//! One row per contour with the evaluation columns used for
//! generalization reports: Hausdorff distance, acceptance, and vertex
//! counts before and after.

use serde::Serialize;

use contourgen_pipeline::{PipelineError, SimplificationResult};

use crate::ExportError;

/// One line of the statistics table.
///
/// Fields that only exist for successfully processed contours are
/// `None` (written as empty cells) when processing failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsRow {
    /// Position of the contour in the input document.
    pub id: usize,
    /// Contour elevation.
    pub elevation: f64,
    /// Symmetric Hausdorff distance between original and candidate.
    pub hausdorff_m: Option<f64>,
    /// Whether the generalized line was kept.
    pub accepted: Option<bool>,
    /// Vertex count of the input line.
    pub vtx_orig: usize,
    /// Vertex count of the output line.
    pub vtx_simpl: Option<usize>,
    /// `simplified`, `rejected`, `degenerate`, or `failed`.
    pub status: &'static str,
    /// Error message for failed contours.
    pub error: Option<String>,
}

impl StatsRow {
    /// Build a row from one contour's outcome.
    #[must_use]
    pub fn new(
        id: usize,
        elevation: f64,
        vtx_orig: usize,
        outcome: &Result<SimplificationResult, PipelineError>,
    ) -> Self {
        match outcome {
            Ok(r) => Self {
                id,
                elevation,
                hausdorff_m: Some(r.hausdorff_distance),
                accepted: Some(r.accepted),
                vtx_orig,
                vtx_simpl: Some(r.vertices_after),
                status: r.status.as_str(),
                error: None,
            },
            Err(e) => Self {
                id,
                elevation,
                hausdorff_m: None,
                accepted: None,
                vtx_orig,
                vtx_simpl: None,
                status: "failed",
                error: Some(e.to_string()),
            },
        }
    }
}

/// Serialize rows into a CSV document with a header line.
///
/// # Errors
///
/// Returns [`ExportError`] if the CSV writer fails.
pub fn to_csv(rows: &[StatsRow]) -> Result<String, ExportError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| ExportError::Flush(e.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
