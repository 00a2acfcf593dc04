//! Feature document parsing, elevation selection, and output records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use contourgen_pipeline::{PipelineError, Polyline, SimplificationResult};

/// Relative slack when testing whether an elevation is a multiple of the
/// equidistance, to absorb decimal rounding in stored elevations.
const MULTIPLE_EPSILON: f64 = 1e-9;

/// One contour line with its elevation and pass-through attributes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContourFeature {
    /// Contour elevation in metres.
    pub elevation: f64,
    /// Vertices in drawing order.
    pub geometry: Polyline,
    /// Source attributes, copied unchanged into the output record.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Input document: contours to generalize and the hydrography network.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputDocument {
    /// Contours to generalize.
    pub contours: Vec<ContourFeature>,
    /// Stream lines whose crossings stay fixed. Optional.
    #[serde(default)]
    pub hydrography: Vec<Polyline>,
}

impl InputDocument {
    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Whether `elevation` is an integer multiple of `equidistance`.
#[must_use]
pub fn is_multiple_of(elevation: f64, equidistance: f64) -> bool {
    let ratio = elevation / equidistance;
    (ratio - ratio.round()).abs() <= MULTIPLE_EPSILON * ratio.abs().max(1.0)
}

/// Keep the contours on the target interval, remembering each one's
/// position in the input document.
#[must_use]
pub fn select_by_equidistance(
    contours: Vec<ContourFeature>,
    equidistance: f64,
) -> Vec<(usize, ContourFeature)> {
    contours
        .into_iter()
        .enumerate()
        .filter(|(_, c)| is_multiple_of(c.elevation, equidistance))
        .collect()
}

/// One generalized contour as written to the output document.
///
/// Input attributes are flattened alongside the statistics. Failed
/// contours keep their input geometry and carry an `error` message.
#[derive(Debug, Serialize)]
pub struct OutputRecord<'a> {
    /// Position of the contour in the input document.
    pub id: usize,
    /// Contour elevation in metres.
    pub elevation: f64,
    /// Input attributes, flattened into the record.
    #[serde(flatten)]
    pub attributes: &'a Map<String, Value>,
    /// Generalized geometry, or the input when it was kept.
    pub geometry: &'a Polyline,
    /// Hausdorff distance between input and candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hausdorff_m: Option<f64>,
    /// Whether the generalized line was kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
    /// Input vertex count.
    pub vtx_orig: usize,
    /// Output vertex count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vtx_simpl: Option<usize>,
    /// `simplified`, `rejected`, `degenerate`, or `failed`.
    pub status: &'static str,
    /// Failure message for contours that could not be processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> OutputRecord<'a> {
    /// Build the record for `feature` from its pipeline outcome.
    #[must_use]
    pub fn new(
        id: usize,
        feature: &'a ContourFeature,
        outcome: &'a Result<SimplificationResult, PipelineError>,
    ) -> Self {
        let base = Self {
            id,
            elevation: feature.elevation,
            attributes: &feature.attributes,
            geometry: &feature.geometry,
            hausdorff_m: None,
            accepted: None,
            vtx_orig: feature.geometry.len(),
            vtx_simpl: None,
            status: "failed",
            error: None,
        };
        match outcome {
            Ok(r) => Self {
                geometry: &r.geometry,
                hausdorff_m: Some(r.hausdorff_distance),
                accepted: Some(r.accepted),
                vtx_simpl: Some(r.vertices_after),
                status: r.status.as_str(),
                ..base
            },
            Err(e) => Self {
                error: Some(e.to_string()),
                ..base
            },
        }
    }
}
