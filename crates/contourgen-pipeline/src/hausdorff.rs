//! Hausdorff validation of a generalized contour against its original.
//!
//! The distance is measured from every vertex of one line to the other
//! line as a continuous curve, in both directions, and the maximum is
//! taken. A candidate is accepted only if that distance stays within the
//! configured limit.

use serde::{Deserialize, Serialize};

use crate::geometry::distance_to_polyline;
use crate::types::Polyline;

/// Largest distance from a vertex of `from` to the curve `to`.
///
/// Returns 0.0 when `from` is empty.
#[must_use]
pub fn directed_hausdorff(from: &Polyline, to: &Polyline) -> f64 {
    from.points()
        .iter()
        .map(|&p| distance_to_polyline(p, to))
        .fold(0.0, f64::max)
}

/// Symmetric Hausdorff distance between two polylines.
#[must_use]
pub fn hausdorff_distance(a: &Polyline, b: &Polyline) -> f64 {
    directed_hausdorff(a, b).max(directed_hausdorff(b, a))
}

/// Accept/reject decision for a candidate line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    /// Symmetric Hausdorff distance between original and candidate.
    pub distance: f64,
    /// `true` iff `distance` is within the limit.
    pub accepted: bool,
}

/// Measure `candidate` against `original` and decide whether to keep it.
#[must_use]
pub fn validate(original: &Polyline, candidate: &Polyline, limit: f64) -> Validation {
    let distance = hausdorff_distance(original, candidate);
    Validation {
        distance,
        accepted: distance <= limit,
    }
}
