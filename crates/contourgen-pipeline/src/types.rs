//! Shared types for the contourgen generalization pipeline.

use serde::{Deserialize, Serialize};

use crate::network::OverlapPolicy;

/// Distance below which two geometries are treated as touching, in
/// linear units of the projected coordinate system.
///
/// Applied everywhere coincidence matters: intersection deduplication,
/// splitting, and snapping.
pub const COINCIDENCE_TOLERANCE: f64 = 1e-6;

/// A 2D point in a projected (linear-unit) coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Easting.
    pub x: f64,
    /// Northing.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Bit-for-bit coordinate equality.
    ///
    /// Unlike `==`, distinguishes `0.0` from `-0.0`. Used where the
    /// output must reproduce an exact input coordinate.
    #[must_use]
    pub fn bit_eq(self, other: Self) -> bool {
        self.x.to_bits() == other.x.to_bits() && self.y.to_bits() == other.y.to_bits()
    }
}

/// An ordered sequence of vertices defining a piecewise-linear curve.
///
/// Insertion order is the traversal order. Transforms never mutate a
/// polyline in place; they build new ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points without validation.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Create a polyline, rejecting inputs with fewer than 2 vertices.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DegenerateInput`] when `points` has
    /// fewer than 2 entries.
    pub fn try_new(points: Vec<Point>) -> Result<Self, PipelineError> {
        if points.len() < 2 {
            return Err(PipelineError::DegenerateInput {
                vertex_count: points.len(),
            });
        }
        Ok(Self(points))
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// Whether the first and last vertices coincide (a closed contour ring).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match (self.first(), self.last()) {
            (Some(a), Some(b)) => self.len() > 2 && a.bit_eq(*b),
            _ => false,
        }
    }

    /// Total length along the vertex path.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.0.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Returns a copy with bit-identical consecutive vertices merged.
    #[must_use]
    pub fn dedup_consecutive(&self) -> Self {
        let mut points: Vec<Point> = Vec::with_capacity(self.0.len());
        for &p in &self.0 {
            if points.last().is_none_or(|last| !last.bit_eq(p)) {
                points.push(p);
            }
        }
        Self(points)
    }

    /// Number of vertices once consecutive duplicates are merged.
    ///
    /// A polyline needs at least 2 to describe a curve.
    #[must_use]
    pub fn distinct_vertex_count(&self) -> usize {
        if self.0.is_empty() {
            return 0;
        }
        1 + self.0.windows(2).filter(|w| !w[0].bit_eq(w[1])).count()
    }
}

/// Parameters for generalizing one contour.
///
/// All distances are in the linear units of the projected coordinate
/// system (metres for UTM).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    /// Douglas-Peucker tolerance. Vertices within this distance of the
    /// chord are dropped.
    pub tolerance: f64,

    /// Maximum symmetric Hausdorff distance between the original and the
    /// generalized line. Candidates above it are rejected.
    pub hausdorff_limit: f64,

    /// Distance below which points and lines count as touching.
    pub coincidence_tolerance: f64,

    /// How collinear contour/hydrography overlaps become constraint points.
    pub overlap_policy: OverlapPolicy,
}

impl SimplifyConfig {
    /// Default Douglas-Peucker tolerance (10 m: the graphic tolerance for
    /// a 1:25,000 to 1:50,000 reduction).
    pub const DEFAULT_TOLERANCE: f64 = 10.0;

    /// Default Hausdorff acceptance limit.
    pub const DEFAULT_HAUSDORFF_LIMIT: f64 = 10.0;

    /// Default coincidence tolerance.
    pub const DEFAULT_COINCIDENCE_TOLERANCE: f64 = COINCIDENCE_TOLERANCE;

    /// Check that every distance is finite and in range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "tolerance must be finite and positive, got {}",
                self.tolerance
            )));
        }
        if !self.hausdorff_limit.is_finite() || self.hausdorff_limit < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "hausdorff_limit must be finite and non-negative, got {}",
                self.hausdorff_limit
            )));
        }
        if !self.coincidence_tolerance.is_finite() || self.coincidence_tolerance <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "coincidence_tolerance must be finite and positive, got {}",
                self.coincidence_tolerance
            )));
        }
        Ok(())
    }
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            tolerance: Self::DEFAULT_TOLERANCE,
            hausdorff_limit: Self::DEFAULT_HAUSDORFF_LIMIT,
            coincidence_tolerance: Self::DEFAULT_COINCIDENCE_TOLERANCE,
            overlap_policy: OverlapPolicy::default(),
        }
    }
}

/// How a feature left the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    /// The generalized line passed validation and replaces the original.
    Simplified,
    /// The generalized line exceeded the Hausdorff limit; the original
    /// is kept.
    Rejected,
    /// Splitting or reconstruction collapsed the line; the original is
    /// kept and the distance is reported as zero.
    Degenerate,
}

impl FeatureStatus {
    /// Lower-case name, matching the serde representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simplified => "simplified",
            Self::Rejected => "rejected",
            Self::Degenerate => "degenerate",
        }
    }
}

impl std::fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of generalizing one contour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplificationResult {
    /// The generalized line when accepted, otherwise the untouched input.
    pub geometry: Polyline,

    /// Symmetric Hausdorff distance between the input and the candidate.
    ///
    /// Still reported on rejection. Zero for degenerate fallbacks.
    pub hausdorff_distance: f64,

    /// Whether `geometry` is the generalized candidate.
    pub accepted: bool,

    /// Detailed outcome.
    pub status: FeatureStatus,

    /// Vertices in the input line.
    pub vertices_before: usize,

    /// Vertices in `geometry`.
    pub vertices_after: usize,

    /// Hydrography crossings pinned on this contour.
    pub constraint_count: usize,
}

/// Errors that can occur while generalizing a contour.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum PipelineError {
    /// The input line has fewer than 2 vertices.
    #[error("polyline has {vertex_count} vertices, at least 2 are required")]
    DegenerateInput {
        /// Number of vertices found.
        vertex_count: usize,
    },

    /// Splitting, simplification, or reconstruction collapsed the line.
    #[error("reconstructed line has {vertex_count} distinct vertices, at least 2 are required")]
    DegenerateReconstruction {
        /// Number of distinct vertices left.
        vertex_count: usize,
    },

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
