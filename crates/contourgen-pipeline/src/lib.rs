//! contourgen-pipeline: Pure contour generalization pipeline (sans-IO).
//!
//! Reduces the vertex count of contour lines while keeping every
//! hydrography crossing as an exact vertex:
//! intersection -> split -> simplify -> reconstruct + snap -> validate.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! geometry and returns structured data. Reading feature files, filtering
//! by elevation, and writing results live in the `contourgen` binary and
//! `contourgen-export`.

pub mod batch;
pub mod diagnostics;
pub mod geometry;
pub mod hausdorff;
pub mod network;
pub mod reconstruct;
pub mod simplify;
pub mod split;
pub mod types;

pub use batch::{simplify_batch, simplify_batch_cancellable, simplify_batch_staged};
pub use diagnostics::{BatchDiagnostics, Clock, simplify_batch_with_diagnostics};
pub use network::{ConstraintPointSet, OverlapPolicy, ReferenceNetwork};
pub use types::{
    COINCIDENCE_TOLERANCE, FeatureStatus, PipelineError, Point, Polyline, SimplificationResult,
    SimplifyConfig,
};

/// Every intermediate produced while generalizing one contour.
///
/// Used by diagnostics and the SVG overlay to show where a contour was
/// cut and how each piece was simplified.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFeature {
    /// Hydrography crossings found on the input line.
    pub constraints: ConstraintPointSet,
    /// Sub-lines after splitting at the crossings.
    pub parts: Vec<Polyline>,
    /// Each sub-line after Douglas-Peucker.
    pub simplified_parts: Vec<Polyline>,
    /// Reassembled, snapped candidate (`None` when reconstruction
    /// collapsed the line).
    pub candidate: Option<Polyline>,
    /// Final accepted geometry and statistics.
    pub result: SimplificationResult,
}

/// Generalize one contour against the hydrography network.
///
/// Returns the generalized line when it stays within
/// `config.hausdorff_limit` of the input, otherwise the input itself.
/// Pure: reads only its arguments.
///
/// # Pipeline steps
///
/// 1. Intersect the line with `network` to find constraint points
/// 2. Split the line at the constraint points (skipped when there are none)
/// 3. Douglas-Peucker each sub-line
/// 4. Reassemble and snap onto the constraint points
/// 5. Validate by symmetric Hausdorff distance; fall back on rejection
///
/// A line that collapses during steps 2-4 (e.g. a small closed ring)
/// falls back to the input with `accepted = false` and distance 0.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails
/// [`SimplifyConfig::validate`], and [`PipelineError::DegenerateInput`]
/// if `line` has fewer than 2 vertices.
pub fn simplify_feature(
    line: &Polyline,
    network: &ReferenceNetwork,
    config: &SimplifyConfig,
) -> Result<SimplificationResult, PipelineError> {
    simplify_feature_staged(line, network, config).map(|staged| staged.result)
}

/// Like [`simplify_feature`] but keeps every intermediate.
///
/// # Errors
///
/// Same as [`simplify_feature`].
pub fn simplify_feature_staged(
    line: &Polyline,
    network: &ReferenceNetwork,
    config: &SimplifyConfig,
) -> Result<StagedFeature, PipelineError> {
    config.validate()?;
    if line.len() < 2 {
        return Err(PipelineError::DegenerateInput {
            vertex_count: line.len(),
        });
    }
    let tol = config.coincidence_tolerance;

    // 1. Constraint points.
    let constraints = network.intersections(line, tol, config.overlap_policy);

    // 2. Split (a no-op fold when there are no constraints).
    let parts = split::split_at_points(line, &constraints, tol);

    // 3. Simplify each piece.
    let simplified_parts = simplify::simplify_parts(&parts, config.tolerance);

    // 4. Reassemble and snap.
    let candidate = match reconstruct::reconstruct(&simplified_parts, &constraints, tol) {
        Ok(candidate) => candidate,
        Err(e) => {
            tracing::warn!(
                vertices = line.len(),
                constraints = constraints.len(),
                error = %e,
                "generalized line collapsed, keeping original",
            );
            let result = SimplificationResult {
                geometry: line.clone(),
                hausdorff_distance: 0.0,
                accepted: false,
                status: FeatureStatus::Degenerate,
                vertices_before: line.len(),
                vertices_after: line.len(),
                constraint_count: constraints.len(),
            };
            return Ok(StagedFeature {
                constraints,
                parts,
                simplified_parts,
                candidate: None,
                result,
            });
        }
    };

    // 5. Validate.
    let validation = hausdorff::validate(line, &candidate, config.hausdorff_limit);
    let (geometry, status) = if validation.accepted {
        (candidate.clone(), FeatureStatus::Simplified)
    } else {
        (line.clone(), FeatureStatus::Rejected)
    };
    tracing::debug!(
        vertices_before = line.len(),
        vertices_after = geometry.len(),
        constraints = constraints.len(),
        parts = parts.len(),
        hausdorff = validation.distance,
        ?status,
        "generalized contour",
    );

    let result = SimplificationResult {
        vertices_before: line.len(),
        vertices_after: geometry.len(),
        geometry,
        hausdorff_distance: validation.distance,
        accepted: validation.accepted,
        status,
        constraint_count: constraints.len(),
    };
    Ok(StagedFeature {
        constraints,
        parts,
        simplified_parts,
        candidate: Some(candidate),
        result,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(points: &[(f64, f64)]) -> Polyline {
        Polyline::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    fn config(tolerance: f64, hausdorff_limit: f64) -> SimplifyConfig {
        SimplifyConfig {
            tolerance,
            hausdorff_limit,
            ..SimplifyConfig::default()
        }
    }

    #[test]
    fn degenerate_input_fails_fast() {
        let network = ReferenceNetwork::new(&[]);
        let result = simplify_feature(&line(&[(1.0, 1.0)]), &network, &SimplifyConfig::default());
        assert_eq!(
            result,
            Err(PipelineError::DegenerateInput { vertex_count: 1 })
        );
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let network = ReferenceNetwork::new(&[]);
        let input = line(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]);
        let result = simplify_feature(&input, &network, &config(-1.0, 1.0));
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn invalid_limit_is_rejected_before_geometry() {
        let network = ReferenceNetwork::new(&[]);
        let result = simplify_feature(&line(&[(1.0, 1.0)]), &network, &config(1.0, f64::NAN));
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn shared_stretch_keeps_only_its_ends() {
        let network = ReferenceNetwork::new(&[line(&[(2.0, 0.0), (6.0, 0.0), (10.0, 0.0)])]);
        let input = line(&[(0.0, 0.0), (4.0, 0.0), (6.0, 0.0), (8.0, 0.0), (20.0, 0.0)]);
        let result = simplify_feature(&input, &network, &config(1.0, 1.0)).unwrap();
        assert_eq!(result.constraint_count, 2);
        assert_eq!(
            result.geometry,
            line(&[(0.0, 0.0), (2.0, 0.0), (10.0, 0.0), (20.0, 0.0)])
        );
        assert!(result.accepted);
    }

    #[test]
    fn unconstrained_line_collapses() {
        let network = ReferenceNetwork::new(&[]);
        let input = line(&[(0.0, 0.0), (5.0, 0.1), (10.0, 0.0)]);
        let result = simplify_feature(&input, &network, &config(1.0, 1.0)).unwrap();
        assert_eq!(result.geometry, line(&[(0.0, 0.0), (10.0, 0.0)]));
        assert!(result.accepted);
        assert_eq!(result.status, FeatureStatus::Simplified);
        assert_eq!(result.vertices_before, 3);
        assert_eq!(result.vertices_after, 2);
        assert_eq!(result.constraint_count, 0);
        assert!((result.hausdorff_distance - 0.1).abs() < 1e-9);
    }

    #[test]
    fn crossing_on_middle_vertex_is_preserved() {
        let network = ReferenceNetwork::new(&[line(&[(5.0, -5.0), (5.0, 0.1)])]);
        let input = line(&[(0.0, 0.0), (5.0, 0.1), (10.0, 0.0)]);
        let staged = simplify_feature_staged(&input, &network, &config(1.0, 1.0)).unwrap();
        assert_eq!(staged.constraints.len(), 1);
        assert_eq!(staged.parts.len(), 2);
        assert!(staged.parts.iter().all(|p| p.len() == 2));
        assert_eq!(staged.result.geometry, input);
        assert!(staged.result.accepted);
        assert!(staged.result.hausdorff_distance.abs() < 1e-12);
    }

    #[test]
    fn zigzag_rejected_keeps_original() {
        let network = ReferenceNetwork::new(&[]);
        let input = line(&[(0.0, 0.0), (-80.0, 0.0), (40.0, 30.0), (100.0, 0.0)]);
        let result = simplify_feature(&input, &network, &config(50.0, 10.0)).unwrap();
        assert!(!result.accepted);
        assert_eq!(result.status, FeatureStatus::Rejected);
        assert_eq!(result.geometry, input);
        assert!((result.hausdorff_distance - 80.0).abs() < 1e-9);
        assert_eq!(result.vertices_after, 4);
    }

    #[test]
    fn collapsed_ring_falls_back() {
        // A tiny closed ring: the chord is zero-length and every vertex is
        // within tolerance, so only the repeated start vertex survives.
        let network = ReferenceNetwork::new(&[]);
        let input = line(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        let staged = simplify_feature_staged(&input, &network, &config(10.0, 10.0)).unwrap();
        assert!(staged.candidate.is_none());
        assert_eq!(staged.result.status, FeatureStatus::Degenerate);
        assert!(!staged.result.accepted);
        assert!(staged.result.hausdorff_distance.abs() < f64::EPSILON);
        assert_eq!(staged.result.geometry, input);
    }

    #[test]
    fn crossing_inside_segment_becomes_exact_vertex() {
        let network = ReferenceNetwork::new(&[line(&[(25.0, -10.0), (25.0, 10.0)])]);
        let input = line(&[
            (0.0, 0.0),
            (10.0, 0.5),
            (20.0, -0.5),
            (30.0, 0.5),
            (40.0, 0.0),
        ]);
        let staged = simplify_feature_staged(&input, &network, &config(2.0, 2.0)).unwrap();
        let crossing = staged.constraints.to_points()[0];
        assert!(staged.result.accepted);
        assert!(
            staged
                .result
                .geometry
                .points()
                .iter()
                .any(|p| p.bit_eq(crossing))
        );
        assert_eq!(staged.result.vertices_after, 3);
    }
}
