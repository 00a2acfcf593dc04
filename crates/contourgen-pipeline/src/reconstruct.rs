//! Reassemble simplified sub-lines into one contour and snap it onto the
//! hydrography crossings.
//!
//! Snapping makes every constraint point a bit-exact vertex of the
//! output, so downstream "does the contour touch the river" checks pass
//! without a tolerance.

use crate::geometry::locate;
use crate::network::ConstraintPointSet;
use crate::types::{PipelineError, Point, Polyline};

/// Concatenate `parts` and snap the result onto `constraints`.
///
/// The shared boundary vertex between consecutive parts is emitted once.
/// For each constraint point, the nearest vertex within `tolerance` is
/// replaced by the point's exact coordinates; when no vertex is close
/// enough but the line passes within `tolerance`, the point is inserted
/// into the nearest segment.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateReconstruction`] when the result has
/// fewer than 2 distinct vertices.
pub fn reconstruct(
    parts: &[Polyline],
    constraints: &ConstraintPointSet,
    tolerance: f64,
) -> Result<Polyline, PipelineError> {
    let joined = concatenate(parts);
    let snapped = constraints
        .iter()
        .fold(joined, |points, c| snap_point(points, c, tolerance));
    let line = Polyline::new(snapped).dedup_consecutive();

    if line.len() < 2 {
        return Err(PipelineError::DegenerateReconstruction {
            vertex_count: line.len(),
        });
    }
    Ok(line)
}

/// Join vertex sequences, dropping bit-identical consecutive vertices.
fn concatenate(parts: &[Polyline]) -> Vec<Point> {
    let capacity = parts.iter().map(Polyline::len).sum();
    let mut points: Vec<Point> = Vec::with_capacity(capacity);
    for part in parts {
        for &p in part.points() {
            if points.last().is_none_or(|last| !last.bit_eq(p)) {
                points.push(p);
            }
        }
    }
    points
}

/// Make `c` an exact vertex of `points` if it lies within `tolerance`.
fn snap_point(mut points: Vec<Point>, c: Point, tolerance: f64) -> Vec<Point> {
    let nearest = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.distance(c)))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    match nearest {
        Some((i, d)) if d < tolerance => {
            let old = points[i];
            if !old.bit_eq(c) {
                tracing::trace!(x = c.x, y = c.y, offset = d, "snapping vertex to constraint");
                // Repeated copies move together so closed rings stay closed.
                for p in points.iter_mut().filter(|p| p.bit_eq(old)) {
                    *p = c;
                }
            }
            points
        }
        _ => {
            let line = Polyline::new(points);
            match locate(c, &line) {
                Some(location) if location.distance < tolerance => {
                    tracing::trace!(x = c.x, y = c.y, "inserting missing constraint vertex");
                    let mut points = line.into_points();
                    points.insert(location.segment + 1, c);
                    points
                }
                _ => line.into_points(),
            }
        }
    }
}
