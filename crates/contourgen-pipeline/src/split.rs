//! Constrained splitting: cut a contour into sub-lines at its
//! hydrography crossings so each crossing becomes a shared endpoint that
//! simplification cannot remove.
//!
//! Splitting is a fold over the constraint points: each point maps the
//! current list of sub-lines to a new list. Concatenating the result in
//! order walks the original vertex path, with crossings that fell inside
//! a segment added as new vertices.

use crate::geometry::locate;
use crate::network::ConstraintPointSet;
use crate::types::{Point, Polyline};

/// Split `line` at every point of `constraints`.
///
/// Sub-lines with fewer than 2 vertices are discarded. A point that
/// touches several sub-lines (e.g. an existing split vertex) only affects
/// the first of them in traversal order, and is a no-op when it falls on
/// that sub-line's start or end vertex.
#[must_use = "returns the split sub-lines"]
pub fn split_at_points(
    line: &Polyline,
    constraints: &ConstraintPointSet,
    tolerance: f64,
) -> Vec<Polyline> {
    let initial = if line.len() >= 2 {
        vec![line.clone()]
    } else {
        Vec::new()
    };
    constraints
        .iter()
        .fold(initial, |parts, point| split_parts(parts, point, tolerance))
}

/// One fold step: split the first sub-line coincident with `point`.
fn split_parts(parts: Vec<Polyline>, point: Point, tolerance: f64) -> Vec<Polyline> {
    let target = parts.iter().position(|part| {
        locate(point, part).is_some_and(|location| location.distance < tolerance)
    });
    let Some(target) = target else {
        tracing::trace!(x = point.x, y = point.y, "constraint point touches no sub-line");
        return parts;
    };

    let mut out = Vec::with_capacity(parts.len() + 1);
    for (i, part) in parts.into_iter().enumerate() {
        if i == target {
            out.extend(split_one(&part, point, tolerance));
        } else {
            out.push(part);
        }
    }
    out
}

/// Split a single sub-line in two at `point`.
///
/// When `point` is within `tolerance` of an existing vertex the split
/// happens at that vertex; otherwise `point` is inserted into the nearest
/// segment with its exact coordinates. Halves shorter than 2 vertices are
/// dropped, so splitting at an endpoint returns the line unchanged.
fn split_one(part: &Polyline, point: Point, tolerance: f64) -> Vec<Polyline> {
    let Some(location) = locate(point, part) else {
        return vec![part.clone()];
    };
    let points = part.points();
    let start = points[location.segment];
    let end = points[location.segment + 1];

    let (head, tail): (Vec<Point>, Vec<Point>) = if start.distance(point) < tolerance {
        let k = location.segment;
        (points[..=k].to_vec(), points[k..].to_vec())
    } else if end.distance(point) < tolerance {
        let k = location.segment + 1;
        (points[..=k].to_vec(), points[k..].to_vec())
    } else {
        let mut head = points[..=location.segment].to_vec();
        head.push(point);
        let mut tail = Vec::with_capacity(points.len() - location.segment);
        tail.push(point);
        tail.extend_from_slice(&points[location.segment + 1..]);
        (head, tail)
    };

    [head, tail]
        .into_iter()
        .filter(|half| half.len() >= 2)
        .map(Polyline::new)
        .collect()
}
