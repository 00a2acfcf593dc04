//! Reference network of hydrography segments and the contour/network
//! intersection query that produces constraint points.
//!
//! The network is built once per run and shared read-only between all
//! per-feature transforms. Segments live in an R\*-tree so each contour
//! segment only tests hydrography segments whose envelope overlaps it.

use geo::kernels::RobustKernel;
use geo::line_intersection::{LineIntersection, line_intersection};
use geo::{Kernel, Orientation};
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};
use serde::{Deserialize, Serialize};

use crate::geometry::{arc_position, coord_to_point, locate, segment_line};
use crate::types::{Point, Polyline};

/// Identifies a segment of the network: segment `segment_idx` of input
/// line `line_idx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSegmentId {
    /// Index of the source line passed to [`ReferenceNetwork::new`].
    pub line_idx: usize,
    /// Segment index within that line.
    pub segment_idx: usize,
}

/// A `geo::Line` tagged with its [`NetworkSegmentId`].
type IndexedSegment = GeomWithData<geo::Line<f64>, NetworkSegmentId>;

/// What to do when a contour runs along a hydrography line for a stretch
/// instead of crossing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Pin both ends of the shared stretch.
    #[default]
    Endpoints,
    /// Ignore collinear overlaps; only point crossings constrain.
    Ignore,
}

/// Union of all hydrography segments, queried read-only.
#[derive(Debug, Clone)]
pub struct ReferenceNetwork {
    tree: RTree<IndexedSegment>,
}

impl ReferenceNetwork {
    /// Build the network from a collection of hydrography lines.
    ///
    /// Zero-length segments are skipped; lines with fewer than 2
    /// vertices contribute nothing.
    #[must_use]
    pub fn new(lines: &[Polyline]) -> Self {
        let segments: Vec<IndexedSegment> = lines
            .iter()
            .enumerate()
            .flat_map(|(line_idx, line)| {
                line.points()
                    .windows(2)
                    .enumerate()
                    .filter(|(_, w)| !w[0].bit_eq(w[1]))
                    .map(move |(segment_idx, w)| {
                        GeomWithData::new(
                            segment_line(w[0], w[1]),
                            NetworkSegmentId {
                                line_idx,
                                segment_idx,
                            },
                        )
                    })
            })
            .collect();
        tracing::debug!(segments = segments.len(), "built reference network");
        Self {
            tree: RTree::bulk_load(segments),
        }
    }

    /// Number of segments in the network.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the network has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Iterate over all network segments as `(start, end)` pairs.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.tree
            .iter()
            .map(|s| (coord_to_point(s.geom().start), coord_to_point(s.geom().end)))
    }

    /// Points where `line` meets the network.
    ///
    /// Proper crossings and touches yield one point each. Where `line`
    /// runs along the network, the collinear pieces found per segment
    /// pair are merged into maximal stretches along `line` and handled
    /// according to `policy`. The result is ordered along `line` with
    /// near-duplicates (within `tolerance`) collapsed.
    #[must_use]
    pub fn intersections(
        &self,
        line: &Polyline,
        tolerance: f64,
        policy: OverlapPolicy,
    ) -> ConstraintPointSet {
        let mut found = Vec::new();
        let mut overlaps = Vec::new();
        let mut offset = 0.0;
        for w in line.points().windows(2) {
            let contour_segment = segment_line(w[0], w[1]);
            let at = |c: geo::Coord<f64>| {
                let p = coord_to_point(c);
                (offset + w[0].distance(p), p)
            };
            let envelope = AABB::from_corners(
                geo::Point::new(w[0].x.min(w[1].x) - tolerance, w[0].y.min(w[1].y) - tolerance),
                geo::Point::new(w[0].x.max(w[1].x) + tolerance, w[0].y.max(w[1].y) + tolerance),
            );
            for candidate in self.tree.locate_in_envelope_intersecting(&envelope) {
                let stream_segment = *candidate.geom();
                match line_intersection(contour_segment, stream_segment) {
                    // Collinear segments meeting end to end report a single
                    // improper point; it may continue a longer stretch.
                    Some(LineIntersection::SinglePoint {
                        intersection,
                        is_proper: false,
                    }) if is_collinear(contour_segment, stream_segment) => {
                        let touch = at(intersection);
                        overlaps.push(Overlap::new(touch, touch));
                    }
                    Some(LineIntersection::SinglePoint { intersection, .. }) => {
                        found.push(coord_to_point(intersection));
                    }
                    Some(LineIntersection::Collinear { intersection }) => {
                        overlaps.push(Overlap::new(at(intersection.start), at(intersection.end)));
                    }
                    None => {}
                }
            }
            offset += w[0].distance(w[1]);
        }

        for overlap in merge_overlaps(overlaps, tolerance) {
            if overlap.end_at - overlap.start_at < tolerance {
                found.push(overlap.start);
                continue;
            }
            match policy {
                OverlapPolicy::Endpoints => {
                    found.push(overlap.start);
                    found.push(overlap.end);
                }
                OverlapPolicy::Ignore => {
                    tracing::trace!(
                        from = overlap.start_at,
                        to = overlap.end_at,
                        "ignoring collinear overlap"
                    );
                }
            }
        }
        ConstraintPointSet::along(line, found, tolerance)
    }
}

/// Whether both segments lie on the same supporting line.
fn is_collinear(a: geo::Line<f64>, b: geo::Line<f64>) -> bool {
    matches!(
        RobustKernel::orient2d(a.start, a.end, b.start),
        Orientation::Collinear
    ) && matches!(
        RobustKernel::orient2d(a.start, a.end, b.end),
        Orientation::Collinear
    )
}

/// A stretch where a contour runs along the network, as arc positions
/// along the contour and the points at either end.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Overlap {
    start_at: f64,
    start: Point,
    end_at: f64,
    end: Point,
}

impl Overlap {
    fn new(a: (f64, Point), b: (f64, Point)) -> Self {
        let ((start_at, start), (end_at, end)) = if a.0 <= b.0 { (a, b) } else { (b, a) };
        Self {
            start_at,
            start,
            end_at,
            end,
        }
    }
}

/// Merge overlaps that touch or overlap along the contour (within
/// `tolerance`) into maximal stretches, ordered by start position.
fn merge_overlaps(mut overlaps: Vec<Overlap>, tolerance: f64) -> Vec<Overlap> {
    overlaps.sort_by(|a, b| a.start_at.total_cmp(&b.start_at));
    let mut merged: Vec<Overlap> = Vec::with_capacity(overlaps.len());
    for overlap in overlaps {
        match merged.last_mut() {
            Some(last) if overlap.start_at <= last.end_at + tolerance => {
                if overlap.end_at > last.end_at {
                    last.end_at = overlap.end_at;
                    last.end = overlap.end;
                }
            }
            _ => merged.push(overlap),
        }
    }
    merged
}

/// A constraint point together with its position along the contour.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Located {
    point: Point,
    position: f64,
}

/// Points that must survive simplification as exact vertices.
///
/// Ordered by arc-length position along the line they were derived from,
/// so splits are reproducible regardless of discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintPointSet {
    entries: Vec<Located>,
}

impl ConstraintPointSet {
    /// An empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Order `points` along `line` and collapse near-duplicates.
    ///
    /// Points farther than `tolerance` from `line` are dropped since they
    /// cannot be represented on it. Of several points within `tolerance`
    /// of each other, the first one along the line is kept.
    #[must_use]
    pub fn along(line: &Polyline, points: impl IntoIterator<Item = Point>, tolerance: f64) -> Self {
        let mut entries: Vec<Located> = points
            .into_iter()
            .filter_map(|point| {
                let location = locate(point, line)?;
                (location.distance < tolerance).then(|| Located {
                    point,
                    position: arc_position(line, &location),
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            a.position
                .total_cmp(&b.position)
                .then(a.point.x.total_cmp(&b.point.x))
                .then(a.point.y.total_cmp(&b.point.y))
        });

        let mut kept: Vec<Located> = Vec::with_capacity(entries.len());
        for entry in entries {
            if kept
                .iter()
                .all(|k| k.point.distance(entry.point) >= tolerance)
            {
                kept.push(entry);
            }
        }
        Self { entries: kept }
    }

    /// Number of constraint points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no constraint points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the points in order along the line.
    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        self.entries.iter().map(|e| e.point)
    }

    /// Collect the points in order along the line.
    #[must_use]
    pub fn to_points(&self) -> Vec<Point> {
        self.iter().collect()
    }
}
