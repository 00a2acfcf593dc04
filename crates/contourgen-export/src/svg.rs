//! Diagnostic SVG overlay.
//!
//! Draws the hydrography network, the original contours, the
//! generalized contours, and the pinned crossings on top of each other
//! so a reviewer can see at a glance where a contour was held in place
//! and how far the generalized line strays from the original.
//!
//! Map coordinates (y up) are shifted to the bounding box origin and
//! flipped into SVG space (y down). Shifting first keeps large projected
//! coordinates within the `f32` precision the [`svg`] crate formats with.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Element, Group, Path, Rectangle, Title};
use svg::node::{Node, Text, Value};

use contourgen_pipeline::{Point, Polyline};

/// Crossing marker radius as a fraction of the larger drawing extent.
const MARKER_RADIUS_FRACTION: f64 = 0.004;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped by the `svg`
/// crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized `SimplifyConfig`, embedded in a `<metadata>` element so
    /// the overlay records the parameters that produced it.
    pub config_json: Option<&'a str>,
}

/// The geometry drawn by [`to_overlay_svg`], bottom layer first.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayLayers<'a> {
    /// Reference network lines (blue).
    pub hydrography: &'a [Polyline],
    /// Input contours (grey).
    pub originals: &'a [Polyline],
    /// Output contours (red).
    pub generalized: &'a [Polyline],
    /// Pinned crossings (black dots).
    pub constraint_points: &'a [Point],
}

impl OverlayLayers<'_> {
    fn all_points(&self) -> impl Iterator<Item = &Point> {
        self.hydrography
            .iter()
            .chain(self.originals)
            .chain(self.generalized)
            .flat_map(Polyline::points)
            .chain(self.constraint_points)
    }
}

/// Axis-aligned extent of the drawing in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min_x: f64,
    max_y: f64,
    width: f64,
    height: f64,
}

impl Bounds {
    fn of<'p>(points: impl Iterator<Item = &'p Point>) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = points.fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
        );
        if min_x > max_x {
            return None;
        }
        // A single point or a perfectly straight axis-aligned drawing
        // would give a zero-area viewBox.
        Some(Self {
            min_x,
            max_y,
            width: (max_x - min_x).max(1.0),
            height: (max_y - min_y).max(1.0),
        })
    }

    /// Map coordinates to SVG user space.
    fn project(&self, p: Point) -> (f64, f64) {
        (p.x - self.min_x, self.max_y - p.y)
    }
}

/// Build the `d` attribute for one polyline, or `None` when it has fewer
/// than 2 points.
fn path_data(polyline: &Polyline, bounds: &Bounds) -> Option<String> {
    let (first, rest) = polyline.points().split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut data = Data::new().move_to(bounds.project(*first));
    for &p in rest {
        data = data.line_to(bounds.project(p));
    }
    Some(String::from(Value::from(data)))
}

/// One `<g>` of stroked paths.
fn polyline_group(id: &str, polylines: &[Polyline], bounds: &Bounds, stroke: &str) -> Group {
    polylines
        .iter()
        .filter_map(|polyline| path_data(polyline, bounds))
        .fold(
            Group::new()
                .set("id", id)
                .set("fill", "none")
                .set("stroke", stroke)
                .set("stroke-width", 1)
                .set("vector-effect", "non-scaling-stroke"),
            |group, d| {
                group.add(
                    Path::new()
                        .set("d", d)
                        .set("vector-effect", "non-scaling-stroke"),
                )
            },
        )
}

/// Serialize an overlay of hydrography, original contours, generalized
/// contours, and crossings into an SVG document string.
///
/// The `viewBox` spans the bounding box of every layer. Polylines with
/// fewer than 2 points are skipped. An overlay with no geometry at all
/// produces a valid, empty 1x1 document.
///
/// # Examples
///
/// ```
/// use contourgen_pipeline::{Point, Polyline};
/// use contourgen_export::{OverlayLayers, SvgMetadata, to_overlay_svg};
///
/// let original = vec![Polyline::new(vec![
///     Point::new(0.0, 0.0),
///     Point::new(5.0, 0.1),
///     Point::new(10.0, 0.0),
/// ])];
/// let layers = OverlayLayers {
///     originals: &original,
///     ..OverlayLayers::default()
/// };
/// let metadata = SvgMetadata {
///     title: Some("contours-20m"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_overlay_svg(&layers, &metadata);
/// assert!(svg.contains("<title>contours-20m</title>"));
/// assert!(svg.contains("M0,0.1 L5,0 L10,0.1"));
/// ```
#[must_use]
pub fn to_overlay_svg(layers: &OverlayLayers<'_>, metadata: &SvgMetadata<'_>) -> String {
    let bounds = Bounds::of(layers.all_points()).unwrap_or(Bounds {
        min_x: 0.0,
        max_y: 0.0,
        width: 1.0,
        height: 1.0,
    });

    let mut doc = Document::new()
        .set("viewBox", (0, 0, bounds.width, bounds.height))
        .set("preserveAspectRatio", "xMidYMid meet");

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }
    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("contourgen:config");
        config_el.assign("xmlns:contourgen", "urn:contourgen:config:1");
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    doc = doc
        .add(
            Rectangle::new()
                .set("width", bounds.width)
                .set("height", bounds.height)
                .set("fill", "white"),
        )
        .add(polyline_group("hydrography", layers.hydrography, &bounds, "#1f77b4"))
        .add(polyline_group("original", layers.originals, &bounds, "#999999"))
        .add(polyline_group("generalized", layers.generalized, &bounds, "#d62728"));

    let radius = bounds.width.max(bounds.height) * MARKER_RADIUS_FRACTION;
    let crossings = layers.constraint_points.iter().fold(
        Group::new().set("id", "crossings").set("fill", "black"),
        |group, &p| {
            let (cx, cy) = bounds.project(p);
            group.add(
                Circle::new()
                    .set("cx", cx)
                    .set("cy", cy)
                    .set("r", radius),
            )
        },
    );
    doc = doc.add(crossings);

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[(f64, f64)]) -> Polyline {
        Polyline::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn empty_overlay_is_valid_document() {
        let svg = to_overlay_svg(&OverlayLayers::default(), &SvgMetadata::default());
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("viewBox=\"0 0 1 1\""));
        assert!(!svg.contains("<path"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn y_axis_is_flipped() {
        let original = [line(&[(100.0, 200.0), (110.0, 210.0)])];
        let layers = OverlayLayers {
            originals: &original,
            ..OverlayLayers::default()
        };
        let svg = to_overlay_svg(&layers, &SvgMetadata::default());
        // Top of the map (y = 210) is the top of the drawing (y = 0).
        assert!(svg.contains("M0,10 L10,0"), "{svg}");
    }

    #[test]
    fn every_layer_gets_a_group() {
        let hydro = [line(&[(5.0, -5.0), (5.0, 5.0)])];
        let original = [line(&[(0.0, 0.0), (5.0, 1.0), (10.0, 0.0)])];
        let generalized = [line(&[(0.0, 0.0), (10.0, 0.0)])];
        let crossings = [Point::new(5.0, 0.0)];
        let layers = OverlayLayers {
            hydrography: &hydro,
            originals: &original,
            generalized: &generalized,
            constraint_points: &crossings,
        };
        let svg = to_overlay_svg(&layers, &SvgMetadata::default());
        for id in ["hydrography", "original", "generalized", "crossings"] {
            assert!(svg.contains(&format!("id=\"{id}\"")), "missing layer {id}");
        }
        assert_eq!(svg.matches("<path").count(), 3);
        assert_eq!(svg.matches("<circle").count(), 1);
    }

    #[test]
    fn single_point_polylines_are_skipped() {
        let original = [line(&[(1.0, 1.0)])];
        let layers = OverlayLayers {
            originals: &original,
            ..OverlayLayers::default()
        };
        let svg = to_overlay_svg(&layers, &SvgMetadata::default());
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn metadata_is_escaped_and_embedded() {
        let metadata = SvgMetadata {
            title: Some("Rio <Doce>"),
            description: Some("tolerance & limit"),
            config_json: Some(r#"{"tolerance":10.0}"#),
        };
        let svg = to_overlay_svg(&OverlayLayers::default(), &metadata);
        assert!(svg.contains("<title>Rio &lt;Doce&gt;</title>"));
        assert!(svg.contains("<desc>tolerance &amp; limit</desc>"));
        assert!(svg.contains("<metadata>"));
        assert!(svg.contains("xmlns:contourgen=\"urn:contourgen:config:1\""));
    }
}
