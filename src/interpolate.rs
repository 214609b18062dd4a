//! Planar interpolation over scattered sensor values.
//!
//! Longitude and latitude are treated as plane coordinates, which is fine
//! across a sensor neighborhood and wrong across a continent; callers keep
//! the point set local. The estimate at a query point comes from the
//! smallest triangle of candidate points that encloses it: enumerate every
//! triple, test containment, keep the smallest containing triangle, and
//! blend its vertex values barycentrically (each vertex weighted by the
//! area of the sub-triangle opposite it).
//!
//! The containment test is the dot-product barycentric method from
//! [Blackpawn's "Point in Triangle"](https://blackpawn.com/texts/pointinpoly/).

use crate::Error;

/// A measurement pinned to a plane location: value `v` sampled at
/// `(x, y)`. For sensor readings, x is longitude and y is latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuedPoint {
    pub x: f64,
    pub y: f64,
    pub v: f64,
}

impl ValuedPoint {
    pub fn new(x: f64, y: f64, v: f64) -> Self {
        ValuedPoint { x, y, v }
    }

    fn pos(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Triangle area by the shoelace formula.
fn triangle_area(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (((a.0 - c.0) * (b.1 - a.1) - (a.0 - b.0) * (c.1 - a.1)) * 0.5).abs()
}

/// Barycentric containment test for `(x, y)` against triangle `abc`.
///
/// The test is asymmetric on purpose: the edges adjacent to `a` count as
/// inside (`u >= 0`, `v >= 0`) while the far edge does not (`u + v < 1`,
/// strictly). A point exactly on a shared far edge is therefore inside
/// neither adjacent triangle. A degenerate (collinear) triangle has a
/// singular Gram matrix and contains nothing.
fn contains(x: f64, y: f64, a: ValuedPoint, b: ValuedPoint, c: ValuedPoint) -> bool {
    let v0 = (c.x - a.x, c.y - a.y);
    let v1 = (b.x - a.x, b.y - a.y);
    let v2 = (x - a.x, y - a.y);

    let dot00 = v0.0 * v0.0 + v0.1 * v0.1;
    let dot01 = v0.0 * v1.0 + v0.1 * v1.1;
    let dot02 = v0.0 * v2.0 + v0.1 * v2.1;
    let dot11 = v1.0 * v1.0 + v1.1 * v1.1;
    let dot12 = v1.0 * v2.0 + v1.1 * v2.1;

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom == 0.0 {
        return false;
    }

    let u = (dot11 * dot02 - dot01 * dot12) / denom;
    let v = (dot00 * dot12 - dot01 * dot02) / denom;
    u >= 0.0 && v >= 0.0 && u + v < 1.0
}

/// Find the smallest triangle of `points` enclosing `(x, y)`.
///
/// Triples are enumerated in nested index order (i < j < k over the input
/// sequence), and an area tie keeps the first triple found, so the winner
/// is deterministic for a fixed input order. Zero-area triangles never
/// rank. Returns the winning vertex indexes.
fn enclosing_triangle(x: f64, y: f64, points: &[ValuedPoint]) -> Option<[usize; 3]> {
    let mut smallest: Option<([usize; 3], f64)> = None;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            for k in (j + 1)..points.len() {
                let (a, b, c) = (points[i], points[j], points[k]);
                if !contains(x, y, a, b, c) {
                    continue;
                }
                let area = triangle_area(a.pos(), b.pos(), c.pos());
                if area == 0.0 {
                    continue;
                }
                match smallest {
                    Some((_, best)) if area >= best => {}
                    _ => smallest = Some(([i, j, k], area)),
                }
            }
        }
    }
    smallest.map(|(triple, _)| triple)
}

/// Value at `(x, y)` interpolated from the smallest enclosing triangle.
///
/// The result is the area-weighted blend of the winning triangle's vertex
/// values, so it always lies between their minimum and maximum. Fewer than
/// three points is [`Error::InsufficientData`]: selection upstream was
/// misconfigured. No enclosing triangle is [`Error::NoEnclosingTriangle`],
/// a normal outcome for a query at the sparse edge of the network; callers
/// choose whether to treat it as fatal or fall back to a nearest-only
/// estimate as [`crate::estimate::estimate`] does.
pub fn interpolate(x: f64, y: f64, points: &[ValuedPoint]) -> Result<f64, Error> {
    if points.len() < 3 {
        return Err(Error::InsufficientData(
            "interpolation needs at least 3 points",
        ));
    }
    let [i, j, k] = enclosing_triangle(x, y, points).ok_or(Error::NoEnclosingTriangle)?;
    let (a, b, c) = (points[i], points[j], points[k]);

    let area = triangle_area(a.pos(), b.pos(), c.pos());
    let weight_a = triangle_area((x, y), b.pos(), c.pos());
    let weight_b = triangle_area(a.pos(), (x, y), c.pos());
    let weight_c = triangle_area(a.pos(), b.pos(), (x, y));
    Ok((weight_a * a.v + weight_b * b.v + weight_c * c.v) / area)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_a_triangle_blends_the_vertex_values() {
        let points = [
            ValuedPoint::new(0.0, 0.0, 1.0),
            ValuedPoint::new(1.0, 0.0, 5.0),
            ValuedPoint::new(0.0, 1.0, 9.0),
        ];
        // (0.25, 0.25) has barycentric weights (0.5, 0.25, 0.25).
        let v = interpolate(0.25, 0.25, &points).unwrap();
        assert!((v - 4.0).abs() < 1e-12, "got {v}");
    }

    #[test]
    fn result_is_convex_in_the_vertex_values() {
        let points = [
            ValuedPoint::new(-1.0, -1.0, 3.0),
            ValuedPoint::new(2.0, 0.0, 42.0),
            ValuedPoint::new(0.0, 2.0, 17.0),
        ];
        for (x, y) in [(0.0, 0.0), (0.5, 0.5), (-0.5, -0.5), (1.0, 0.25)] {
            let v = interpolate(x, y, &points).unwrap();
            assert!((3.0..=42.0).contains(&v), "({x}, {y}) gave {v}");
        }
    }

    #[test]
    fn unit_square_center_picks_the_first_of_the_tied_triangles() {
        // Four corners, two values. Of the four possible triangles, three
        // contain the center with equal area, and one excludes it (the
        // center sits on its far edge). First-found wins the tie.
        let points = [
            ValuedPoint::new(0.0, 0.0, 0.0),
            ValuedPoint::new(1.0, 0.0, 0.0),
            ValuedPoint::new(1.0, 1.0, 10.0),
            ValuedPoint::new(0.0, 1.0, 10.0),
        ];
        assert_eq!(enclosing_triangle(0.5, 0.5, &points), Some([0, 1, 2]));
        // Halfway along that triangle's 0 -> 10 diagonal.
        let v = interpolate(0.5, 0.5, &points).unwrap();
        assert!((v - 5.0).abs() < 1e-12, "got {v}");
    }

    #[test]
    fn smallest_containing_triangle_wins() {
        // A big triangle and a small one, both around the origin. The big
        // one comes first in enumeration order but must not win.
        let points = [
            ValuedPoint::new(-10.0, -10.0, 100.0),
            ValuedPoint::new(10.0, -10.0, 100.0),
            ValuedPoint::new(0.0, 10.0, 100.0),
            ValuedPoint::new(-1.0, -1.0, 1.0),
            ValuedPoint::new(1.0, -1.0, 2.0),
            ValuedPoint::new(0.0, 1.0, 3.0),
        ];
        assert_eq!(enclosing_triangle(0.0, 0.0, &points), Some([3, 4, 5]));
        let v = interpolate(0.0, 0.0, &points).unwrap();
        assert!((1.0..=3.0).contains(&v), "got {v}");
    }

    #[test]
    fn point_on_the_far_edge_is_outside() {
        // (0.5, 0.5) sits exactly on the far edge, where u + v == 1.
        let points = [
            ValuedPoint::new(0.0, 0.0, 1.0),
            ValuedPoint::new(1.0, 0.0, 2.0),
            ValuedPoint::new(0.0, 1.0, 3.0),
        ];
        let err = interpolate(0.5, 0.5, &points).unwrap_err();
        assert!(matches!(err, Error::NoEnclosingTriangle));
    }

    #[test]
    fn collinear_points_enclose_nothing() {
        let points = [
            ValuedPoint::new(0.0, 0.0, 1.0),
            ValuedPoint::new(1.0, 1.0, 2.0),
            ValuedPoint::new(2.0, 2.0, 3.0),
        ];
        let err = interpolate(1.0, 1.0, &points).unwrap_err();
        assert!(matches!(err, Error::NoEnclosingTriangle));
    }

    #[test]
    fn degenerate_triple_is_skipped_not_fatal() {
        // Points 0, 1, 2 are collinear; the triple with point 3 encloses.
        let points = [
            ValuedPoint::new(0.0, 0.0, 1.0),
            ValuedPoint::new(1.0, 1.0, 3.0),
            ValuedPoint::new(2.0, 2.0, 100.0),
            ValuedPoint::new(1.0, 0.0, 5.0),
        ];
        assert_eq!(enclosing_triangle(0.75, 0.5, &points), Some([0, 1, 3]));
        let v = interpolate(0.75, 0.5, &points).unwrap();
        assert!((1.0..=5.0).contains(&v), "got {v}");
    }

    #[test]
    fn query_outside_every_triangle() {
        let points = [
            ValuedPoint::new(0.0, 0.0, 1.0),
            ValuedPoint::new(1.0, 0.0, 2.0),
            ValuedPoint::new(0.0, 1.0, 3.0),
        ];
        let err = interpolate(5.0, 5.0, &points).unwrap_err();
        assert!(matches!(err, Error::NoEnclosingTriangle));
    }

    #[test]
    fn fewer_than_three_points_fails() {
        let points = [
            ValuedPoint::new(0.0, 0.0, 1.0),
            ValuedPoint::new(1.0, 0.0, 2.0),
        ];
        let err = interpolate(0.5, 0.1, &points).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }
}
