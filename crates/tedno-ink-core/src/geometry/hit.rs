//! Inclusion tests against outline polygons.

use kurbo::{Point, Rect};

/// Even-odd ray casting test.
///
/// Polygons with fewer than three vertices contain nothing. Horizontal edges
/// never count as crossings; `f64::EPSILON` in the denominator keeps the
/// intersection stable when two vertices share a `y`.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for (i, pi) in polygon.iter().enumerate() {
        let pj = polygon[j];
        if (pi.y > point.y) != (pj.y > point.y) {
            let x_cross = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y + f64::EPSILON) + pi.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Axis-aligned bounds of a polygon, `None` when it has no vertices.
pub fn polygon_bounds(polygon: &[Point]) -> Option<Rect> {
    let first = polygon.first()?;
    let rect = polygon
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p));
    Some(rect)
}
