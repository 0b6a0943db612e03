//! Pixel-space geometry used by the region counter.

use crate::error::{Error, Result};

/// An integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        dx.hypot(dy)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for crate::cv::Point {
    fn from(p: Point) -> Self {
        crate::cv::Point::new(p.x, p.y)
    }
}

/// Distance from `p` to the infinite line through `p1` and `p2`.
///
/// The result is not clamped to the segment, so a point lying on the
/// extension of an edge reports zero. Returns `f64::INFINITY` when `p1 == p2`.
pub fn distance_point_to_segment(p1: Point, p2: Point, p: Point) -> f64 {
    let (x1, y1) = (p1.x as f64, p1.y as f64);
    let (x2, y2) = (p2.x as f64, p2.y as f64);
    let (x, y) = (p.x as f64, p.y as f64);

    let num = ((y2 - y1) * x - (x2 - x1) * y + x2 * y1 - y2 * x1).abs();
    let den = (y2 - y1).hypot(x2 - x1);
    if den == 0. {
        return f64::INFINITY;
    }
    num / den
}

/// Even-odd membership test. Points on an edge or vertex count as inside.
pub fn point_in_polygon(vertices: &[Point], p: Point) -> bool {
    let n = vertices.len();
    if n == 0 {
        return false;
    }

    for i in 0..n {
        if on_segment(vertices[i], vertices[(i + 1) % n], p) {
            return true;
        }
    }
    if n < 3 {
        return false;
    }

    let (px, py) = (p.x as f64, p.y as f64);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (vertices[i].x as f64, vertices[i].y as f64);
        let (xj, yj) = (vertices[j].x as f64, vertices[j].y as f64);
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    let (ax, ay) = (a.x as i64, a.y as i64);
    let (bx, by) = (b.x as i64, b.y as i64);
    let (px, py) = (p.x as i64, p.y as i64);

    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    cross == 0
        && px >= ax.min(bx)
        && px <= ax.max(bx)
        && py >= ay.min(by)
        && py <= ay.max(by)
}

/// Twice the signed area of the closed polygon.
fn doubled_area(vertices: &[Point]) -> i64 {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let (a, b) = (vertices[i], vertices[(i + 1) % n]);
            a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
        })
        .sum()
}

/// Area-weighted centroid of a closed polygon, truncated to whole pixels.
///
/// Fails with [`Error::DegenerateGeometry`] when the polygon encloses no
/// area, which covers fewer than three vertices and collinear outlines.
pub fn polygon_centroid(vertices: &[Point]) -> Result<Point> {
    let n = vertices.len();
    let a2 = doubled_area(vertices);
    if n < 3 || a2 == 0 {
        return Err(Error::DegenerateGeometry);
    }

    let (mut cx, mut cy) = (0i64, 0i64);
    for i in 0..n {
        let (a, b) = (vertices[i], vertices[(i + 1) % n]);
        let cross = a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
        cx += (a.x as i64 + b.x as i64) * cross;
        cy += (a.y as i64 + b.y as i64) * cross;
    }

    // m10 / m00 == cx / (3 * a2)
    let m00 = 3. * a2 as f64;
    Ok(Point::new(
        (cx as f64 / m00) as i32,
        (cy as f64 / m00) as i32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 100),
            Point::new(0, 100),
        ]
    }

    #[test]
    fn distance_is_perpendicular_to_the_line() {
        let d = distance_point_to_segment(Point::new(0, 0), Point::new(10, 0), Point::new(5, 3));
        assert!((d - 3.).abs() < 1e-9);
    }

    #[test]
    fn distance_is_not_clamped_to_the_segment() {
        let d = distance_point_to_segment(Point::new(0, 0), Point::new(10, 0), Point::new(50, 0));
        assert_eq!(d, 0.);
    }

    #[test]
    fn distance_to_a_collapsed_segment_is_infinite() {
        let p = Point::new(4, 4);
        assert!(distance_point_to_segment(p, p, Point::new(0, 0)).is_infinite());
    }

    #[test]
    fn interior_points_are_inside() {
        let sq = square();
        for p in [(1, 1), (50, 50), (99, 1), (10, 90)] {
            assert!(point_in_polygon(&sq, p.into()), "{p:?}");
        }
    }

    #[test]
    fn points_outside_the_bounding_box_are_outside() {
        let sq = square();
        for p in [(-1, 50), (101, 50), (50, -5), (50, 200), (900, 10)] {
            assert!(!point_in_polygon(&sq, p.into()), "{p:?}");
        }
    }

    #[test]
    fn boundary_counts_as_inside() {
        let sq = square();
        assert!(point_in_polygon(&sq, Point::new(0, 0)));
        assert!(point_in_polygon(&sq, Point::new(100, 40)));
        // closing edge
        assert!(point_in_polygon(&sq, Point::new(0, 60)));
    }

    #[test]
    fn concave_notch_is_outside() {
        let shape: Vec<Point> = [(0, 0), (100, 0), (100, 100), (50, 40), (0, 100)]
            .into_iter()
            .map(Point::from)
            .collect();
        assert!(!point_in_polygon(&shape, Point::new(50, 80)));
        assert!(point_in_polygon(&shape, Point::new(50, 20)));
    }

    #[test]
    fn short_polylines_contain_nothing_off_their_edge() {
        let line = [Point::new(0, 0), Point::new(10, 10)];
        assert!(!point_in_polygon(&line, Point::new(5, 0)));
        assert!(!point_in_polygon(&[], Point::new(0, 0)));
    }

    #[test]
    fn centroid_of_square() {
        assert_eq!(polygon_centroid(&square()).unwrap(), Point::new(50, 50));
    }

    #[test]
    fn centroid_ignores_winding() {
        let mut sq = square();
        sq.reverse();
        assert_eq!(polygon_centroid(&sq).unwrap(), Point::new(50, 50));
    }

    #[test]
    fn centroid_of_triangle() {
        let tri = [Point::new(0, 0), Point::new(90, 0), Point::new(0, 90)];
        assert_eq!(polygon_centroid(&tri).unwrap(), Point::new(30, 30));
    }

    #[test]
    fn collinear_polygon_is_degenerate() {
        let flat = [Point::new(0, 0), Point::new(5, 5), Point::new(10, 10)];
        assert!(matches!(
            polygon_centroid(&flat),
            Err(Error::DegenerateGeometry)
        ));
        assert!(polygon_centroid(&flat[..2]).is_err());
    }
}
