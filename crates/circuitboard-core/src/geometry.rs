//! Geometric algorithms: hit testing, edge anchoring, overlap and resize math.

use crate::scene::{
    MAX_NODE_SIZE, MIN_NODE_SIZE, MIN_STICKY_HEIGHT, MIN_STICKY_WIDTH, Node,
};
use kurbo::{ParamCurveNearest, Point, QuadBez, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// True iff `point` lies within the circle (boundary inclusive).
pub fn point_in_circle(point: Point, center: Point, radius: f64) -> bool {
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    dx * dx + dy * dy <= radius * radius
}

/// Anchor points where an edge between two nodes touches their circle
/// boundaries.
///
/// Each anchor is the node's center offset by its own radius along the unit
/// vector between the two centers, so the drawn segment touches both circles
/// regardless of their relative sizes. Computed from live positions on every
/// call; callers must not cache the result across moves.
pub fn edge_anchors(a: &Node, b: &Node) -> (Point, Point) {
    let ca = a.center();
    let cb = b.center();
    let v = cb - ca;
    let len = v.hypot();
    // Coincident centers: pick a stable axis rather than dividing by zero
    let unit = if len > 0.0 {
        v / len
    } else {
        Vec2::new(1.0, 0.0)
    };
    (ca + unit * a.radius(), cb - unit * b.radius())
}

/// Implicit control point of a straight edge: the midpoint of its anchors.
pub fn edge_midpoint(a: &Node, b: &Node) -> Point {
    let (pa, pb) = edge_anchors(a, b);
    Point::new((pa.x + pb.x) / 2.0, (pa.y + pb.y) / 2.0)
}

/// Strict interval-overlap test on both axes.
///
/// Partially covered rectangles qualify; mere edge contact does not. Used by
/// box-select so items only partly inside the marquee are still picked up.
pub fn rect_overlap(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Distance from `point` to the quadratic curve through `start`/`control`/`end`.
pub fn quad_distance(start: Point, control: Point, end: Point, point: Point) -> f64 {
    QuadBez::new(start, control, end)
        .nearest(point, 1e-3)
        .distance_sq
        .sqrt()
}

/// A corner of an axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::NorthWest,
        Corner::NorthEast,
        Corner::SouthWest,
        Corner::SouthEast,
    ];

    /// Position of this corner on a bounding rectangle.
    pub fn of(self, bounds: Rect) -> Point {
        match self {
            Corner::NorthWest => Point::new(bounds.x0, bounds.y0),
            Corner::NorthEast => Point::new(bounds.x1, bounds.y0),
            Corner::SouthWest => Point::new(bounds.x0, bounds.y1),
            Corner::SouthEast => Point::new(bounds.x1, bounds.y1),
        }
    }

    fn moves_west(self) -> bool {
        matches!(self, Corner::NorthWest | Corner::SouthWest)
    }

    fn moves_north(self) -> bool {
        matches!(self, Corner::NorthWest | Corner::NorthEast)
    }
}

/// Corner resize for a node: map a pointer delta onto a new `(position, size)`
/// holding the opposite corner fixed.
///
/// A node stays circular, so the new diameter is the larger of the two axis
/// projections. The size is clamped to its domain first and the position
/// shift is derived from the clamped value, so clamping never drags the
/// anchored corner.
pub fn resize_node(
    orig_position: Point,
    orig_size: f64,
    corner: Corner,
    delta: Vec2,
) -> (Point, f64) {
    let dx = if corner.moves_west() { -delta.x } else { delta.x };
    let dy = if corner.moves_north() { -delta.y } else { delta.y };
    let size = (orig_size + dx)
        .max(orig_size + dy)
        .clamp(MIN_NODE_SIZE, MAX_NODE_SIZE);

    let grow = orig_size - size;
    let position = Point::new(
        orig_position.x + if corner.moves_west() { grow } else { 0.0 },
        orig_position.y + if corner.moves_north() { grow } else { 0.0 },
    );
    (position, size)
}

/// Corner resize for a sticky note: independent width/height with the
/// opposite corner fixed, clamped to the minimum sticky dimensions.
pub fn resize_sticky(
    orig_position: Point,
    orig_width: f64,
    orig_height: f64,
    corner: Corner,
    delta: Vec2,
) -> (Point, f64, f64) {
    let dx = if corner.moves_west() { -delta.x } else { delta.x };
    let dy = if corner.moves_north() { -delta.y } else { delta.y };
    let width = (orig_width + dx).max(MIN_STICKY_WIDTH);
    let height = (orig_height + dy).max(MIN_STICKY_HEIGHT);

    let position = Point::new(
        orig_position.x
            + if corner.moves_west() {
                orig_width - width
            } else {
                0.0
            },
        orig_position.y
            + if corner.moves_north() {
                orig_height - height
            } else {
                0.0
            },
    );
    (position, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Color;

    fn node_at(x: f64, y: f64, size: f64) -> Node {
        let mut node = Node::new(Point::new(x, y), Color::default(), "n");
        node.size = size;
        node
    }

    #[test]
    fn test_point_in_circle() {
        let center = Point::new(50.0, 50.0);
        assert!(point_in_circle(Point::new(50.0, 50.0), center, 10.0));
        assert!(point_in_circle(Point::new(60.0, 50.0), center, 10.0));
        assert!(!point_in_circle(Point::new(60.1, 50.0), center, 10.0));
    }

    #[test]
    fn test_edge_anchors_exact_radius() {
        // Different sizes on purpose: each anchor uses its own radius
        let a = node_at(0.0, 0.0, 64.0);
        let b = node_at(300.0, 120.0, 140.0);
        let (pa, pb) = edge_anchors(&a, &b);

        let da = (pa - a.center()).hypot();
        let db = (pb - b.center()).hypot();
        assert!((da - a.radius()).abs() < 1e-9);
        assert!((db - b.radius()).abs() < 1e-9);
    }

    #[test]
    fn test_edge_anchors_point_towards_each_other() {
        let a = node_at(0.0, 0.0, 64.0);
        let b = node_at(200.0, 0.0, 64.0);
        let (pa, pb) = edge_anchors(&a, &b);
        // Horizontal pair: anchors sit on the facing rims
        assert!((pa.x - 64.0).abs() < 1e-9);
        assert!((pb.x - 200.0).abs() < 1e-9);
        assert!((pa.y - 32.0).abs() < 1e-9);
        assert!((pb.y - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_edge_anchors_coincident_centers() {
        let a = node_at(0.0, 0.0, 64.0);
        let b = node_at(0.0, 0.0, 64.0);
        let (pa, pb) = edge_anchors(&a, &b);
        assert!(((pa - a.center()).hypot() - a.radius()).abs() < 1e-9);
        assert!(((pb - b.center()).hypot() - b.radius()).abs() < 1e-9);
    }

    #[test]
    fn test_rect_overlap_partial() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(rect_overlap(a, Rect::new(50.0, 50.0, 150.0, 150.0)));
        assert!(rect_overlap(a, Rect::new(-10.0, -10.0, 5.0, 5.0)));
        // Containment also counts
        assert!(rect_overlap(a, Rect::new(25.0, 25.0, 75.0, 75.0)));
    }

    #[test]
    fn test_rect_overlap_disjoint_and_touching() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(!rect_overlap(a, Rect::new(200.0, 0.0, 300.0, 100.0)));
        // Shared edge is not overlap under the strict test
        assert!(!rect_overlap(a, Rect::new(100.0, 0.0, 200.0, 100.0)));
    }

    #[test]
    fn test_quad_distance_on_curve() {
        let d = quad_distance(
            Point::new(0.0, 0.0),
            Point::new(50.0, 100.0),
            Point::new(100.0, 0.0),
            Point::new(50.0, 50.0),
        );
        // The curve apex is at (50, 50)
        assert!(d < 1e-3);
    }

    #[test]
    fn test_resize_node_se_grows() {
        let (pos, size) = resize_node(
            Point::new(10.0, 10.0),
            64.0,
            Corner::SouthEast,
            Vec2::new(20.0, 5.0),
        );
        assert_eq!(pos, Point::new(10.0, 10.0));
        assert!((size - 84.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_node_nw_keeps_opposite_corner() {
        let orig = Point::new(10.0, 10.0);
        let (pos, size) = resize_node(orig, 64.0, Corner::NorthWest, Vec2::new(-16.0, -16.0));
        assert!((size - 80.0).abs() < f64::EPSILON);
        // South-east corner stays where it was
        assert!((pos.x + size - (orig.x + 64.0)).abs() < 1e-9);
        assert!((pos.y + size - (orig.y + 64.0)).abs() < 1e-9);
    }

    #[test]
    fn test_resize_node_clamps_without_jump() {
        let orig = Point::new(0.0, 0.0);
        for corner in Corner::ALL {
            // Extreme shrink and extreme grow
            for delta in [
                Vec2::new(-1e6, -1e6),
                Vec2::new(1e6, 1e6),
                Vec2::new(-1e6, 1e6),
                Vec2::new(1e6, -1e6),
            ] {
                let (pos, size) = resize_node(orig, 64.0, corner, delta);
                assert!(size >= MIN_NODE_SIZE && size <= MAX_NODE_SIZE);
                // Opposite corner remains fixed even at the clamp boundary
                let fixed_x = match corner {
                    Corner::NorthWest | Corner::SouthWest => orig.x + 64.0,
                    _ => orig.x,
                };
                let fixed_y = match corner {
                    Corner::NorthWest | Corner::NorthEast => orig.y + 64.0,
                    _ => orig.y,
                };
                let got_x = if corner.moves_west() { pos.x + size } else { pos.x };
                let got_y = if corner.moves_north() { pos.y + size } else { pos.y };
                assert!((got_x - fixed_x).abs() < 1e-9);
                assert!((got_y - fixed_y).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_resize_sticky_independent_axes() {
        let (pos, w, h) = resize_sticky(
            Point::new(0.0, 0.0),
            240.0,
            160.0,
            Corner::SouthEast,
            Vec2::new(60.0, -20.0),
        );
        assert_eq!(pos, Point::new(0.0, 0.0));
        assert!((w - 300.0).abs() < f64::EPSILON);
        assert!((h - 140.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_sticky_clamps_without_jump() {
        let orig = Point::new(100.0, 100.0);
        for corner in Corner::ALL {
            let (pos, w, h) = resize_sticky(orig, 240.0, 160.0, corner, Vec2::new(-1e6, 1e6));
            assert!(w >= MIN_STICKY_WIDTH);
            assert!(h >= MIN_STICKY_HEIGHT);
            // West corners anchor the right edge, east corners the left
            let fixed_x = if corner.moves_west() { orig.x + 240.0 } else { orig.x };
            let got_x = if corner.moves_west() { pos.x + w } else { pos.x };
            assert!((got_x - fixed_x).abs() < 1e-9);
            let fixed_y = if corner.moves_north() { orig.y + 160.0 } else { orig.y };
            let got_y = if corner.moves_north() { pos.y + h } else { pos.y };
            assert!((got_y - fixed_y).abs() < 1e-9);
        }
    }
}
