//! Polygon and circle collision detection
//!
//! Polygons use a separating-axis test over their own edges: an edge whose
//! outward side strictly contains every vertex of the other polygon divides
//! the two shapes. Circles are tested by distance instead.

use serde::{Deserialize, Serialize};

use super::transform::Transform;
use super::types::{Point2, Pose};

/// A circle in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
}

/// Collision geometry, either in an actor's local frame or in world space
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Ordered hull vertices with a consistent winding
    Polygon(Vec<Point2>),
    Circle(Circle),
}

impl Shape {
    /// Axis-aligned rectangle centred on the origin, `length` along x
    pub fn rectangle(length: f64, width: f64) -> Shape {
        let (l2, w2) = (length / 2.0, width / 2.0);
        Shape::Polygon(vec![
            Point2::new(-l2, -w2),
            Point2::new(l2, -w2),
            Point2::new(l2, w2),
            Point2::new(-l2, w2),
        ])
    }

    pub fn circle(center: Point2, radius: f64) -> Shape {
        Shape::Circle(Circle { center, radius })
    }

    /// Place local geometry at `pose` in world coordinates
    pub fn to_world(&self, pose: &Pose) -> Shape {
        let vehicle_to_world = Transform::new(pose).inverse();
        match self {
            Shape::Polygon(points) => Shape::Polygon(
                points
                    .iter()
                    .map(|p| vehicle_to_world.transform_point(p))
                    .collect(),
            ),
            Shape::Circle(c) => Shape::Circle(Circle {
                center: vehicle_to_world.transform_point(&c.center),
                radius: c.radius,
            }),
        }
    }
}

/// An actor's world-space geometry for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionBody {
    pub name: String,
    pub shapes: Vec<Shape>,
}

impl CollisionBody {
    pub fn new(name: impl Into<String>, pose: &Pose, local_shapes: &[Shape]) -> Self {
        Self {
            name: name.into(),
            shapes: local_shapes.iter().map(|s| s.to_world(pose)).collect(),
        }
    }
}

/// Names of the bodies in `others` that `primary` overlaps.
///
/// A body with the primary's own name is skipped.
pub fn detect_collisions(primary: &CollisionBody, others: &[CollisionBody]) -> Vec<String> {
    others
        .iter()
        .filter(|other| other.name != primary.name)
        .filter(|other| check_collision(&primary.shapes, &other.shapes))
        .map(|other| other.name.clone())
        .collect()
}

/// True if any shape of `a` overlaps any shape of `b`.
///
/// Empty lists never collide.
pub fn check_collision(a: &[Shape], b: &[Shape]) -> bool {
    a.iter().any(|sa| b.iter().any(|sb| shapes_collide(sa, sb)))
}

pub fn shapes_collide(a: &Shape, b: &Shape) -> bool {
    match (a, b) {
        (Shape::Polygon(pa), Shape::Polygon(pb)) => polygons_collide(pa, pb),
        (Shape::Polygon(poly), Shape::Circle(c)) | (Shape::Circle(c), Shape::Polygon(poly)) => {
            circle_polygon_collide(c, poly)
        }
        (Shape::Circle(ca), Shape::Circle(cb)) => {
            ca.center.distance(&cb.center) <= ca.radius + cb.radius
        }
    }
}

/// Separating-axis test over the edges of both polygons.
///
/// Polygons with fewer than three vertices have no interior and never
/// collide.
pub fn polygons_collide(a: &[Point2], b: &[Point2]) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }
    !(has_dividing_edge(a, b) || has_dividing_edge(b, a))
}

/// Whether some edge of `poly` has every vertex of `other` strictly on its
/// outward side
fn has_dividing_edge(poly: &[Point2], other: &[Point2]) -> bool {
    let n = poly.len();
    (0..n).any(|i| {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        // interior side is decided by the vertex after the edge
        let c = poly[(i + 2) % n];
        let normal = (-(b.y - a.y), b.x - a.x);
        let side = |p: &Point2| normal.0 * (p.x - a.x) + normal.1 * (p.y - a.y);
        let interior = side(&c);
        if interior == 0.0 {
            return false;
        }
        other.iter().all(|d| side(d) * interior < 0.0)
    })
}

fn circle_polygon_collide(circle: &Circle, poly: &[Point2]) -> bool {
    if poly.len() < 3 {
        return false;
    }
    if point_in_polygon(&circle.center, poly) {
        return true;
    }
    let n = poly.len();
    (0..n).any(|i| {
        let closest = closest_point_on_segment(&circle.center, &poly[i], &poly[(i + 1) % n]);
        closest.distance(&circle.center) <= circle.radius
    })
}

/// Crossing-number containment test
fn point_in_polygon(p: &Point2, poly: &[Point2]) -> bool {
    let n = poly.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (poly[i], poly[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn closest_point_on_segment(p: &Point2, a: &Point2, b: &Point2) -> Point2 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len_sq = abx * abx + aby * aby;
    if len_sq < 1e-12 {
        return *a;
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    Point2::new(a.x + abx * t, a.y + aby * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    fn rect_at(x: f64, y: f64, yaw: f64) -> Shape {
        Shape::rectangle(2.0, 1.0).to_world(&Pose::planar(x, y, yaw))
    }

    #[test]
    fn test_coincident_rectangles_collide() {
        let a = rect_at(3.0, 4.0, 0.3);
        assert!(shapes_collide(&a, &a.clone()));
    }

    #[test]
    fn test_far_rectangles_never_collide() {
        for i in 0..16 {
            let yaw = i as f64 * 0.4;
            let a = rect_at(0.0, 0.0, yaw);
            let b = rect_at(10.0, -3.0, -yaw);
            assert!(!shapes_collide(&a, &b));
        }
    }

    #[test]
    fn test_overlapping_rotated_rectangles() {
        let a = rect_at(0.0, 0.0, 0.0);
        let b = rect_at(1.5, 0.0, FRAC_PI_4);
        assert!(shapes_collide(&a, &b));
    }

    #[test]
    fn test_diamond_near_corner_is_separated() {
        // bounding boxes overlap but the diamond's edge separates them
        let a = rect_at(0.0, 0.0, 0.0);
        let b = Shape::Polygon(vec![
            Point2::new(1.3, 0.3),
            Point2::new(1.8, 0.8),
            Point2::new(1.3, 1.3),
            Point2::new(0.8, 0.8),
        ]);
        assert!(!shapes_collide(&a, &b));
    }

    #[test]
    fn test_winding_does_not_matter() {
        let a = rect_at(0.0, 0.0, 0.0);
        let Shape::Polygon(mut points) = rect_at(1.0, 0.2, 0.1) else {
            unreachable!()
        };
        points.reverse();
        assert!(shapes_collide(&a, &Shape::Polygon(points)));
    }

    #[test]
    fn test_circle_cases() {
        let rect = rect_at(0.0, 0.0, 0.0);
        assert!(shapes_collide(&rect, &Shape::circle(Point2::new(1.2, 0.0), 0.25)));
        assert!(!shapes_collide(&rect, &Shape::circle(Point2::new(1.6, 0.0), 0.25)));
        // fully inside
        assert!(shapes_collide(&Shape::circle(Point2::new(0.1, 0.1), 0.05), &rect));
        // corner distance, not bounding box
        assert!(!shapes_collide(&rect, &Shape::circle(Point2::new(1.3, 0.8), 0.3)));

        let c1 = Shape::circle(Point2::new(0.0, 0.0), 1.0);
        assert!(shapes_collide(&c1, &Shape::circle(Point2::new(1.5, 0.0), 0.6)));
        assert!(!shapes_collide(&c1, &Shape::circle(Point2::new(1.5, 0.0), 0.4)));
    }

    #[test]
    fn test_empty_geometry_never_collides() {
        let a = vec![rect_at(0.0, 0.0, 0.0)];
        assert!(!check_collision(&a, &[]));
        assert!(!check_collision(&[], &a));
        assert!(!shapes_collide(&a[0], &Shape::Polygon(vec![])));
    }

    #[test]
    fn test_detect_skips_self() {
        let pose = Pose::planar(0.0, 0.0, 0.0);
        let shapes = vec![Shape::rectangle(2.0, 1.0)];
        let primary = CollisionBody::new("ego", &pose, &shapes);
        let others = vec![
            CollisionBody::new("ego", &pose, &shapes),
            CollisionBody::new("wall", &Pose::planar(0.5, 0.5, 0.0), &shapes),
            CollisionBody::new("far", &Pose::planar(50.0, 0.0, 0.0), &shapes),
        ];
        assert_eq!(detect_collisions(&primary, &others), vec!["wall".to_string()]);
    }
}
