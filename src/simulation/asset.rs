//! Collision geometry carried by actor assets
//!
//! Image-based assets describe collision polygons in pixel coordinates with
//! y pointing down; they are converted to meters centred on the image.

use serde::{Deserialize, Serialize};

use super::collision::{Circle, Shape};
use super::types::Point2;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssetConfig {
    /// Image width in pixels
    pub width: f64,
    /// Image height in pixels
    pub height: f64,
    /// Pixels per meter
    pub scale: f64,
    /// Polygons in pixel coordinates
    pub collision_polys: Vec<Vec<Point2>>,
    /// Polygons already in meters; takes precedence over `collision_polys`
    pub collision_polys_m: Vec<Vec<Point2>>,
    /// Circles in meters
    pub circles: Vec<Circle>,
}

impl AssetConfig {
    /// Asset made of metric polygons only
    pub fn from_polygons_m(polys: Vec<Vec<Point2>>) -> Self {
        Self {
            collision_polys_m: polys,
            ..Default::default()
        }
    }

    /// Centred box, `length` along the local x axis
    pub fn rectangle(length: f64, width: f64) -> Self {
        let (l2, w2) = (length / 2.0, width / 2.0);
        Self::from_polygons_m(vec![vec![
            Point2::new(-l2, -w2),
            Point2::new(l2, -w2),
            Point2::new(l2, w2),
            Point2::new(-l2, w2),
        ]])
    }

    pub fn from_circle(center: Point2, radius: f64) -> Self {
        Self {
            circles: vec![Circle { center, radius }],
            ..Default::default()
        }
    }

    /// Collision polygons in meters
    pub fn collision_polys_m(&self) -> Vec<Vec<Point2>> {
        if !self.collision_polys_m.is_empty() {
            return self.collision_polys_m.clone();
        }
        if self.scale == 0.0 {
            return Vec::new();
        }
        self.collision_polys
            .iter()
            .map(|poly| {
                poly.iter()
                    .map(|p| {
                        Point2::new(
                            (p.x - self.width / 2.0) / self.scale,
                            (self.height / 2.0 - p.y) / self.scale,
                        )
                    })
                    .collect()
            })
            .collect()
    }

    /// All collision shapes in the actor's local frame
    pub fn shapes(&self) -> Vec<Shape> {
        self.collision_polys_m()
            .into_iter()
            .filter(|poly| !poly.is_empty())
            .map(Shape::Polygon)
            .chain(self.circles.iter().copied().map(Shape::Circle))
            .collect()
    }
}
