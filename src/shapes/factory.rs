//! Builders for common body shapes.

use crate::error::GeometryError;
use crate::math::vec2::Vec2;
use crate::objects::{Body, BodyId};

use super::polygon::PolygonOutline;

/// Hands out body ids and builds finished bodies with their center of mass
/// at the world origin.
#[derive(Debug, Clone, Default)]
pub struct ShapeFactory {
    next_id: u32,
}

impl ShapeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next id. Useful for bodies built by hand.
    pub fn next_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Creates an empty body with a fresh id, ready for path construction.
    pub fn empty(&mut self, name: impl Into<String>) -> Body {
        Body::new(self.next_id(), name)
    }

    pub fn block(&mut self, width: f64, height: f64) -> Result<Body, GeometryError> {
        let name = format!("block{}", self.next_id);
        self.named_block(name, width, height)
    }

    /// An axis-aligned rectangle with unit mass.
    pub fn named_block(&mut self, name: impl Into<String>, width: f64, height: f64) -> Result<Body, GeometryError> {
        if !(width > 0.0 && height > 0.0) {
            return Err(GeometryError::degenerate(format!("block size must be positive, got {width}x{height}")));
        }
        let mut body = self.empty(name);
        body.start_path(Vec2::new(0.0, 0.0))?;
        body.add_straight_edge(Vec2::new(width, 0.0))?;
        body.add_straight_edge(Vec2::new(width, height))?;
        body.add_straight_edge(Vec2::new(0.0, height))?;
        body.add_straight_edge(Vec2::new(0.0, 0.0))?;
        body.close_path()?;
        body.finish()?;
        Ok(body)
    }

    pub fn ball(&mut self, radius: f64) -> Result<Body, GeometryError> {
        let name = format!("ball{}", self.next_id);
        self.named_ball(name, radius)
    }

    /// A disk made of two convex semicircles, with the moment of a uniform
    /// disk of unit mass.
    pub fn named_ball(&mut self, name: impl Into<String>, radius: f64) -> Result<Body, GeometryError> {
        if !(radius > 0.0) {
            return Err(GeometryError::degenerate(format!("ball radius must be positive, got {radius}")));
        }
        let mut body = self.empty(name);
        body.start_path(Vec2::new(radius, 0.0))?;
        body.add_circular_edge(Vec2::new(-radius, 0.0), Vec2::ZERO, false)?;
        body.add_circular_edge(Vec2::new(radius, 0.0), Vec2::ZERO, false)?;
        body.close_path()?;
        body.finish()?;
        body.set_moment_about_cm(body.mass() * radius * radius / 2.0)?;
        Ok(body)
    }

    pub fn wall(&mut self, width: f64, height: f64) -> Result<Body, GeometryError> {
        let name = format!("wall{}", self.next_id);
        self.named_wall(name, width, height)
    }

    /// A fixed block whose top face is its special edge.
    pub fn named_wall(&mut self, name: impl Into<String>, width: f64, height: f64) -> Result<Body, GeometryError> {
        let mut body = self.named_block(name, width, height)?;
        body.set_mass(f64::INFINITY)?;
        // Edge 2 runs from (w, h) to (0, h).
        body.set_special_edge(2, height / 2.0)?;
        Ok(body)
    }

    pub fn polygon(&mut self, points: &[Vec2]) -> Result<Body, GeometryError> {
        let name = format!("polygon{}", self.next_id);
        self.named_polygon(name, points)
    }

    /// A body with straight edges through `points` (counter-clockwise), mass
    /// properties of a uniform plate of unit mass.
    pub fn named_polygon(&mut self, name: impl Into<String>, points: &[Vec2]) -> Result<Body, GeometryError> {
        let outline = PolygonOutline::new(points.to_vec())?;
        let mut body = self.empty(name);
        body.start_path(points[0])?;
        for &p in &points[1..] {
            body.add_straight_edge(p)?;
        }
        body.add_straight_edge(points[0])?;
        body.close_path()?;
        body.set_center_of_mass(outline.centroid());
        body.finish()?;
        body.set_moment_about_cm(outline.moment_about_centroid(body.mass()))?;
        body.set_position(Vec2::ZERO, 0.0);
        Ok(body)
    }
}
