use crate::error::GeometryError;
use crate::math::vec2::Vec2;

/// Mass properties of a simple polygon outline, used when building
/// polygonal bodies.
///
/// Vertices must run counter-clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonOutline {
    vertices: Vec<Vec2>,
}

impl PolygonOutline {
    /// Fails for fewer than three vertices or a non-positive area.
    pub fn new(vertices: Vec<Vec2>) -> Result<Self, GeometryError> {
        if vertices.len() < 3 {
            return Err(GeometryError::degenerate("polygon needs at least 3 vertices"));
        }
        let outline = PolygonOutline { vertices };
        if outline.signed_area() <= 1e-12 {
            return Err(GeometryError::degenerate("polygon vertices must run counter-clockwise"));
        }
        Ok(outline)
    }

    /// Shoelace area; positive for counter-clockwise vertices.
    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        let mut area = 0.0;
        for i in 0..n {
            area += self.vertices[i].cross(self.vertices[(i + 1) % n]);
        }
        area / 2.0
    }

    /// Center of area, by fanning triangles from the first vertex.
    pub fn centroid(&self) -> Vec2 {
        let origin = self.vertices[0];
        let mut centroid = Vec2::ZERO;
        let mut area_sum = 0.0;
        for pair in self.vertices[1..].windows(2) {
            let (v2, v3) = (pair[0], pair[1]);
            let area = (v2 - origin).cross(v3 - origin) / 2.0;
            area_sum += area;
            centroid += (origin + v2 + v3) / 3.0 * area;
        }
        centroid / area_sum
    }

    /// Moment of inertia about the centroid for a uniform body of `mass`.
    pub fn moment_about_centroid(&self, mass: f64) -> f64 {
        let c = self.centroid();
        let n = self.vertices.len();
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for i in 0..n {
            let v1 = self.vertices[i] - c;
            let v2 = self.vertices[(i + 1) % n] - c;
            let cross = v1.cross(v2);
            numerator += cross * (v1.magnitude_squared() + v1.dot(v2) + v2.magnitude_squared());
            denominator += cross;
        }
        mass * numerator / (6.0 * denominator)
    }
}
