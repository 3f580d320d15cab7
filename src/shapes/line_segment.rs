use crate::math::vec2::Vec2;

/// Slack on the segment parameter when deciding whether a point projects
/// onto the segment. Keeps corner contacts from flickering in and out.
const PROJECTION_SLACK: f64 = 1e-10;

/// Geometry of a straight edge, in body coordinates.
///
/// Paths run counter-clockwise around the body interior, so the outside
/// of a straight edge is to the right of its direction of travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub a: Vec2,
    pub b: Vec2,
}

impl LineSegment {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    /// Calculates the length of the line segment.
    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    /// Calculates the squared length of the line segment.
    pub fn length_squared(&self) -> f64 {
        self.a.distance_squared(self.b)
    }

    /// Returns the direction vector of the line segment (from a to b).
    pub fn direction(&self) -> Vec2 {
        self.b - self.a
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.a + self.b) / 2.0
    }

    /// Unit normal pointing out of the body.
    pub fn outward_normal(&self) -> Vec2 {
        let d = self.direction();
        Vec2::new(d.y, -d.x).normalize()
    }

    /// Parameter of the orthogonal projection of `point` onto the line,
    /// 0 at `a` and 1 at `b`.
    pub fn project(&self, point: Vec2) -> f64 {
        let len_sq = self.length_squared();
        if len_sq < 1e-24 {
            return 0.0;
        }
        (point - self.a).dot(self.direction()) / len_sq
    }

    /// Whether the projection of `point` lands on the segment.
    pub fn projects_onto(&self, point: Vec2) -> bool {
        let t = self.project(point);
        (-PROJECTION_SLACK..=1.0 + PROJECTION_SLACK).contains(&t)
    }

    /// Distance from the infinite line, positive on the outside.
    pub fn signed_line_distance(&self, point: Vec2) -> f64 {
        (point - self.a).dot(self.outward_normal())
    }

    /// Signed distance from the edge when `point` projects onto it,
    /// positive outside the body.
    pub fn signed_distance(&self, point: Vec2) -> Option<f64> {
        if self.projects_onto(point) {
            Some(self.signed_line_distance(point))
        } else {
            None
        }
    }

    /// Intersection with another segment. Returns the point and the
    /// parameters along both segments; parallel segments never intersect.
    pub fn intersect(&self, other: &LineSegment) -> Option<(Vec2, f64, f64)> {
        let d1 = self.direction();
        let d2 = other.direction();
        let denominator = d1.cross(d2);
        if denominator.abs() < 1e-14 {
            return None;
        }
        let delta_start = other.a - self.a;
        let t = delta_start.cross(d2) / denominator;
        let u = delta_start.cross(d1) / denominator;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some((self.a + d1 * t, t, u))
        } else {
            None
        }
    }
}
