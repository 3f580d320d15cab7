use std::f64::consts::{PI, TAU};

use crate::error::GeometryError;
use crate::math::vec2::Vec2;

/// Largest angle between consecutive synthesized vertices on an arc.
pub const MAX_SEGMENT_ANGLE: f64 = PI / 16.0;

/// Relative mismatch allowed between the start and end radius of an arc.
const RADIUS_MISMATCH: f64 = 1e-8;

/// Geometry of a circular edge, in body coordinates.
///
/// An arc travelling counter-clockwise about its center bulges outward
/// (convex, outside is away from the center); a clockwise arc is concave
/// (outside is toward the center). This follows from paths running
/// counter-clockwise around the body interior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularArc {
    pub start: Vec2,
    pub end: Vec2,
    pub center: Vec2,
    pub radius: f64,
    pub clockwise: bool,
    start_angle: f64,
    sweep: f64,
}

impl CircularArc {
    /// Builds the arc from `start` to `end` around `center`. Equal start and
    /// end points make a full circle.
    pub fn new(start: Vec2, end: Vec2, center: Vec2, clockwise: bool) -> Result<Self, GeometryError> {
        let radius = start.distance(center);
        let end_radius = end.distance(center);
        if !(radius.is_finite() && radius > 1e-12) {
            return Err(GeometryError::degenerate("circular edge has zero radius"));
        }
        if (radius - end_radius).abs() > RADIUS_MISMATCH * radius.max(1.0) {
            return Err(GeometryError::degenerate(format!(
                "circular edge endpoints at different radii ({radius} and {end_radius})"
            )));
        }
        let start_angle = (start - center).angle();
        let end_angle = (end - center).angle();
        let mut sweep = if clockwise {
            (start_angle - end_angle).rem_euclid(TAU)
        } else {
            (end_angle - start_angle).rem_euclid(TAU)
        };
        if sweep < 1e-12 {
            sweep = TAU;
        }
        Ok(Self { start, end, center, radius, clockwise, start_angle, sweep })
    }

    /// Angle swept from start to end, in `(0, 2*PI]`.
    pub fn sweep(&self) -> f64 {
        self.sweep
    }

    pub fn is_convex(&self) -> bool {
        !self.clockwise
    }

    /// Whether a ray from the center at `angle` passes through the arc.
    pub fn contains_angle(&self, angle: f64) -> bool {
        let rel = if self.clockwise {
            (self.start_angle - angle).rem_euclid(TAU)
        } else {
            (angle - self.start_angle).rem_euclid(TAU)
        };
        rel <= self.sweep + 1e-12 || TAU - rel < 1e-12
    }

    /// Whether the direction from the center to `point` passes through the arc.
    pub fn faces(&self, point: Vec2) -> bool {
        let offset = point - self.center;
        if offset.magnitude_squared() < 1e-24 {
            return false;
        }
        self.contains_angle(offset.angle())
    }

    /// Point on the arc at fraction `t` of the sweep.
    pub fn point_at(&self, t: f64) -> Vec2 {
        let delta = if self.clockwise { -t * self.sweep } else { t * self.sweep };
        self.center + Vec2::from_angle(self.start_angle + delta) * self.radius
    }

    /// Number of chords used to approximate the arc.
    pub fn segments(&self) -> usize {
        ((self.sweep / MAX_SEGMENT_ANGLE).ceil() as usize).max(1)
    }

    /// Interior points dividing the arc into [`CircularArc::segments`] chords.
    pub fn interior_points(&self) -> Vec<Vec2> {
        let n = self.segments();
        (1..n).map(|i| self.point_at(i as f64 / n as f64)).collect()
    }

    /// Largest gap between the arc and its chord approximation (the sagitta).
    pub fn chord_error(&self) -> f64 {
        let half_step = self.sweep / self.segments() as f64 / 2.0;
        self.radius * (1.0 - half_step.cos())
    }

    /// Signed distance from the arc when the point faces it, positive on
    /// the outside of the body.
    pub fn signed_distance(&self, point: Vec2) -> Option<f64> {
        if !self.faces(point) {
            return None;
        }
        let d = point.distance(self.center);
        Some(if self.is_convex() { d - self.radius } else { self.radius - d })
    }

    /// Outward unit normal at the arc point nearest to `point`.
    pub fn outward_normal_at(&self, point: Vec2) -> Vec2 {
        let radial = (point - self.center).normalize();
        if self.is_convex() {
            radial
        } else {
            -radial
        }
    }

    /// Points of the arc that are extreme along an axis, plus endpoints.
    /// Their bounding box is the bounding box of the arc.
    pub fn extreme_points(&self) -> Vec<Vec2> {
        let mut points = vec![self.start, self.end];
        for k in 0..4 {
            let angle = k as f64 * PI / 2.0;
            if self.contains_angle(angle) {
                points.push(self.center + Vec2::from_angle(angle) * self.radius);
            }
        }
        points
    }

    /// Center and radius of a circle enclosing the whole arc.
    pub fn enclosing_circle(&self) -> (Vec2, f64) {
        if self.sweep <= PI {
            let mid = (self.start + self.end) / 2.0;
            let radius = self.start.distance(self.end) / 2.0;
            // Near-zero sweeps: the chord circle still has to cover the bulge.
            let sagitta = self.radius * (1.0 - (self.sweep / 2.0).cos());
            (mid, radius.max(sagitta))
        } else {
            (self.center, self.radius)
        }
    }
}
