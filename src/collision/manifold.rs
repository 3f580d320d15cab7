use std::fmt;

use crate::common::Tolerances;
use crate::math::vec2::Vec2;
use crate::objects::Body;

/// The feature of the primary body that touches the normal body's edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    Vertex(usize),
    Edge(usize),
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Vertex(v) => write!(f, "v{v}"),
            Feature::Edge(e) => write!(f, "e{e}"),
        }
    }
}

/// How the contact normal turns as the bodies move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalMotion {
    /// Fixed to a straight edge of the normal body; turns with that body.
    Straight,
    /// Along the line from `from` (a material point of the normal body) to
    /// `to` (a material point of the primary body), negated when `inward`.
    Radial { from: Vec2, to: Vec2, inward: bool },
}

/// A touching or penetrating pair of features found by narrow phase.
///
/// The normal is a unit vector in world coordinates pointing out of the
/// normal body toward the primary body. Impulses and forces push the
/// primary body along `normal` and the normal body against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    /// Index of the primary body in the simulation's body list.
    pub primary: usize,
    pub primary_feature: Feature,
    /// Index of the body that owns the normal edge.
    pub normal_body: usize,
    pub normal_edge: usize,
    /// Contact location in world coordinates.
    pub impact_point: Vec2,
    pub normal: Vec2,
    pub normal_motion: NormalMotion,
    /// Separation along the normal; negative when penetrating.
    pub distance: f64,
    /// Normal component of the primary point velocity relative to the
    /// normal body; negative when closing.
    pub normal_velocity: f64,
    /// Offsets from each body's center of mass to the impact point.
    pub r1: Vec2,
    pub r2: Vec2,
    pub elasticity: f64,
    pub tolerances: Tolerances,
    /// Contact force magnitude from the last force solve.
    pub force: f64,
    /// Accumulated impulse magnitude applied at this collision.
    pub impulse: f64,
    /// Set when the primary feature crossed the edge during the step
    /// instead of merely approaching it.
    pub crossed: bool,
}

impl Collision {
    /// Builds a record for the given geometry, deriving offsets, combined
    /// tolerances, elasticity and normal velocity from the bodies.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bodies: &[Body],
        primary: usize,
        primary_feature: Feature,
        normal_body: usize,
        normal_edge: usize,
        impact_point: Vec2,
        normal: Vec2,
        normal_motion: NormalMotion,
        distance: f64,
    ) -> Self {
        let b1 = &bodies[primary];
        let b2 = &bodies[normal_body];
        let mut collision = Self {
            primary,
            primary_feature,
            normal_body,
            normal_edge,
            impact_point,
            normal,
            normal_motion,
            distance,
            normal_velocity: 0.0,
            r1: impact_point - b1.position(),
            r2: impact_point - b2.position(),
            elasticity: b1.elasticity().min(b2.elasticity()),
            tolerances: b1.tolerances().combine(&b2.tolerances()),
            force: 0.0,
            impulse: 0.0,
            crossed: false,
        };
        collision.update_velocity(bodies);
        collision
    }

    /// Recomputes the normal velocity after body velocities changed.
    pub fn update_velocity(&mut self, bodies: &[Body]) {
        self.normal_velocity = self.relative_velocity(bodies).dot(self.normal);
    }

    /// Velocity of the primary's contact point relative to the normal
    /// body's coincident point.
    pub fn relative_velocity(&self, bodies: &[Body]) -> Vec2 {
        let v1 = bodies[self.primary].world_velocity_of_point(self.impact_point);
        let v2 = bodies[self.normal_body].world_velocity_of_point(self.impact_point);
        v1 - v2
    }

    /// Rate of change of the normal direction.
    pub fn normal_derivative(&self, bodies: &[Body]) -> Vec2 {
        let b1 = &bodies[self.primary];
        let b2 = &bodies[self.normal_body];
        match self.normal_motion {
            NormalMotion::Straight => Vec2::scalar_cross(b2.angular_velocity(), self.normal),
            NormalMotion::Radial { from, to, inward } => {
                let offset = to - from;
                let length = offset.magnitude();
                if length < 1e-12 {
                    return Vec2::ZERO;
                }
                let unit = offset / length;
                let dv = b1.world_velocity_of_point(to) - b2.world_velocity_of_point(from);
                let turn = (dv - unit * dv.dot(unit)) / length;
                if inward {
                    -turn
                } else {
                    turn
                }
            }
        }
    }

    /// Penetrating.
    pub fn is_colliding(&self) -> bool {
        self.distance < 0.0
    }

    /// Within the distance tolerance of touching.
    pub fn is_touching(&self) -> bool {
        self.distance < self.tolerances.distance
    }

    /// Touching with a normal velocity small enough to be resting.
    pub fn is_contact(&self) -> bool {
        self.is_touching() && self.normal_velocity.abs() < self.tolerances.velocity
    }

    /// Closing faster than `small_impact`, so an impulse is needed.
    pub fn needs_impulse(&self, small_impact: f64) -> bool {
        self.normal_velocity < -small_impact
    }

    /// Non-negative gap no larger than the top of the accuracy band.
    pub fn within_band(&self) -> bool {
        self.distance >= 0.0 && self.distance <= self.tolerances.target_gap() + self.tolerances.accuracy_band()
    }

    /// Elasticity used for an impulse: zero for slow, resting approaches.
    pub fn effective_elasticity(&self) -> f64 {
        if self.normal_velocity.abs() < self.tolerances.velocity {
            0.0
        } else {
            self.elasticity
        }
    }
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "body{}:{} -> body{}:e{} d={:.6} v={:.6}",
            self.primary, self.primary_feature, self.normal_body, self.normal_edge, self.distance, self.normal_velocity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeFactory;
    const EPSILON: f64 = 1e-12;

    fn floor_and_block() -> Vec<Body> {
        let mut factory = ShapeFactory::new();
        let floor = factory.wall(10.0, 1.0).unwrap();
        let mut block = factory.block(1.0, 1.0).unwrap();
        block.set_position(Vec2::new(0.0, 1.0), 0.0);
        block.set_velocity(Vec2::new(0.0, -2.0), 0.0);
        vec![floor, block]
    }

    fn corner_collision(bodies: &[Body], distance: f64) -> Collision {
        Collision::new(
            bodies,
            1,
            Feature::Vertex(0),
            0,
            2,
            Vec2::new(-0.5, 0.5),
            Vec2::UP,
            NormalMotion::Straight,
            distance,
        )
    }

    #[test]
    fn test_new_derives_velocity_and_offsets() {
        let bodies = floor_and_block();
        let c = corner_collision(&bodies, 0.001);
        assert!((c.normal_velocity + 2.0).abs() < EPSILON);
        assert!(c.r1.nearly_equal(Vec2::new(-0.5, -0.5), EPSILON));
        assert!(c.r2.nearly_equal(Vec2::new(-0.5, 0.5), EPSILON));
        assert_eq!(c.elasticity, 1.0);
        assert!(c.needs_impulse(1e-4));
        assert!(c.is_touching());
        assert!(!c.is_contact());
    }

    #[test]
    fn test_gap_classification() {
        let bodies = floor_and_block();
        let target = Tolerances::default().target_gap();
        assert!(corner_collision(&bodies, -0.001).is_colliding());
        assert!(corner_collision(&bodies, target).within_band());
        assert!(corner_collision(&bodies, 0.0).within_band());
        assert!(!corner_collision(&bodies, -0.001).within_band());
        assert!(!corner_collision(&bodies, 0.009).within_band());
        assert!(!corner_collision(&bodies, 0.02).is_touching());
    }

    #[test]
    fn test_slow_approach_is_inelastic() {
        let mut bodies = floor_and_block();
        bodies[1].set_velocity(Vec2::new(0.0, -0.1), 0.0);
        let c = corner_collision(&bodies, 0.001);
        assert!(c.is_contact());
        assert_eq!(c.effective_elasticity(), 0.0);
    }

    #[test]
    fn test_straight_normal_turns_with_body() {
        let mut bodies = floor_and_block();
        bodies[0].set_velocity(Vec2::ZERO, 2.0);
        let c = corner_collision(&bodies, 0.0);
        assert!(c.normal_derivative(&bodies).nearly_equal(Vec2::new(-2.0, 0.0), EPSILON));
    }
}
