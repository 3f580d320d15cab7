use crate::math::vec2::Vec2;
use crate::objects::Body;

use super::{Force, ForceLaw};

/// The far end of a spring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpringEnd {
    /// A point in body coordinates of another body.
    Body { body: usize, attach: Vec2 },
    /// A fixed world point.
    Fixed(Vec2),
}

/// Linear spring with optional damping along its length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub body: usize,
    /// Attachment point on `body`, body coordinates.
    pub attach: Vec2,
    pub other: SpringEnd,
    pub rest_length: f64,
    pub stiffness: f64,
    pub damping: f64,
}

impl Spring {
    pub fn new(body: usize, attach: Vec2, other: SpringEnd, rest_length: f64, stiffness: f64) -> Self {
        Self { body, attach, other, rest_length, stiffness, damping: 0.0 }
    }

    #[must_use]
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// World positions and velocities of both ends.
    fn ends(&self, bodies: &[Body]) -> ((Vec2, Vec2), (Vec2, Vec2)) {
        let b1 = &bodies[self.body];
        let p1 = b1.body_to_world(self.attach);
        let v1 = b1.world_velocity_of_point(p1);
        let end2 = match self.other {
            SpringEnd::Body { body, attach } => {
                let b2 = &bodies[body];
                let p2 = b2.body_to_world(attach);
                (p2, b2.world_velocity_of_point(p2))
            }
            SpringEnd::Fixed(point) => (point, Vec2::ZERO),
        };
        ((p1, v1), end2)
    }

    pub fn length(&self, bodies: &[Body]) -> f64 {
        let ((p1, _), (p2, _)) = self.ends(bodies);
        p1.distance(p2)
    }
}

impl ForceLaw for Spring {
    fn forces(&self, bodies: &[Body]) -> Vec<Force> {
        let ((p1, v1), (p2, v2)) = self.ends(bodies);
        let Some(u) = (p1 - p2).try_normalize() else {
            return Vec::new();
        };
        let stretch = p1.distance(p2) - self.rest_length;
        let magnitude = self.stiffness * stretch + self.damping * (v1 - v2).dot(u);
        let on_first = u * -magnitude;

        let mut forces = vec![Force { body: self.body, location: p1, vector: on_first, torque: 0.0 }];
        if let SpringEnd::Body { body, .. } = self.other {
            forces.push(Force { body, location: p2, vector: -on_first, torque: 0.0 });
        }
        forces
    }

    fn potential_energy(&self, bodies: &[Body]) -> f64 {
        let stretch = self.length(bodies) - self.rest_length;
        0.5 * self.stiffness * stretch * stretch
    }

    fn name(&self) -> &str {
        "spring"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeFactory;
    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_stretched_spring_pulls_together() {
        let mut factory = ShapeFactory::new();
        let a = factory.ball(0.1).unwrap();
        let mut b = factory.ball(0.1).unwrap();
        b.set_position(Vec2::new(3.0, 0.0), 0.0);
        let bodies = vec![a, b];
        let spring = Spring::new(0, Vec2::ZERO, SpringEnd::Body { body: 1, attach: Vec2::ZERO }, 1.0, 2.0);
        let forces = spring.forces(&bodies);
        assert_eq!(forces.len(), 2);
        assert!(forces[0].vector.nearly_equal(Vec2::new(4.0, 0.0), EPSILON));
        assert!(forces[1].vector.nearly_equal(Vec2::new(-4.0, 0.0), EPSILON));
        assert!((spring.potential_energy(&bodies) - 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_fixed_end_damped() {
        let mut ball = ShapeFactory::new().ball(0.1).unwrap();
        ball.set_position(Vec2::new(0.0, -1.0), 0.0);
        ball.set_velocity(Vec2::new(0.0, -1.0), 0.0);
        let bodies = vec![ball];
        let spring = Spring::new(0, Vec2::ZERO, SpringEnd::Fixed(Vec2::ZERO), 1.0, 5.0).with_damping(0.5);
        let forces = spring.forces(&bodies);
        assert_eq!(forces.len(), 1);
        // At rest length, only damping acts, against the motion.
        assert!(forces[0].vector.nearly_equal(Vec2::new(0.0, 0.5), EPSILON));
    }
}
