use crate::math::vec2::Vec2;
use crate::objects::Body;

use super::{Force, ForceLaw};

/// Uniform downward gravity on every movable body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    /// Magnitude of the acceleration, along negative y.
    pub g: f64,
    /// Height at which potential energy is zero.
    pub zero_level: f64,
}

impl Gravity {
    pub fn new(g: f64) -> Self {
        Self { g, zero_level: 0.0 }
    }
}

impl ForceLaw for Gravity {
    fn forces(&self, bodies: &[Body]) -> Vec<Force> {
        bodies
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_fixed())
            .map(|(i, b)| Force {
                body: i,
                location: b.position(),
                vector: Vec2::new(0.0, -self.g * b.mass()),
                torque: 0.0,
            })
            .collect()
    }

    fn potential_energy(&self, bodies: &[Body]) -> f64 {
        bodies
            .iter()
            .filter(|b| !b.is_fixed())
            .map(|b| b.mass() * self.g * (b.position().y - self.zero_level))
            .sum()
    }

    fn name(&self) -> &str {
        "gravity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeFactory;
    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_skips_fixed_bodies() {
        let mut factory = ShapeFactory::new();
        let floor = factory.wall(10.0, 1.0).unwrap();
        let mut ball = factory.ball(0.5).unwrap();
        ball.set_mass(2.0).unwrap();
        ball.set_position(Vec2::new(0.0, 3.0), 0.0);
        let bodies = vec![floor, ball];
        let gravity = Gravity::new(9.8);
        let forces = gravity.forces(&bodies);
        assert_eq!(forces.len(), 1);
        assert_eq!(forces[0].body, 1);
        assert!(forces[0].vector.nearly_equal(Vec2::new(0.0, -19.6), EPSILON));
        assert!((gravity.potential_energy(&bodies) - 2.0 * 9.8 * 3.0).abs() < EPSILON);
    }
}
