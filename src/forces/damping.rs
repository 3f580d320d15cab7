use crate::math::vec2::Vec2;
use crate::objects::Body;

use super::{Force, ForceLaw};

/// Velocity-proportional drag, applied at each body's drag points, plus
/// rotational drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Damping {
    pub linear: f64,
    pub angular: f64,
}

impl Damping {
    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }
}

impl ForceLaw for Damping {
    fn forces(&self, bodies: &[Body]) -> Vec<Force> {
        let mut forces = Vec::new();
        for (i, body) in bodies.iter().enumerate().filter(|(_, b)| !b.is_fixed()) {
            let points = body.drag_points();
            let share = self.linear / points.len().max(1) as f64;
            for &p in points {
                let location = body.body_to_world(p);
                let velocity = body.world_velocity_of_point(location);
                forces.push(Force { body: i, location, vector: velocity * -share, torque: 0.0 });
            }
            if self.angular != 0.0 {
                forces.push(Force {
                    body: i,
                    location: body.position(),
                    vector: Vec2::ZERO,
                    torque: -self.angular * body.angular_velocity(),
                });
            }
        }
        forces
    }

    fn name(&self) -> &str {
        "damping"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeFactory;
    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_opposes_motion() {
        let mut block = ShapeFactory::new().block(1.0, 1.0).unwrap();
        block.set_velocity(Vec2::new(2.0, 0.0), 1.5);
        let bodies = vec![block];
        let forces = Damping::new(0.5, 0.1).forces(&bodies);
        assert_eq!(forces.len(), 2);
        // Default drag point is the center of mass.
        assert!(forces[0].vector.nearly_equal(Vec2::new(-1.0, 0.0), EPSILON));
        assert!((forces[1].torque + 0.15).abs() < EPSILON);
    }
}
