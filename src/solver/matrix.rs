//! The influence matrix shared by the contact force and impulse solves.
//!
//! Entry `A[i][j]` is the change in the normal velocity (or acceleration)
//! at collision `i` caused by a unit impulse (or force) at collision `j`.
//! A collision pushes its primary body along the normal and its normal
//! body against it, so each shared body contributes with the product of
//! the two collisions' signs for that body.

use nalgebra::DMatrix;

use crate::collision::Collision;
use crate::math::vec2::Vec2;
use crate::objects::Body;

/// A body taking part in a collision: index, push direction sign, and the
/// offset from its center of mass to the impact point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Participant {
    pub body: usize,
    pub sign: f64,
    pub offset: Vec2,
}

/// Both bodies of a collision, primary first.
pub fn participants(collision: &Collision) -> [Participant; 2] {
    [
        Participant { body: collision.primary, sign: 1.0, offset: collision.r1 },
        Participant { body: collision.normal_body, sign: -1.0, offset: collision.r2 },
    ]
}

/// Velocity change at `r` from a unit push along `n` applied at `r_push`,
/// for a body with the given inverse mass and inverse moment.
fn response(inv_mass: f64, inv_moment: f64, n: Vec2, r_push: Vec2, r: Vec2) -> Vec2 {
    n * inv_mass + Vec2::scalar_cross(r_push.cross(n) * inv_moment, r)
}

/// Builds the influence matrix for `collisions`.
pub fn influence_matrix(bodies: &[Body], collisions: &[&Collision]) -> DMatrix<f64> {
    let k = collisions.len();
    DMatrix::from_fn(k, k, |i, j| {
        let (ci, cj) = (collisions[i], collisions[j]);
        let mut entry = 0.0;
        for pi in participants(ci) {
            for pj in participants(cj) {
                if pi.body != pj.body {
                    continue;
                }
                let body = &bodies[pi.body];
                let dv = response(body.inv_mass(), body.inv_moment(), cj.normal, pj.offset, pi.offset);
                entry += pi.sign * pj.sign * ci.normal.dot(dv);
            }
        }
        entry
    })
}

/// Inverse of the effective mass of a single collision: the diagonal entry
/// of the influence matrix.
pub fn effective_inverse_mass(bodies: &[Body], collision: &Collision) -> f64 {
    participants(collision)
        .iter()
        .map(|p| {
            let body = &bodies[p.body];
            collision.normal.dot(response(body.inv_mass(), body.inv_moment(), collision.normal, p.offset, p.offset))
        })
        .sum()
}

/// Acceleration of a body point at offset `r` from the center of mass.
pub fn point_acceleration(accel: Vec2, angular_accel: f64, angular_velocity: f64, r: Vec2) -> Vec2 {
    accel + Vec2::scalar_cross(angular_accel, r) - r * (angular_velocity * angular_velocity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{Feature, NormalMotion};
    use crate::shapes::ShapeFactory;
    const EPSILON: f64 = 1e-12;

    fn row_of_three() -> Vec<Body> {
        let mut factory = ShapeFactory::new();
        let mut bodies = Vec::new();
        for x in [0.0, 1.0, 2.0] {
            let mut b = factory.block(1.0, 1.0).unwrap();
            b.set_position(Vec2::new(x, 0.0), 0.0);
            bodies.push(b);
        }
        bodies
    }

    fn side_contact(bodies: &[Body], primary: usize, normal_body: usize, x: f64, normal: Vec2) -> Collision {
        Collision::new(
            bodies,
            primary,
            Feature::Vertex(0),
            normal_body,
            1,
            Vec2::new(x, 0.0),
            normal,
            NormalMotion::Straight,
            0.0,
        )
    }

    #[test]
    fn test_head_on_contact_effective_mass() {
        let bodies = row_of_three();
        let c = side_contact(&bodies, 1, 0, 0.5, Vec2::RIGHT);
        // Central push: no rotation, two unit masses.
        assert!((effective_inverse_mass(&bodies, &c) - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_shared_body_coupling_sign() {
        let bodies = row_of_three();
        let left = side_contact(&bodies, 1, 0, 0.5, Vec2::RIGHT);
        let right = side_contact(&bodies, 1, 2, 1.5, -Vec2::RIGHT);
        let a = influence_matrix(&bodies, &[&left, &right]);
        assert!((a[(0, 0)] - 2.0).abs() < EPSILON);
        assert!((a[(1, 1)] - 2.0).abs() < EPSILON);
        // Pushing the middle body left at the right contact moves it away
        // from the left contact's normal direction.
        assert!((a[(0, 1)] + 1.0).abs() < EPSILON);
        assert!((a[(0, 1)] - a[(1, 0)]).abs() < EPSILON);
    }

    #[test]
    fn test_off_center_push_adds_rotation() {
        let bodies = row_of_three();
        let mut c = side_contact(&bodies, 1, 0, 0.5, Vec2::RIGHT);
        c.r1 = Vec2::new(-0.5, 0.5);
        c.r2 = Vec2::new(0.5, 0.5);
        let moment = bodies[0].moment();
        let expected = 2.0 + 2.0 * 0.25 / moment;
        assert!((effective_inverse_mass(&bodies, &c) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_point_acceleration_centripetal() {
        let a = point_acceleration(Vec2::ZERO, 0.0, 2.0, Vec2::new(1.0, 0.0));
        assert!(a.nearly_equal(Vec2::new(-4.0, 0.0), EPSILON));
    }
}
