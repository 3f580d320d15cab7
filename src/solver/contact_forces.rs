//! Continuous reaction forces at resting contacts.
//!
//! For contacts with near-zero normal velocity the solver finds force
//! magnitudes `f >= 0` such that each contact's gap accelerates at the
//! desired rate: `A f = a_desired - b`. Here `b` is the gap acceleration
//! without contact forces:
//!
//! `b = n . (a1 - a2) + 2 n' . (v1 - v2)`
//!
//! with point accelerations `a = a_cm + alpha x r - omega^2 r`.

use nalgebra::{DMatrix, DVector};

use crate::collision::Collision;
use crate::common::{ExtraAccel, SimConfig};
use crate::error::SolverError;
use crate::math::linear::solve_dense;
use crate::math::vec2::Vec2;
use crate::objects::Body;

use super::matrix::{influence_matrix, participants, point_acceleration};

/// Linear and angular acceleration of one body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyAccel {
    pub linear: Vec2,
    pub angular: f64,
}

/// Solves `a x = rhs` for `x >= 0` by repeatedly dropping the most negative
/// entry and re-solving the reduced system. Dropped entries are zero.
pub(crate) fn solve_nonnegative(a: &DMatrix<f64>, rhs: &DVector<f64>) -> Result<(DVector<f64>, Vec<bool>), SolverError> {
    let n = rhs.len();
    let mut active = vec![true; n];
    let mut result = DVector::zeros(n);
    loop {
        let index: Vec<usize> = (0..n).filter(|&i| active[i]).collect();
        result.fill(0.0);
        if index.is_empty() {
            return Ok((result, active));
        }
        let sub_a = a.select_rows(&index).select_columns(&index);
        let sub_rhs = rhs.select_rows(&index);
        let x = solve_dense(&sub_a, &sub_rhs)?;
        for (k, &i) in index.iter().enumerate() {
            result[i] = x[k];
        }

        let most_negative = index
            .iter()
            .copied()
            .filter(|&i| result[i] < 0.0)
            .min_by(|&i, &j| result[i].total_cmp(&result[j]));
        match most_negative {
            Some(i) => {
                tracing::trace!(contact = i, value = result[i], "dropping contact with negative solution");
                active[i] = false;
            }
            None => return Ok((result, active)),
        }
    }
}

/// Desired gap acceleration for a resting contact.
///
/// `time_step` is the interval over which residual velocity and gap error
/// are cancelled. The gap correction is limited to `max_correction_speed`
/// so that a contact pulled back toward its target gap never leaves with
/// more than that separating speed.
fn desired_acceleration(collision: &Collision, extra: ExtraAccel, max_correction_speed: f64, time_step: f64) -> f64 {
    if time_step <= 0.0 {
        return 0.0;
    }
    match extra {
        ExtraAccel::None => 0.0,
        ExtraAccel::Velocity => -collision.normal_velocity / time_step,
        ExtraAccel::VelocityAndDistance => {
            let error = collision.distance - collision.tolerances.target_gap();
            let speed = max_correction_speed.max(0.0);
            let correction = (-2.0 * error / time_step).clamp(-speed, speed);
            (correction - collision.normal_velocity) / time_step
        }
    }
}

/// Gap acceleration at a contact when no contact force acts.
fn free_gap_acceleration(bodies: &[Body], accels: &[BodyAccel], collision: &Collision) -> f64 {
    let b1 = &bodies[collision.primary];
    let b2 = &bodies[collision.normal_body];
    let acc1 = accels[collision.primary];
    let acc2 = accels[collision.normal_body];
    let a1 = point_acceleration(acc1.linear, acc1.angular, b1.angular_velocity(), collision.r1);
    let a2 = point_acceleration(acc2.linear, acc2.angular, b2.angular_velocity(), collision.r2);
    let dv = collision.relative_velocity(bodies);
    collision.normal.dot(a1 - a2) + 2.0 * collision.normal_derivative(bodies).dot(dv)
}

/// Computes contact forces for the resting contacts among `collisions`,
/// stores each magnitude in `Collision::force` and adds the resulting
/// accelerations into `accels`. Returns the number of contacts that ended
/// up carrying a force.
///
/// `time_step` sets the stabilization horizon of `config.extra_accel`. Pass
/// the caller's outer step, not a bisected trial step.
pub fn apply_contact_forces(
    bodies: &[Body],
    collisions: &mut [Collision],
    accels: &mut [BodyAccel],
    config: &SimConfig,
    time_step: f64,
) -> Result<usize, SolverError> {
    for c in collisions.iter_mut() {
        c.force = 0.0;
    }
    let contacts: Vec<usize> = (0..collisions.len())
        .filter(|&i| {
            let c = &collisions[i];
            c.is_contact() && !(bodies[c.primary].is_fixed() && bodies[c.normal_body].is_fixed())
        })
        .collect();
    if contacts.is_empty() {
        return Ok(0);
    }

    let selected: Vec<&Collision> = contacts.iter().map(|&i| &collisions[i]).collect();
    let a = influence_matrix(bodies, &selected);
    let rhs = DVector::from_iterator(
        selected.len(),
        selected
            .iter()
            .map(|c| {
                desired_acceleration(c, config.extra_accel, config.max_correction_speed, time_step)
                    - free_gap_acceleration(bodies, accels, c)
            }),
    );
    let (forces, active) = solve_nonnegative(&a, &rhs)?;
    let dropped = active.iter().filter(|a| !**a).count();
    if dropped > 0 {
        tracing::debug!(dropped, contacts = contacts.len(), "contacts dropped from force solve");
    }

    let mut carrying = 0;
    for (k, &i) in contacts.iter().enumerate() {
        let f = forces[k];
        let c = &mut collisions[i];
        c.force = f;
        if f <= 0.0 {
            continue;
        }
        carrying += 1;
        for p in participants(c) {
            let body = &bodies[p.body];
            let push = c.normal * (p.sign * f);
            accels[p.body].linear += push * body.inv_mass();
            accels[p.body].angular += p.offset.cross(push) * body.inv_moment();
        }
    }
    Ok(carrying)
}
