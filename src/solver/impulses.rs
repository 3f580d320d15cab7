//! Impulses that reverse closing velocities at collisions.
//!
//! A collision closing at normal velocity `v < 0` wants `v' = -e v`, so
//! the impulses solve `A j = -(1 + e) v` with `j >= 0`. Elasticity is the
//! smaller of the two bodies' and is zero for approaches slower than the
//! velocity tolerance.

use nalgebra::DVector;

use crate::collision::Collision;
use crate::common::{CollisionPolicy, SimConfig};
use crate::error::SolverError;
use crate::objects::Body;

use super::contact_forces::solve_nonnegative;
use super::grouping::group_collisions;
use super::matrix::{effective_inverse_mass, influence_matrix, participants};

/// Outcome of one round of impulse handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No collision is closing any more.
    Resolved { impulses: usize },
    /// Panic mode ran out of retries with collisions still closing.
    Stuck { attempts: usize, remaining: usize },
}

/// Applies impulses to `bodies` until no collision in `collisions` closes
/// faster than `small_impact`, using the configured policy.
pub fn handle_collisions(
    bodies: &mut [Body],
    collisions: &mut [Collision],
    config: &SimConfig,
) -> Result<Resolution, SolverError> {
    let resolution = match config.policy {
        CollisionPolicy::Serial => serial(bodies, collisions, config),
        CollisionPolicy::Simultaneous => {
            let all: Vec<usize> = (0..collisions.len()).collect();
            simultaneous(bodies, collisions, config, |_, _| vec![all.clone()])
        }
        CollisionPolicy::Hybrid => simultaneous(bodies, collisions, config, group_collisions),
    }?;
    if let Resolution::Resolved { impulses } = resolution {
        if impulses > 0 {
            tracing::debug!(impulses, policy = ?config.policy, "collisions resolved");
        }
    }
    Ok(resolution)
}

/// Pushes `bodies` apart at `collision` with impulse magnitude `j`.
pub fn apply_impulse(bodies: &mut [Body], collision: &mut Collision, j: f64) {
    for p in participants(collision) {
        bodies[p.body].apply_impulse(collision.normal * (p.sign * j), p.offset);
    }
    collision.impulse += j;
}

fn refresh(bodies: &[Body], collisions: &mut [Collision]) {
    for c in collisions.iter_mut() {
        c.update_velocity(bodies);
    }
}

fn needs_impulse(bodies: &[Body], c: &Collision, config: &SimConfig) -> bool {
    c.needs_impulse(config.small_impact) && effective_inverse_mass(bodies, c) > 0.0
}

/// Deterministic order for serial handling: smallest gap first, then the
/// fastest closing, then body indices, then edge and feature indices.
fn serial_order(a: &Collision, b: &Collision) -> std::cmp::Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then(a.normal_velocity.total_cmp(&b.normal_velocity))
        .then(a.primary.cmp(&b.primary))
        .then(a.normal_body.cmp(&b.normal_body))
        .then(a.normal_edge.cmp(&b.normal_edge))
        .then(a.primary_feature.cmp(&b.primary_feature))
}

fn first_needing(bodies: &[Body], collisions: &[Collision], config: &SimConfig) -> Option<usize> {
    (0..collisions.len())
        .filter(|&i| needs_impulse(bodies, &collisions[i], config))
        .min_by(|&i, &j| serial_order(&collisions[i], &collisions[j]))
}

/// One collision at a time, re-checking every collision after each impulse.
fn serial(bodies: &mut [Body], collisions: &mut [Collision], config: &SimConfig) -> Result<Resolution, SolverError> {
    let mut impulses = 0;
    for _ in 0..config.serial_iteration_limit {
        refresh(bodies, collisions);
        let Some(i) = first_needing(bodies, collisions, config) else {
            return Ok(Resolution::Resolved { impulses });
        };
        single_impulse(bodies, &mut collisions[i]);
        impulses += 1;
    }
    tracing::warn!(
        limit = config.serial_iteration_limit,
        "serial collision handling did not settle, entering panic mode"
    );
    panic_mode(bodies, collisions, config, impulses)
}

/// Resolves one collision on its own, ignoring every other contact.
fn single_impulse(bodies: &mut [Body], c: &mut Collision) {
    let j = -(1.0 + c.effective_elasticity()) * c.normal_velocity / effective_inverse_mass(bodies, c);
    tracing::trace!(collision = %c, impulse = j, "serial impulse");
    apply_impulse(bodies, c, j);
}

/// Falls back to a single serial impulse at `first` when the group solve
/// failed. Returns the number of impulses applied.
fn recover_group(
    bodies: &mut [Body],
    collisions: &mut [Collision],
    first: usize,
    solved: Result<usize, SolverError>,
) -> usize {
    match solved {
        Ok(applied) => applied,
        Err(err) => {
            tracing::debug!(%err, collision = %collisions[first], "group solve failed, applying a serial impulse");
            single_impulse(bodies, &mut collisions[first]);
            1
        }
    }
}

/// Simultaneous solves over the groups produced by `grouping`, taken one
/// group at a time in the serial order of their most urgent collision.
fn simultaneous(
    bodies: &mut [Body],
    collisions: &mut [Collision],
    config: &SimConfig,
    grouping: impl Fn(&[Body], &[Collision]) -> Vec<Vec<usize>>,
) -> Result<Resolution, SolverError> {
    let mut impulses = 0;
    for _ in 0..config.serial_iteration_limit {
        refresh(bodies, collisions);
        let Some(first) = first_needing(bodies, collisions, config) else {
            return Ok(Resolution::Resolved { impulses });
        };
        let groups = grouping(bodies, collisions);
        let group = groups.into_iter().find(|g| g.contains(&first)).unwrap_or_else(|| vec![first]);
        let solved = solve_group(bodies, collisions, &group);
        impulses += recover_group(bodies, collisions, first, solved);
    }
    tracing::warn!(
        limit = config.serial_iteration_limit,
        "simultaneous collision handling did not settle, entering panic mode"
    );
    panic_mode(bodies, collisions, config, impulses)
}

/// One simultaneous impulse solve over the closing collisions of `group`.
/// Returns the number of impulses applied.
fn solve_group(bodies: &mut [Body], collisions: &mut [Collision], group: &[usize]) -> Result<usize, SolverError> {
    let closing: Vec<usize> = group
        .iter()
        .copied()
        .filter(|&i| collisions[i].normal_velocity < 0.0 && effective_inverse_mass(bodies, &collisions[i]) > 0.0)
        .collect();
    if closing.is_empty() {
        return Ok(0);
    }
    let selected: Vec<&Collision> = closing.iter().map(|&i| &collisions[i]).collect();
    let a = influence_matrix(bodies, &selected);
    let rhs = DVector::from_iterator(
        selected.len(),
        selected.iter().map(|c| -(1.0 + c.effective_elasticity()) * c.normal_velocity),
    );
    let (j, _) = solve_nonnegative(&a, &rhs)?;

    let mut applied = 0;
    for (k, &i) in closing.iter().enumerate() {
        if j[k] > 0.0 {
            apply_impulse(bodies, &mut collisions[i], j[k]);
            applied += 1;
        }
    }
    if applied == 0 {
        return Err(SolverError::NoAdmissibleSolution { contacts: closing.len() });
    }
    tracing::trace!(contacts = closing.len(), applied, "simultaneous impulses");
    Ok(applied)
}

/// Bounded fallback: simultaneous solves across every closing collision.
fn panic_mode(
    bodies: &mut [Body],
    collisions: &mut [Collision],
    config: &SimConfig,
    mut impulses: usize,
) -> Result<Resolution, SolverError> {
    let all: Vec<usize> = (0..collisions.len()).collect();
    for attempt in 1..=config.panic_retry_limit {
        refresh(bodies, collisions);
        if first_needing(bodies, collisions, config).is_none() {
            tracing::debug!(attempt, "panic mode resolved collisions");
            return Ok(Resolution::Resolved { impulses });
        }
        match solve_group(bodies, collisions, &all) {
            Ok(applied) => impulses += applied,
            Err(err) => tracing::warn!(attempt, %err, "panic mode solve failed"),
        }
    }
    refresh(bodies, collisions);
    let remaining = collisions.iter().filter(|c| needs_impulse(bodies, c, config)).count();
    if remaining == 0 {
        Ok(Resolution::Resolved { impulses })
    } else {
        Ok(Resolution::Stuck { attempts: config.panic_retry_limit, remaining })
    }
}
