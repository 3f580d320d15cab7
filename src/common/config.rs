//! Tolerances and solver settings.
//!
//! Per-body settings ([`Tolerances`], elasticity) live on each body; the
//! settings that govern a whole simulation live in [`SimConfig`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default gap below which two features are considered touching.
pub const DEFAULT_DISTANCE_TOL: f64 = 0.01;
/// Default normal speed below which a touching pair is a resting contact.
pub const DEFAULT_VELOCITY_TOL: f64 = 0.5;
/// Default collision accuracy, as a fraction of `distance_tol / 2`.
pub const DEFAULT_ACCURACY: f64 = 0.6;

/// Collision tolerances carried by each body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tolerances {
    /// Separation below which a feature pair produces a collision record.
    pub distance: f64,
    /// Normal speed below which a touching pair counts as a resting contact.
    pub velocity: f64,
    /// Fraction of `distance / 2` within which a collision is close enough
    /// to the target gap to be handled.
    pub accuracy: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            distance: DEFAULT_DISTANCE_TOL,
            velocity: DEFAULT_VELOCITY_TOL,
            accuracy: DEFAULT_ACCURACY,
        }
    }
}

impl Tolerances {
    /// Combines the tolerances of the two bodies in a collision: the larger
    /// distance and velocity tolerance, the stricter accuracy.
    pub fn combine(&self, other: &Tolerances) -> Tolerances {
        Tolerances {
            distance: self.distance.max(other.distance),
            velocity: self.velocity.max(other.velocity),
            accuracy: self.accuracy.min(other.accuracy),
        }
    }

    /// Gap the collision handler aims for: half the distance tolerance.
    pub fn target_gap(&self) -> f64 {
        self.distance / 2.0
    }

    /// Half-width of the band around the target gap that is close enough.
    pub fn accuracy_band(&self) -> f64 {
        self.accuracy * self.distance / 2.0
    }
}

/// How simultaneous collisions are resolved into impulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CollisionPolicy {
    /// One collision at a time, re-checking after each impulse.
    Serial,
    /// One linear system across every active collision.
    Simultaneous,
    /// Simultaneous within connected groups of bodies, serial across groups.
    #[default]
    Hybrid,
}

/// Stabilization added to the contact-force target acceleration so that
/// resting contacts drift back toward the target gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExtraAccel {
    /// Pure zero-acceleration constraint.
    None,
    /// Also cancel residual normal velocity within one step.
    Velocity,
    /// Cancel residual velocity and pull the gap toward the target.
    #[default]
    VelocityAndDistance,
}

/// Settings for a whole simulation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimConfig {
    /// Collision-handling policy.
    pub policy: CollisionPolicy,
    /// Contact stabilization mode.
    pub extra_accel: ExtraAccel,
    /// Whether resting contacts receive continuous reaction forces.
    pub contact_forces: bool,
    /// Closing speeds below this never receive an impulse.
    pub small_impact: f64,
    /// Largest separating speed the gap stabilization may ask for when
    /// pulling a resting contact back to its target gap.
    pub max_correction_speed: f64,
    /// Halvings allowed while isolating one collision instant.
    pub max_bisections: usize,
    /// Sub-steps allowed within a single `advance` call.
    pub max_sub_steps: usize,
    /// Serial impulses allowed before switching to panic mode.
    pub serial_iteration_limit: usize,
    /// Simultaneous retries allowed in panic mode.
    pub panic_retry_limit: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            policy: CollisionPolicy::default(),
            extra_accel: ExtraAccel::default(),
            contact_forces: true,
            small_impact: 1e-4,
            max_correction_speed: 0.05,
            max_bisections: 64,
            max_sub_steps: 10_000,
            serial_iteration_limit: 1_000,
            panic_retry_limit: 20,
        }
    }
}

impl SimConfig {
    /// Default settings with the given collision policy.
    #[must_use]
    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self { policy, ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_default_tolerances() {
        let tol = Tolerances::default();
        assert_eq!(tol.distance, 0.01);
        assert_eq!(tol.velocity, 0.5);
        assert_eq!(tol.accuracy, 0.6);
        assert!((tol.target_gap() - 0.005).abs() < EPSILON);
        assert!((tol.accuracy_band() - 0.003).abs() < EPSILON);
    }

    #[test]
    fn test_combine_tolerances() {
        let a = Tolerances { distance: 0.02, velocity: 0.1, accuracy: 0.6 };
        let b = Tolerances { distance: 0.01, velocity: 0.5, accuracy: 0.4 };
        let c = a.combine(&b);
        assert_eq!(c.distance, 0.02);
        assert_eq!(c.velocity, 0.5);
        assert_eq!(c.accuracy, 0.4);
    }

    #[test]
    fn test_config_with_policy() {
        let config = SimConfig::with_policy(CollisionPolicy::Serial);
        assert_eq!(config.policy, CollisionPolicy::Serial);
        assert!(config.contact_forces);
        assert_eq!(config.extra_accel, ExtraAccel::VelocityAndDistance);
    }
}
