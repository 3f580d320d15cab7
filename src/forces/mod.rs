use std::fmt;

use crate::math::vec2::Vec2;
use crate::objects::Body;

pub mod damping;
pub mod gravity;
pub mod spring;

pub use damping::Damping;
pub use gravity::Gravity;
pub use spring::{Spring, SpringEnd};

/// A force acting on one body at a world location, plus a pure torque.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Force {
    /// Index of the body in the simulation's body list.
    pub body: usize,
    pub location: Vec2,
    pub vector: Vec2,
    pub torque: f64,
}

/// Something that produces forces from the current state of the bodies.
pub trait ForceLaw: fmt::Debug {
    fn forces(&self, bodies: &[Body]) -> Vec<Force>;

    /// Stored energy of the law, zero for dissipative laws.
    fn potential_energy(&self, _bodies: &[Body]) -> f64 {
        0.0
    }

    fn name(&self) -> &str;
}
