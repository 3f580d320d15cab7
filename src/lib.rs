//! 2D rigid-body simulation with exact straight and circular edge
//! geometry, resting-contact forces and event-driven collision handling.

pub mod collision;
pub mod common;
pub mod error;
pub mod forces;
pub mod integration;
pub mod math;
pub mod objects;
pub mod shapes;
pub mod solver;
pub mod world;

// Re-export key types for easier use
pub use collision::{Collision, CollisionDetector, Feature, ProximityFilter};
pub use common::{CollisionPolicy, ExtraAccel, SimConfig, Tolerances};
pub use error::{ConvergenceError, GeometryError, PhysicsError, SolverError, StuckError};
pub use forces::{Damping, Force, ForceLaw, Gravity, Spring, SpringEnd};
pub use integration::{DiffEqSolver, ModifiedEuler, OdeSystem, RungeKutta};
pub use math::{Pose, Vec2};
pub use objects::{Body, BodyId};
pub use shapes::{EdgeShape, ShapeFactory};
pub use world::{CollisionAdvance, EnergyInfo, RigidBodySim};
