pub mod collision_advance;
pub mod rigid_body_sim;

pub use collision_advance::{AdvanceStats, CollisionAdvance};
pub use rigid_body_sim::{EnergyInfo, RigidBodySim, SimState, VARS_PER_BODY};
