pub mod contact_forces;
pub mod grouping;
pub mod impulses;
pub mod matrix;

pub use contact_forces::{apply_contact_forces, BodyAccel};
pub use grouping::group_collisions;
pub use impulses::{apply_impulse, handle_collisions, Resolution};
pub use matrix::{effective_inverse_mass, influence_matrix};
