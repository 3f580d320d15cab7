pub mod linear;
pub mod transform;
pub mod vec2;

pub use linear::solve_dense;
pub use transform::Pose;
pub use vec2::Vec2;
