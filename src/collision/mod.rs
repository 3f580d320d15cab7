pub mod aabb;
pub mod detection;
pub mod manifold;
pub mod proximity;

// Re-export key types
pub use aabb::AABB;
pub use detection::CollisionDetector;
pub use manifold::{Collision, Feature, NormalMotion};
pub use proximity::ProximityFilter;
