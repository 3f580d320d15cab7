pub mod body;
pub mod centroid;

pub use body::{Body, BodyId, OldCopy, VERTEX_MATCH_TOL};
