pub mod circle;
pub mod edge;
pub mod factory;
pub mod line_segment;
pub mod polygon;
pub mod vertex;

pub use circle::CircularArc;
pub use edge::{Edge, EdgeShape};
pub use factory::ShapeFactory;
pub use line_segment::LineSegment;
pub use polygon::PolygonOutline;
pub use vertex::Vertex;
