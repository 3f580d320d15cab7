use crate::math::vec2::Vec2;

/// A point on a body's boundary, in body coordinates.
///
/// End points join two edges: `edge1` ends here and `edge2` starts here.
/// Synthesized mid-points sit on a curved edge and have that edge as both
/// neighbors; they only take part in approximate checks such as per-step
/// travel and crossing detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    location: Vec2,
    end_point: bool,
    pub(crate) edge1: Option<usize>,
    pub(crate) edge2: Option<usize>,
}

impl Vertex {
    pub(crate) fn end_point(location: Vec2) -> Self {
        Self { location, end_point: true, edge1: None, edge2: None }
    }

    pub(crate) fn mid_point(location: Vec2, edge: usize) -> Self {
        Self { location, end_point: false, edge1: Some(edge), edge2: Some(edge) }
    }

    /// Location in body coordinates.
    pub fn location(&self) -> Vec2 {
        self.location
    }

    pub fn is_end_point(&self) -> bool {
        self.end_point
    }

    /// Index of the edge that ends at this vertex.
    pub fn edge1(&self) -> Option<usize> {
        self.edge1
    }

    /// Index of the edge that starts at this vertex.
    pub fn edge2(&self) -> Option<usize> {
        self.edge2
    }
}
