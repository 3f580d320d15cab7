use std::cell::Cell;

use crate::math::vec2::Vec2;

use super::circle::CircularArc;
use super::line_segment::LineSegment;

/// The geometric kind of an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeShape {
    Straight(LineSegment),
    Circular(CircularArc),
}

impl EdgeShape {
    pub fn start_point(&self) -> Vec2 {
        match self {
            EdgeShape::Straight(seg) => seg.a,
            EdgeShape::Circular(arc) => arc.start,
        }
    }

    pub fn end_point(&self) -> Vec2 {
        match self {
            EdgeShape::Straight(seg) => seg.b,
            EdgeShape::Circular(arc) => arc.end,
        }
    }

    /// Signed distance from the edge, positive outside the body. `None`
    /// when the point does not project onto (or face) the edge.
    pub fn signed_distance(&self, point: Vec2) -> Option<f64> {
        match self {
            EdgeShape::Straight(seg) => seg.signed_distance(point),
            EdgeShape::Circular(arc) => arc.signed_distance(point),
        }
    }

    /// Outward unit normal at the edge point nearest to `point`.
    pub fn outward_normal_at(&self, point: Vec2) -> Vec2 {
        match self {
            EdgeShape::Straight(seg) => seg.outward_normal(),
            EdgeShape::Circular(arc) => arc.outward_normal_at(point),
        }
    }

    /// Whether `point` is on the inner side of the edge's line or circle.
    /// Only meaningful for convex bodies.
    pub fn is_inside(&self, point: Vec2) -> bool {
        match self {
            EdgeShape::Straight(seg) => seg.signed_line_distance(point) <= 0.0,
            EdgeShape::Circular(arc) => {
                let d = point.distance(arc.center);
                if arc.is_convex() {
                    d <= arc.radius
                } else {
                    d >= arc.radius
                }
            }
        }
    }

    /// Gap between the true edge and the chords through its vertices.
    pub fn chord_error(&self) -> f64 {
        match self {
            EdgeShape::Straight(_) => 0.0,
            EdgeShape::Circular(arc) => arc.chord_error(),
        }
    }

    fn enclosing_circle(&self) -> (Vec2, f64) {
        match self {
            EdgeShape::Straight(seg) => (seg.midpoint(), seg.length() / 2.0),
            EdgeShape::Circular(arc) => arc.enclosing_circle(),
        }
    }
}

/// One edge of a body, owned by the body's edge arena.
///
/// Edges are shape-immutable once added. The only mutable state is the
/// world-coordinate centroid cache, which is keyed on the owning body's
/// pose version and recomputed lazily after the body moves.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    index: usize,
    pub(crate) vertex1: usize,
    pub(crate) vertex2: usize,
    shape: EdgeShape,
    centroid_body: Vec2,
    centroid_radius: f64,
    world_centroid: Cell<Option<(u64, Vec2)>>,
}

impl Edge {
    pub(crate) fn new(index: usize, vertex1: usize, vertex2: usize, shape: EdgeShape) -> Self {
        let (centroid_body, centroid_radius) = shape.enclosing_circle();
        Self {
            index,
            vertex1,
            vertex2,
            shape,
            centroid_body,
            centroid_radius,
            world_centroid: Cell::new(None),
        }
    }

    /// Construction-order index within the owning body.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Index of the start vertex in the owning body's vertex list.
    pub fn vertex1(&self) -> usize {
        self.vertex1
    }

    /// Index of the end vertex in the owning body's vertex list.
    pub fn vertex2(&self) -> usize {
        self.vertex2
    }

    pub fn shape(&self) -> &EdgeShape {
        &self.shape
    }

    pub fn is_straight(&self) -> bool {
        matches!(self.shape, EdgeShape::Straight(_))
    }

    /// Center of the circle enclosing this edge, body coordinates.
    pub fn centroid_body(&self) -> Vec2 {
        self.centroid_body
    }

    /// Radius of the circle enclosing this edge. Zero means the edge is
    /// excluded from proximity testing.
    pub fn centroid_radius(&self) -> f64 {
        self.centroid_radius
    }

    pub(crate) fn set_centroid_radius(&mut self, radius: f64) {
        self.centroid_radius = radius;
    }

    /// World-coordinate centroid for the body pose identified by
    /// `pose_version`, computing it with `to_world` on a cache miss.
    pub fn centroid_world(&self, pose_version: u64, to_world: impl FnOnce(Vec2) -> Vec2) -> Vec2 {
        match self.world_centroid.get() {
            Some((version, centroid)) if version == pose_version => centroid,
            _ => {
                let centroid = to_world(self.centroid_body);
                self.world_centroid.set(Some((pose_version, centroid)));
                centroid
            }
        }
    }

    /// Pose version the world centroid cache was last filled for.
    #[cfg(test)]
    pub(crate) fn cached_pose_version(&self) -> Option<u64> {
        self.world_centroid.get().map(|(version, _)| version)
    }
}
