use std::cell::Cell;
use std::collections::BTreeSet;
use std::fmt;

use crate::collision::AABB;
use crate::common::Tolerances;
use crate::error::GeometryError;
use crate::math::{Pose, Vec2};
use crate::shapes::{CircularArc, Edge, EdgeShape, LineSegment, Vertex};

use super::centroid;

/// Distance within which two vertices count as the same point.
pub const VERTEX_MATCH_TOL: f64 = 1e-8;

/// Stable identity of a body, handed out by whoever creates bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of a body's pose and velocity taken once per step, used to
/// reason about how a collision came about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OldCopy {
    pub pose: Pose,
    pub velocity: Vec2,
    pub angular_velocity: f64,
    cm_body: Vec2,
}

impl OldCopy {
    /// Where a body-coordinate point was when the snapshot was taken.
    pub fn body_to_world(&self, point: Vec2) -> Vec2 {
        self.pose.apply(point - self.cm_body)
    }

    /// Body coordinates of a world point relative to the snapshot pose.
    pub fn world_to_body(&self, point: Vec2) -> Vec2 {
        self.pose.apply_inverse(point) + self.cm_body
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SpecialEdge {
    edge: usize,
    radius: f64,
    normal_body: Vec2,
    normal_world: Cell<Option<(u64, Vec2)>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenPath {
    start_vertex: usize,
    last_vertex: usize,
    first_edge: Option<usize>,
}

/// A rigid body whose boundary is one or more closed paths of straight and
/// circular edges.
///
/// Vertices and edges live in per-body arenas and refer to each other by
/// index. A body is built with [`Body::start_path`], the `add_*_edge`
/// methods and [`Body::close_path`], then locked with [`Body::finish`].
#[derive(Debug, Clone)]
pub struct Body {
    id: BodyId,
    name: String,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    paths: Vec<usize>,
    open_path: Option<OpenPath>,
    finished: bool,

    bounds: AABB,
    centroid_body: Vec2,
    centroid_radius: f64,
    /// Largest distance from the center of mass to any boundary point.
    max_radius_cm: f64,
    max_chord_error: f64,
    cm_body: Vec2,
    cm_explicit: bool,
    drag_points: Vec<Vec2>,

    mass: f64,
    moment: f64,
    moment_explicit: bool,

    pose: Pose,
    pose_version: u64,
    velocity: Vec2,
    angular_velocity: f64,

    elasticity: f64,
    tolerances: Tolerances,
    special: Option<SpecialEdge>,
    non_collide_bodies: BTreeSet<BodyId>,
    non_collide_edges: BTreeSet<usize>,
    old_copy: Option<OldCopy>,
}

impl Body {
    /// Creates an empty body with unit mass at the origin.
    pub fn new(id: BodyId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            vertices: Vec::new(),
            edges: Vec::new(),
            paths: Vec::new(),
            open_path: None,
            finished: false,
            bounds: AABB::new(Vec2::ZERO, Vec2::ZERO),
            centroid_body: Vec2::ZERO,
            centroid_radius: 0.0,
            max_radius_cm: 0.0,
            max_chord_error: 0.0,
            cm_body: Vec2::ZERO,
            cm_explicit: false,
            drag_points: Vec::new(),
            mass: 1.0,
            moment: 1.0,
            moment_explicit: false,
            pose: Pose::identity(),
            pose_version: 0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            elasticity: 1.0,
            tolerances: Tolerances::default(),
            special: None,
            non_collide_bodies: BTreeSet::new(),
            non_collide_edges: BTreeSet::new(),
            old_copy: None,
        }
    }

    // --- Construction ---

    fn ensure_unfinished(&self) -> Result<(), GeometryError> {
        if self.finished {
            Err(GeometryError::AlreadyFinished)
        } else {
            Ok(())
        }
    }

    /// Opens a new path at `start` (body coordinates). Returns the index of
    /// the start vertex.
    pub fn start_path(&mut self, start: Vec2) -> Result<usize, GeometryError> {
        self.ensure_unfinished()?;
        if self.open_path.is_some() {
            return Err(GeometryError::PathAlreadyOpen);
        }
        let vertex = self.vertices.len();
        self.vertices.push(Vertex::end_point(start));
        self.open_path = Some(OpenPath { start_vertex: vertex, last_vertex: vertex, first_edge: None });
        Ok(vertex)
    }

    /// Opens a new path whose first edge is `shape`.
    pub fn start_path_with_edge(&mut self, shape: EdgeShape) -> Result<usize, GeometryError> {
        self.start_path(shape.start_point())?;
        self.add_edge(shape)
    }

    /// Appends an edge to the open path. The edge must start at the path's
    /// last vertex. Returns the new edge's index.
    pub fn add_edge(&mut self, shape: EdgeShape) -> Result<usize, GeometryError> {
        self.ensure_unfinished()?;
        let mut path = self.open_path.ok_or(GeometryError::OpenPathRequired)?;
        let index = self.edges.len();
        let last = self.vertices[path.last_vertex].location();
        if last.distance(shape.start_point()) > VERTEX_MATCH_TOL {
            return Err(GeometryError::EdgeNotConnected { edge: index });
        }

        if let EdgeShape::Circular(arc) = &shape {
            for point in arc.interior_points() {
                self.vertices.push(Vertex::mid_point(point, index));
            }
        }
        let end_vertex = self.vertices.len();
        self.vertices.push(Vertex::end_point(shape.end_point()));

        self.vertices[path.last_vertex].edge2 = Some(index);
        self.vertices[end_vertex].edge1 = Some(index);
        self.edges.push(Edge::new(index, path.last_vertex, end_vertex, shape));

        path.last_vertex = end_vertex;
        path.first_edge.get_or_insert(index);
        self.open_path = Some(path);
        Ok(index)
    }

    /// Adds a straight edge from the path's last vertex to `end`.
    pub fn add_straight_edge(&mut self, end: Vec2) -> Result<usize, GeometryError> {
        self.ensure_unfinished()?;
        let path = self.open_path.ok_or(GeometryError::OpenPathRequired)?;
        let start = self.vertices[path.last_vertex].location();
        if start.distance(end) < VERTEX_MATCH_TOL {
            return Err(GeometryError::degenerate("straight edge has zero length"));
        }
        self.add_edge(EdgeShape::Straight(LineSegment::new(start, end)))
    }

    /// Adds a circular edge from the path's last vertex to `end` around
    /// `center`. Travelling clockwise about the center makes a concave edge.
    pub fn add_circular_edge(&mut self, end: Vec2, center: Vec2, clockwise: bool) -> Result<usize, GeometryError> {
        self.ensure_unfinished()?;
        let path = self.open_path.ok_or(GeometryError::OpenPathRequired)?;
        let start = self.vertices[path.last_vertex].location();
        let arc = CircularArc::new(start, end, center, clockwise)?;
        self.add_edge(EdgeShape::Circular(arc))
    }

    /// Connects the open path's last edge back to its start vertex. The
    /// duplicate end vertex is merged into the start vertex.
    pub fn close_path(&mut self) -> Result<(), GeometryError> {
        self.ensure_unfinished()?;
        let path = self.open_path.ok_or(GeometryError::OpenPathRequired)?;
        if path.first_edge.is_none() {
            return Err(GeometryError::EmptyBody);
        }
        let start = self.vertices[path.start_vertex].location();
        let end = self.vertices[path.last_vertex].location();
        let gap = start.distance(end);
        if gap > VERTEX_MATCH_TOL {
            return Err(GeometryError::PathNotClosed { gap });
        }

        // The duplicate end vertex is always the most recently pushed one.
        let last_edge = self.vertices[path.last_vertex].edge1.ok_or(GeometryError::OpenPathRequired)?;
        self.vertices.pop();
        self.edges[last_edge].vertex2 = path.start_vertex;
        self.vertices[path.start_vertex].edge1 = Some(last_edge);

        self.paths.push(path.start_vertex);
        self.open_path = None;
        Ok(())
    }

    /// Locks construction and computes bounds, default mass properties and
    /// the centroid.
    pub fn finish(&mut self) -> Result<(), GeometryError> {
        self.ensure_unfinished()?;
        if let Some(path) = self.open_path {
            let start = self.vertices[path.start_vertex].location();
            let end = self.vertices[path.last_vertex].location();
            return Err(GeometryError::PathNotClosed { gap: start.distance(end) });
        }
        if self.paths.is_empty() || self.edges.is_empty() {
            return Err(GeometryError::EmptyBody);
        }

        let mut area = 0.0;
        for path in 0..self.paths.len() {
            let outline = self.path_outline(path)?;
            area += signed_area(&outline);
        }
        if area <= 0.0 {
            return Err(GeometryError::degenerate(
                "paths must run counter-clockwise around the body interior",
            ));
        }

        let extremes: Vec<Vec2> = self
            .edges
            .iter()
            .flat_map(|e| match e.shape() {
                EdgeShape::Straight(seg) => vec![seg.a, seg.b],
                EdgeShape::Circular(arc) => arc.extreme_points(),
            })
            .collect();
        self.bounds = AABB::from_points(&extremes).ok_or(GeometryError::EmptyBody)?;
        self.max_chord_error = self.edges.iter().fold(0.0_f64, |m, e| m.max(e.shape().chord_error()));

        if !self.cm_explicit {
            self.cm_body = self.bounds.center();
        }
        if !self.moment_explicit {
            self.moment = self.rectangular_moment();
        }
        if self.drag_points.is_empty() {
            self.drag_points.push(self.cm_body);
        }

        let points: Vec<Vec2> = self.vertices.iter().map(Vertex::location).collect();
        let (centroid, radius) = centroid::enclosing_circle(&points, self.max_chord_error, self.cm_body)?;
        self.centroid_body = centroid;
        self.centroid_radius = radius;
        self.update_max_radius();
        self.finished = true;

        tracing::debug!(
            body = %self.id,
            name = %self.name,
            edges = self.edges.len(),
            vertices = self.vertices.len(),
            centroid_radius = self.centroid_radius,
            "body finished"
        );
        Ok(())
    }

    /// Boundary of a path as a polygon, including mid-points on arcs.
    fn path_outline(&self, path: usize) -> Result<Vec<Vec2>, GeometryError> {
        let mut outline = Vec::new();
        for edge in self.walk_path(path)? {
            let shape = self.edges[edge].shape();
            outline.push(shape.start_point());
            if let EdgeShape::Circular(arc) = shape {
                outline.extend(arc.interior_points());
            }
        }
        Ok(outline)
    }

    /// Follows the `edge2`/`vertex2` links from the path's start vertex and
    /// returns the edges in order. Fails if the links do not come back to
    /// the start vertex.
    pub fn walk_path(&self, path: usize) -> Result<Vec<usize>, GeometryError> {
        let start = *self.paths.get(path).ok_or(GeometryError::EmptyBody)?;
        let mut edges = Vec::new();
        let mut vertex = start;
        loop {
            let edge = self.vertices[vertex].edge2.ok_or(GeometryError::PathNotClosed { gap: f64::NAN })?;
            edges.push(edge);
            vertex = self.edges[edge].vertex2;
            if vertex == start {
                return Ok(edges);
            }
            if edges.len() > self.edges.len() {
                return Err(GeometryError::PathNotClosed { gap: f64::NAN });
            }
        }
    }

    fn rectangular_moment(&self) -> f64 {
        let w = self.bounds.width();
        let h = self.bounds.height();
        self.mass * (w * w + h * h) / 12.0
    }

    fn update_max_radius(&mut self) {
        let far = self.vertices.iter().fold(0.0_f64, |m, v| m.max(v.location().distance(self.cm_body)));
        self.max_radius_cm = far + self.max_chord_error;
    }

    // --- Special edge and collision exclusions ---

    /// Marks one edge of a rectangular body as the only edge used for
    /// proximity testing. `radius` is the reach of the body measured from
    /// its centroid along the special edge's outward normal; it is raised
    /// to at least the distance of the special edge itself.
    pub fn set_special_edge(&mut self, edge: usize, radius: f64) -> Result<(), GeometryError> {
        if !self.finished {
            return Err(GeometryError::NotFinished);
        }
        if self.edges.len() != 4 || !self.edges.iter().all(Edge::is_straight) {
            return Err(GeometryError::SpecialEdgeRequiresRectangle);
        }
        let count = self.edges.len();
        let seg = match self.edges.get(edge).map(Edge::shape) {
            Some(EdgeShape::Straight(seg)) => *seg,
            Some(EdgeShape::Circular(_)) => return Err(GeometryError::SpecialEdgeRequiresRectangle),
            None => return Err(GeometryError::InvalidEdgeIndex { index: edge, count }),
        };
        let normal_body = seg.outward_normal();
        let reach = (seg.a - self.centroid_body).dot(normal_body);
        for other in self.edges.iter_mut().filter(|e| e.index() != edge) {
            other.set_centroid_radius(0.0);
        }
        self.special = Some(SpecialEdge {
            edge,
            radius: radius.max(reach),
            normal_body,
            normal_world: Cell::new(None),
        });
        Ok(())
    }

    /// Index of the special edge, if one is set.
    pub fn special_edge(&self) -> Option<usize> {
        self.special.as_ref().map(|s| s.edge)
    }

    /// Reach of the body along its special normal.
    pub fn special_radius(&self) -> Option<f64> {
        self.special.as_ref().map(|s| s.radius)
    }

    /// World-coordinate outward normal of the special edge, cached per pose.
    pub fn special_normal_world(&self) -> Option<Vec2> {
        let special = self.special.as_ref()?;
        match special.normal_world.get() {
            Some((version, normal)) if version == self.pose_version => Some(normal),
            _ => {
                let normal = self.pose.rotate(special.normal_body);
                special.normal_world.set(Some((self.pose_version, normal)));
                Some(normal)
            }
        }
    }

    /// Never collide with the given body.
    pub fn add_non_collide(&mut self, other: BodyId) {
        self.non_collide_bodies.insert(other);
    }

    pub fn remove_non_collide(&mut self, other: BodyId) {
        self.non_collide_bodies.remove(&other);
    }

    /// Excludes the given edges of this body from all collisions.
    pub fn set_non_collide_edges(&mut self, edges: impl IntoIterator<Item = usize>) -> Result<(), GeometryError> {
        let count = self.edges.len();
        let edges: BTreeSet<usize> = edges.into_iter().collect();
        if let Some(&bad) = edges.iter().find(|&&e| e >= count) {
            return Err(GeometryError::InvalidEdgeIndex { index: bad, count });
        }
        self.non_collide_edges = edges;
        Ok(())
    }

    /// Whether this body refuses collisions with `other` (either direction).
    pub fn does_not_collide(&self, other: &Body) -> bool {
        self.non_collide_bodies.contains(&other.id) || other.non_collide_bodies.contains(&self.id)
    }

    /// Whether the edge takes part in collisions at all.
    pub fn edge_collides(&self, edge: usize) -> bool {
        !self.non_collide_edges.contains(&edge) && self.edges.get(edge).is_some_and(|e| e.centroid_radius() > 0.0)
    }

    /// Whether the vertex is tested against other bodies' edges: at least
    /// one adjacent edge must collide.
    pub fn vertex_collides(&self, vertex: usize) -> bool {
        let v = &self.vertices[vertex];
        v.edge1.is_some_and(|e| self.edge_collides(e)) || v.edge2.is_some_and(|e| self.edge_collides(e))
    }

    // --- Queries ---

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, index: usize) -> Option<&Edge> {
        self.edges.get(index)
    }

    /// All vertices in body coordinates, including arc mid-points.
    pub fn vertices_body(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Start vertex of every path.
    pub fn path_starts(&self) -> &[usize] {
        &self.paths
    }

    pub fn centroid_body(&self) -> Vec2 {
        self.centroid_body
    }

    pub fn centroid_world(&self) -> Vec2 {
        self.body_to_world(self.centroid_body)
    }

    /// Radius of the smallest circle about the centroid enclosing the body,
    /// curved-edge error included.
    pub fn centroid_radius(&self) -> f64 {
        self.centroid_radius
    }

    pub fn bounds_body(&self) -> AABB {
        self.bounds
    }

    /// Largest distance from the center of mass to any boundary point.
    pub fn max_radius_from_cm(&self) -> f64 {
        self.max_radius_cm
    }

    /// World centroid of an edge, cached until the body moves.
    pub fn edge_centroid_world(&self, edge: usize) -> Vec2 {
        let e = &self.edges[edge];
        e.centroid_world(self.pose_version, |p| self.body_to_world(p))
    }

    pub fn vertex_world(&self, vertex: usize) -> Vec2 {
        self.body_to_world(self.vertices[vertex].location())
    }

    /// Approximate inside test, exact only for convex bodies.
    pub fn probably_point_inside(&self, point: Vec2) -> bool {
        if !self.bounds_contains_world(point) {
            return false;
        }
        let local = self.world_to_body(point);
        self.edges.iter().all(|e| e.shape().is_inside(local))
    }

    fn bounds_contains_world(&self, point: Vec2) -> bool {
        point.distance_squared(self.centroid_world()) <= self.centroid_radius * self.centroid_radius
    }

    // --- Pose and coordinates ---

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Increments every time the pose actually changes.
    pub fn pose_version(&self) -> u64 {
        self.pose_version
    }

    /// World location of the center of mass.
    pub fn position(&self) -> Vec2 {
        self.pose.position
    }

    pub fn angle(&self) -> f64 {
        self.pose.angle
    }

    /// Places the center of mass at `position` with rotation `angle`.
    /// A call that does not change the pose leaves caches intact.
    pub fn set_position(&mut self, position: Vec2, angle: f64) {
        let pose = Pose::new(position, angle);
        if !pose.same_placement(&self.pose) {
            self.pose = pose;
            self.pose_version += 1;
        }
    }

    pub fn body_to_world(&self, point: Vec2) -> Vec2 {
        self.pose.apply(point - self.cm_body)
    }

    pub fn world_to_body(&self, point: Vec2) -> Vec2 {
        self.pose.apply_inverse(point) + self.cm_body
    }

    /// Rotates a body-coordinate direction into world coordinates.
    pub fn rotate_body_to_world(&self, direction: Vec2) -> Vec2 {
        self.pose.rotate(direction)
    }

    pub fn rotate_world_to_body(&self, direction: Vec2) -> Vec2 {
        self.pose.rotate_inverse(direction)
    }

    // --- Velocity ---

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2, angular_velocity: f64) {
        self.velocity = velocity;
        self.angular_velocity = angular_velocity;
    }

    /// Velocity of the material point currently at world location `point`.
    pub fn world_velocity_of_point(&self, point: Vec2) -> Vec2 {
        self.velocity + Vec2::scalar_cross(self.angular_velocity, point - self.pose.position)
    }

    /// Applies an instantaneous impulse at `offset` from the center of mass.
    /// Fixed bodies are unaffected.
    pub fn apply_impulse(&mut self, impulse: Vec2, offset: Vec2) {
        self.velocity += impulse * self.inv_mass();
        self.angular_velocity += offset.cross(impulse) * self.inv_moment();
    }

    /// Velocity of a point given in body coordinates.
    pub fn world_velocity_of_body_point(&self, point: Vec2) -> Vec2 {
        self.world_velocity_of_point(self.body_to_world(point))
    }

    // --- Mass properties ---

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Zero for fixed (infinite-mass) bodies.
    pub fn inv_mass(&self) -> f64 {
        if self.mass.is_finite() {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    pub fn is_fixed(&self) -> bool {
        !self.mass.is_finite()
    }

    /// Moment of inertia about the center of mass.
    pub fn moment(&self) -> f64 {
        self.moment
    }

    pub fn inv_moment(&self) -> f64 {
        if self.moment.is_finite() && self.moment > 0.0 {
            1.0 / self.moment
        } else {
            0.0
        }
    }

    /// Sets the mass; `f64::INFINITY` makes the body fixed. A moment that was
    /// not set explicitly scales with the mass.
    pub fn set_mass(&mut self, mass: f64) -> Result<(), GeometryError> {
        if mass.is_nan() || mass <= 0.0 {
            return Err(GeometryError::invalid_mass(format!("mass must be positive, got {mass}")));
        }
        let old = self.mass;
        self.mass = mass;
        if !mass.is_finite() {
            self.moment = f64::INFINITY;
        } else if self.moment_explicit && old.is_finite() && self.moment.is_finite() {
            self.moment *= mass / old;
        } else {
            self.moment_explicit = false;
            self.moment = self.rectangular_moment();
        }
        Ok(())
    }

    /// Sets the moment of inertia about the center of mass.
    pub fn set_moment_about_cm(&mut self, moment: f64) -> Result<(), GeometryError> {
        if moment.is_nan() || moment <= 0.0 {
            return Err(GeometryError::invalid_mass(format!("moment must be positive, got {moment}")));
        }
        self.moment = moment;
        self.moment_explicit = true;
        Ok(())
    }

    pub fn cm_body(&self) -> Vec2 {
        self.cm_body
    }

    /// Moves the center of mass within the body. The body stays where it is
    /// in world space.
    pub fn set_center_of_mass(&mut self, cm_body: Vec2) {
        let world = self.body_to_world(cm_body);
        self.cm_body = cm_body;
        self.cm_explicit = true;
        self.pose = Pose::new(world, self.pose.angle);
        self.pose_version += 1;
        if self.finished {
            self.update_max_radius();
        }
    }

    pub fn drag_points(&self) -> &[Vec2] {
        &self.drag_points
    }

    pub fn set_drag_points(&mut self, points: Vec<Vec2>) {
        self.drag_points = points;
    }

    pub fn elasticity(&self) -> f64 {
        self.elasticity
    }

    /// Sets the elasticity, clamped to `[0, 1]`.
    pub fn set_elasticity(&mut self, elasticity: f64) {
        self.elasticity = elasticity.clamp(0.0, 1.0);
    }

    pub fn tolerances(&self) -> Tolerances {
        self.tolerances
    }

    pub fn set_tolerances(&mut self, tolerances: Tolerances) {
        self.tolerances = tolerances;
    }

    pub fn distance_tol(&self) -> f64 {
        self.tolerances.distance
    }

    pub fn velocity_tol(&self) -> f64 {
        self.tolerances.velocity
    }

    /// Kinetic energy of translation and rotation; zero for fixed bodies.
    pub fn kinetic_energy(&self) -> f64 {
        self.translational_energy() + self.rotational_energy()
    }

    pub fn translational_energy(&self) -> f64 {
        if self.is_fixed() {
            0.0
        } else {
            0.5 * self.mass * self.velocity.magnitude_squared()
        }
    }

    pub fn rotational_energy(&self) -> f64 {
        if self.is_fixed() || !self.moment.is_finite() {
            0.0
        } else {
            0.5 * self.moment * self.angular_velocity * self.angular_velocity
        }
    }

    /// Linear momentum; zero for fixed bodies.
    pub fn momentum(&self) -> Vec2 {
        if self.is_fixed() {
            Vec2::ZERO
        } else {
            self.velocity * self.mass
        }
    }

    // --- Old copy ---

    /// Snapshots pose and velocity for before/after reasoning in this step.
    pub fn save_old_copy(&mut self) {
        self.old_copy = Some(OldCopy {
            pose: self.pose,
            velocity: self.velocity,
            angular_velocity: self.angular_velocity,
            cm_body: self.cm_body,
        });
    }

    pub fn old_copy(&self) -> Option<&OldCopy> {
        self.old_copy.as_ref()
    }

    pub fn erase_old_copy(&mut self) {
        self.old_copy = None;
    }

    /// Upper bound on how far any boundary point moved since the old copy
    /// was taken; zero without an old copy.
    pub fn travel_distance(&self) -> f64 {
        match &self.old_copy {
            Some(old) => {
                let shift = self.pose.position.distance(old.pose.position);
                let turn = (self.pose.angle - old.pose.angle).abs();
                shift + turn * self.max_radius_cm
            }
            None => 0.0,
        }
    }
}

/// Shoelace area, positive for counter-clockwise outlines.
fn signed_area(points: &[Vec2]) -> f64 {
    let n = points.len();
    (0..n).map(|i| points[i].cross(points[(i + 1) % n])).sum::<f64>() / 2.0
}
