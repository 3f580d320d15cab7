//! Narrow-phase collision tests between the features of two bodies.
//!
//! Each test works in the body coordinates of the body owning the normal
//! edge. A feature is reported when it is closer than the distance
//! tolerance. A penetrating feature is only reported when it was outside
//! at the start of the step (per the bodies' old copies), so features
//! that were never near each other are not mistaken for collisions.

use crate::math::vec2::Vec2;
use crate::objects::Body;
use crate::shapes::{CircularArc, EdgeShape, LineSegment};

use super::manifold::{Collision, Feature, NormalMotion};
use super::proximity::ProximityFilter;

/// Slack on normal alignment and impact location when merging duplicate
/// reports of one contact.
pub const DUPLICATE_TOL: f64 = 1e-6;

/// Parameter margin that keeps edge crossings off the edge end points,
/// which the vertex tests already cover.
const END_MARGIN: f64 = 1e-9;

/// Exact collision tests over every admissible body pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionDetector;

impl CollisionDetector {
    /// All collisions among `bodies`, in pair order.
    pub fn find_collisions(bodies: &[Body]) -> Vec<Collision> {
        let mut found = Vec::new();
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                if ProximityFilter::bodies_near(&bodies[i], &bodies[j]) {
                    found.extend(Self::check_pair(bodies, i, j));
                }
            }
        }
        tracing::trace!(count = found.len(), "narrow phase finished");
        found
    }

    /// Collisions between bodies `i` and `j`, skipping the broad phase.
    pub fn check_pair(bodies: &[Body], i: usize, j: usize) -> Vec<Collision> {
        let mut found = Vec::new();
        Self::vertices_against_edges(bodies, i, j, &mut found);
        Self::vertices_against_edges(bodies, j, i, &mut found);
        Self::edges_against_edges(bodies, i, j, &mut found);
        remove_duplicates(found)
    }

    fn vertices_against_edges(bodies: &[Body], p: usize, n: usize, found: &mut Vec<Collision>) {
        let (pb, nb) = (&bodies[p], &bodies[n]);
        for v in 0..pb.vertices_body().len() {
            for e in 0..nb.edges().len() {
                if !ProximityFilter::vertex_near_edge(pb, v, nb, e) {
                    continue;
                }
                if let Some(collision) = Self::vertex_edge(bodies, p, v, n, e) {
                    found.push(collision);
                }
            }
        }
    }

    fn edges_against_edges(bodies: &[Body], i: usize, j: usize, found: &mut Vec<Collision>) {
        let (bi, bj) = (&bodies[i], &bodies[j]);
        for e1 in 0..bi.edges().len() {
            for e2 in 0..bj.edges().len() {
                if !ProximityFilter::edges_near(bi, e1, bj, e2) {
                    continue;
                }
                let collision = match (bi.edges()[e1].shape(), bj.edges()[e2].shape()) {
                    (EdgeShape::Straight(s1), EdgeShape::Straight(s2)) => {
                        Self::straight_crossing(bodies, i, e1, s1, j, e2, s2)
                    }
                    (EdgeShape::Circular(a1), EdgeShape::Straight(s2)) => {
                        Self::arc_straight(bodies, i, e1, a1, j, e2, s2)
                    }
                    (EdgeShape::Straight(s1), EdgeShape::Circular(a2)) => {
                        Self::arc_straight(bodies, j, e2, a2, i, e1, s1)
                    }
                    (EdgeShape::Circular(a1), EdgeShape::Circular(a2)) => {
                        Self::arc_arc(bodies, i, e1, a1, j, e2, a2)
                    }
                };
                found.extend(collision);
            }
        }
    }

    /// Vertex `v` of body `p` against edge `e` of body `n`. Covers the
    /// vertex-straight and vertex-circular cases. Curve mid-points are only
    /// reported when they crossed the edge.
    pub fn vertex_edge(bodies: &[Body], p: usize, v: usize, n: usize, e: usize) -> Option<Collision> {
        let (pb, nb) = (&bodies[p], &bodies[n]);
        let vertex = &pb.vertices_body()[v];
        let world = pb.body_to_world(vertex.location());
        let local = nb.world_to_body(world);
        let old_local = old_location(pb, nb, vertex.location());
        let tol = pb.distance_tol().max(nb.distance_tol());

        let (distance, normal_local, motion, crossed) = match nb.edges()[e].shape() {
            EdgeShape::Straight(seg) => {
                if !seg.projects_onto(local) {
                    return None;
                }
                let distance = seg.signed_line_distance(local);
                if distance >= tol {
                    return None;
                }
                let crossed = if distance < 0.0 {
                    let crossed = old_local.map(|old| {
                        seg.signed_line_distance(old) >= 0.0 && LineSegment::new(old, local).intersect(seg).is_some()
                    });
                    if !admit_penetration(crossed, distance, tol) {
                        return None;
                    }
                    crossed.unwrap_or(false)
                } else {
                    false
                };
                (distance, seg.outward_normal(), NormalMotion::Straight, crossed)
            }
            EdgeShape::Circular(arc) => {
                let distance = arc.signed_distance(local)?;
                if distance >= tol {
                    return None;
                }
                let crossed = if distance < 0.0 {
                    let crossed = old_local.map(|old| radial_distance(arc, old) >= 0.0);
                    if !admit_penetration(crossed, distance, tol) {
                        return None;
                    }
                    crossed.unwrap_or(false)
                } else {
                    false
                };
                let motion = NormalMotion::Radial {
                    from: nb.body_to_world(arc.center),
                    to: world,
                    inward: !arc.is_convex(),
                };
                (distance, arc.outward_normal_at(local), motion, crossed)
            }
        };

        if !vertex.is_end_point() && !crossed {
            return None;
        }
        let normal = nb.rotate_body_to_world(normal_local);
        let mut collision = Collision::new(bodies, p, Feature::Vertex(v), n, e, world, normal, motion, distance);
        collision.crossed = crossed;
        Some(collision)
    }

    /// Convex arc `ea` of body `p` against straight edge `es` of body `n`,
    /// touching at the arc point nearest the edge's line.
    #[allow(clippy::too_many_arguments)]
    fn arc_straight(
        bodies: &[Body],
        p: usize,
        ea: usize,
        arc: &CircularArc,
        n: usize,
        es: usize,
        seg: &LineSegment,
    ) -> Option<Collision> {
        if !arc.is_convex() {
            return None;
        }
        let (pb, nb) = (&bodies[p], &bodies[n]);
        let tol = pb.distance_tol().max(nb.distance_tol());
        let center_world = pb.body_to_world(arc.center);
        let center = nb.world_to_body(center_world);
        let normal_local = seg.outward_normal();

        let toward_edge = pb.rotate_world_to_body(nb.rotate_body_to_world(-normal_local));
        if !arc.contains_angle(toward_edge.angle()) {
            return None;
        }
        let nearest = center - normal_local * arc.radius;
        if !seg.projects_onto(nearest) {
            return None;
        }
        let distance = seg.signed_line_distance(center) - arc.radius;
        if distance >= tol {
            return None;
        }
        let crossed = if distance < 0.0 {
            let crossed = old_location(pb, nb, arc.center).map(|old| seg.signed_line_distance(old) - arc.radius >= 0.0);
            if !admit_penetration(crossed, distance, tol) {
                return None;
            }
            crossed.unwrap_or(false)
        } else {
            false
        };

        let normal = nb.rotate_body_to_world(normal_local);
        let impact = center_world - normal * arc.radius;
        let mut collision =
            Collision::new(bodies, p, Feature::Edge(ea), n, es, impact, normal, NormalMotion::Straight, distance);
        collision.crossed = crossed;
        Some(collision)
    }

    /// Arc `e1` of body `p` against arc `e2` of body `n`. Handles the
    /// convex-convex case and a convex arc inside a concave one.
    #[allow(clippy::too_many_arguments)]
    fn arc_arc(
        bodies: &[Body],
        p: usize,
        e1: usize,
        a1: &CircularArc,
        n: usize,
        e2: usize,
        a2: &CircularArc,
    ) -> Option<Collision> {
        let (pb, nb) = (&bodies[p], &bodies[n]);
        let tol = pb.distance_tol().max(nb.distance_tol());
        let kind = ArcPair::classify(a1, a2)?;
        let c1 = pb.body_to_world(a1.center);
        let c2 = nb.body_to_world(a2.center);
        let offset = c1 - c2;
        let u = offset.try_normalize()?;
        let distance = kind.gap(offset.magnitude(), a1.radius, a2.radius);
        if distance >= tol {
            return None;
        }

        // Directions from each center to its contact point, and the normal
        // pointing out of the normal body.
        let (dir1, dir2, normal) = match kind {
            ArcPair::Outside => (-u, u, u),
            ArcPair::PrimaryInside => (u, u, -u),
            ArcPair::NormalInside => (-u, -u, -u),
        };
        if !a1.contains_angle(pb.rotate_world_to_body(dir1).angle())
            || !a2.contains_angle(nb.rotate_world_to_body(dir2).angle())
        {
            return None;
        }

        let crossed = if distance < 0.0 {
            let old = match (pb.old_copy(), nb.old_copy()) {
                (Some(o1), Some(o2)) => Some(o1.body_to_world(a1.center) - o2.body_to_world(a2.center)),
                (Some(o1), None) => Some(o1.body_to_world(a1.center) - c2),
                _ => None,
            };
            let crossed = old.map(|o| kind.gap(o.magnitude(), a1.radius, a2.radius) >= 0.0);
            if !admit_penetration(crossed, distance, tol) {
                return None;
            }
            crossed.unwrap_or(false)
        } else {
            false
        };

        let impact = c1 + dir1 * a1.radius;
        let motion = NormalMotion::Radial { from: c2, to: c1, inward: kind != ArcPair::Outside };
        let mut collision = Collision::new(bodies, p, Feature::Edge(e1), n, e2, impact, normal, motion, distance);
        collision.crossed = crossed;
        Some(collision)
    }

    /// Straight edges are only tested for crossing. Touching straight edges
    /// are found by the vertex tests at their end points.
    #[allow(clippy::too_many_arguments)]
    fn straight_crossing(
        bodies: &[Body],
        p: usize,
        e1: usize,
        s1: &LineSegment,
        n: usize,
        e2: usize,
        s2: &LineSegment,
    ) -> Option<Collision> {
        let (pb, nb) = (&bodies[p], &bodies[n]);
        let a = nb.world_to_body(pb.body_to_world(s1.a));
        let b = nb.world_to_body(pb.body_to_world(s1.b));
        let (point, t, u) = LineSegment::new(a, b).intersect(s2)?;
        let interior = |x: f64| x > END_MARGIN && x < 1.0 - END_MARGIN;
        if !interior(t) || !interior(u) {
            return None;
        }
        let depth = s2.signed_line_distance(a).min(s2.signed_line_distance(b));
        let normal = nb.rotate_body_to_world(s2.outward_normal());
        let impact = nb.body_to_world(point);
        let mut collision = Collision::new(
            bodies,
            p,
            Feature::Edge(e1),
            n,
            e2,
            impact,
            normal,
            NormalMotion::Straight,
            depth.min(-f64::EPSILON),
        );
        collision.crossed = true;
        tracing::trace!(%collision, "straight edges crossed");
        Some(collision)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArcPair {
    /// Both convex, touching from outside.
    Outside,
    /// Convex primary arc inside the normal body's concave arc.
    PrimaryInside,
    /// Convex normal arc inside the primary body's concave arc.
    NormalInside,
}

impl ArcPair {
    fn classify(a1: &CircularArc, a2: &CircularArc) -> Option<Self> {
        match (a1.is_convex(), a2.is_convex()) {
            (true, true) => Some(ArcPair::Outside),
            (true, false) if a1.radius < a2.radius => Some(ArcPair::PrimaryInside),
            (false, true) if a2.radius < a1.radius => Some(ArcPair::NormalInside),
            _ => None,
        }
    }

    fn gap(self, center_distance: f64, r1: f64, r2: f64) -> f64 {
        match self {
            ArcPair::Outside => center_distance - r1 - r2,
            ArcPair::PrimaryInside => r2 - center_distance - r1,
            ArcPair::NormalInside => r1 - center_distance - r2,
        }
    }
}

/// Where a body point of `pb` was at the start of the step, in the body
/// coordinates `nb` had then. `None` without an old copy of `pb`.
fn old_location(pb: &Body, nb: &Body, point: Vec2) -> Option<Vec2> {
    let world = pb.old_copy()?.body_to_world(point);
    Some(match nb.old_copy() {
        Some(old) => old.world_to_body(world),
        None => nb.world_to_body(world),
    })
}

/// Signed distance from the arc's circle, positive outside the body,
/// regardless of whether the point faces the arc.
fn radial_distance(arc: &CircularArc, point: Vec2) -> f64 {
    let d = point.distance(arc.center);
    if arc.is_convex() {
        d - arc.radius
    } else {
        arc.radius - d
    }
}

/// A penetrating feature counts when it crossed during the step, or, with
/// no step history, when it is shallower than the distance tolerance.
fn admit_penetration(crossed: Option<bool>, distance: f64, tol: f64) -> bool {
    match crossed {
        Some(crossed) => crossed,
        None => distance > -tol,
    }
}

/// Keeps one collision per contact between the same two bodies, taking
/// the deeper one. Smooth junctions between curved edges show up once from
/// each side with swapped roles and opposite normals; those are one contact.
fn remove_duplicates(found: Vec<Collision>) -> Vec<Collision> {
    let mut kept: Vec<Collision> = Vec::with_capacity(found.len());
    for collision in found {
        let duplicate = kept.iter_mut().find(|k| same_contact(k, &collision));
        match duplicate {
            Some(existing) => {
                if collision.distance < existing.distance {
                    *existing = collision;
                }
            }
            None => kept.push(collision),
        }
    }
    kept
}

fn same_contact(a: &Collision, b: &Collision) -> bool {
    let aligned = if a.primary == b.primary && a.normal_body == b.normal_body {
        a.normal.dot(b.normal)
    } else if a.primary == b.normal_body && a.normal_body == b.primary {
        -a.normal.dot(b.normal)
    } else {
        return false;
    };
    let reach = DUPLICATE_TOL.max(a.tolerances.distance);
    aligned > 1.0 - DUPLICATE_TOL && a.impact_point.distance_squared(b.impact_point) < reach * reach
}
