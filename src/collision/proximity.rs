//! Broad-phase rejection of body and edge pairs.
//!
//! Every test compares squared distances against a squared reach built
//! from centroid radii, the per-step travel of each body and the larger
//! distance tolerance. A pair is only rejected when narrow phase could not
//! find it closer than the distance tolerance.

use crate::math::vec2::Vec2;
use crate::objects::Body;

/// Stateless proximity tests over pairs of bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityFilter;

impl ProximityFilter {
    /// Whether two bodies may collide at all: not excluded by non-collide
    /// sets, not both fixed.
    pub fn may_collide(b1: &Body, b2: &Body) -> bool {
        !(b1.is_fixed() && b2.is_fixed()) && !b1.does_not_collide(b2) && b1.id() != b2.id()
    }

    /// Broad-phase test for a body pair.
    pub fn bodies_near(b1: &Body, b2: &Body) -> bool {
        if !Self::may_collide(b1, b2) {
            return false;
        }
        let slack = b1.travel_distance() + b2.travel_distance() + b1.distance_tol().max(b2.distance_tol());
        match (b1.special_edge().is_some(), b2.special_edge().is_some()) {
            (true, false) => Self::special_near(b1, b2, slack),
            (false, true) => Self::special_near(b2, b1, slack),
            _ => {
                let reach = b1.centroid_radius() + b2.centroid_radius() + slack;
                b1.centroid_world().distance_squared(b2.centroid_world()) <= reach * reach
            }
        }
    }

    /// Projects the other body's centroid onto the special edge normal. Only
    /// the distance above the special edge counts.
    fn special_near(special: &Body, other: &Body, slack: f64) -> bool {
        let (Some(normal), Some(radius)) = (special.special_normal_world(), special.special_radius()) else {
            return true;
        };
        let height = (other.centroid_world() - special.centroid_world()).dot(normal);
        height <= radius + other.centroid_radius() + slack
    }

    /// Broad-phase test for two edges of different bodies.
    pub fn edges_near(b1: &Body, e1: usize, b2: &Body, e2: usize) -> bool {
        if !b1.edge_collides(e1) || !b2.edge_collides(e2) {
            return false;
        }
        let c1 = b1.edge_centroid_world(e1);
        let c2 = b2.edge_centroid_world(e2);
        let r1 = b1.edges()[e1].centroid_radius();
        let r2 = b2.edges()[e2].centroid_radius();
        let reach = r1 + r2 + Self::slack(b1, b2);
        c1.distance_squared(c2) <= reach * reach
    }

    /// Broad-phase test for a vertex of `b1` against an edge of `b2`.
    pub fn vertex_near_edge(b1: &Body, vertex: usize, b2: &Body, edge: usize) -> bool {
        if !b1.vertex_collides(vertex) || !b2.edge_collides(edge) {
            return false;
        }
        let point = b1.vertex_world(vertex);
        Self::point_near_edge(point, b2, edge, Self::slack(b1, b2))
    }

    fn point_near_edge(point: Vec2, body: &Body, edge: usize, slack: f64) -> bool {
        let center = body.edge_centroid_world(edge);
        let reach = body.edges()[edge].centroid_radius() + slack;
        point.distance_squared(center) <= reach * reach
    }

    fn slack(b1: &Body, b2: &Body) -> f64 {
        b1.travel_distance() + b2.travel_distance() + b1.distance_tol().max(b2.distance_tol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeFactory;

    #[test]
    fn test_far_blocks_rejected() {
        let mut factory = ShapeFactory::new();
        let a = factory.block(1.0, 1.0).unwrap();
        let mut b = factory.block(1.0, 1.0).unwrap();
        b.set_position(Vec2::new(3.0, 0.0), 0.0);
        assert!(!ProximityFilter::bodies_near(&a, &b));
        b.set_position(Vec2::new(1.005, 0.0), 0.0);
        assert!(ProximityFilter::bodies_near(&a, &b));
    }

    #[test]
    fn test_travel_expands_reach() {
        let mut factory = ShapeFactory::new();
        let a = factory.block(1.0, 1.0).unwrap();
        let mut b = factory.block(1.0, 1.0).unwrap();
        b.set_position(Vec2::new(2.0, 0.0), 0.0);
        assert!(!ProximityFilter::bodies_near(&a, &b));
        b.set_position(Vec2::new(3.0, 0.0), 0.0);
        b.save_old_copy();
        b.set_position(Vec2::new(2.0, 0.0), 0.0);
        // Centroid distance 2 against reach 2 * sqrt(0.5) + 1 + 0.01.
        assert!(ProximityFilter::bodies_near(&a, &b));
    }

    #[test]
    fn test_fixed_pair_and_non_collide_rejected() {
        let mut factory = ShapeFactory::new();
        let w1 = factory.wall(1.0, 1.0).unwrap();
        let w2 = factory.wall(1.0, 1.0).unwrap();
        assert!(!ProximityFilter::bodies_near(&w1, &w2));

        let mut a = factory.block(1.0, 1.0).unwrap();
        let b = factory.block(1.0, 1.0).unwrap();
        a.add_non_collide(b.id());
        assert!(!ProximityFilter::bodies_near(&a, &b));
        assert!(!ProximityFilter::bodies_near(&b, &a));
    }

    #[test]
    fn test_special_edge_uses_height_above_wall() {
        let mut factory = ShapeFactory::new();
        let wall = factory.wall(100.0, 1.0).unwrap();
        let mut ball = factory.ball(0.5).unwrap();
        // Far along the wall but just above its top face.
        ball.set_position(Vec2::new(45.0, 1.0), 0.0);
        assert!(ProximityFilter::bodies_near(&wall, &ball));
        ball.set_position(Vec2::new(45.0, 3.0), 0.0);
        assert!(!ProximityFilter::bodies_near(&ball, &wall));
    }

    #[test]
    fn test_disabled_wall_edges_skip_edge_tests() {
        let mut factory = ShapeFactory::new();
        let wall = factory.wall(4.0, 1.0).unwrap();
        let ball = factory.ball(0.5).unwrap();
        assert!(!ProximityFilter::edges_near(&wall, 0, &ball, 0));
        assert!(ProximityFilter::edges_near(&wall, 2, &ball, 0));
    }
}
