//! Partition of collisions into groups of transitively touching bodies.

use crate::collision::Collision;
use crate::objects::Body;

/// Disjoint-set over body indices, with path compression and union by rank.
pub(crate) struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Splits `collisions` (by index) into groups whose movable bodies touch
/// each other directly or through other collisions in the group.
///
/// Fixed bodies do not join groups: two blocks resting on the same floor
/// are solved independently. Groups come out ordered by their first
/// collision index, and indices within a group stay ascending.
pub fn group_collisions(bodies: &[Body], collisions: &[Collision]) -> Vec<Vec<usize>> {
    let mut sets = UnionFind::new(bodies.len());
    for c in collisions {
        if !bodies[c.primary].is_fixed() && !bodies[c.normal_body].is_fixed() {
            sets.union(c.primary, c.normal_body);
        }
    }

    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for (index, c) in collisions.iter().enumerate() {
        let body = if bodies[c.primary].is_fixed() { c.normal_body } else { c.primary };
        let root = sets.find(body);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(index),
            None => groups.push((root, vec![index])),
        }
    }
    groups.into_iter().map(|(_, members)| members).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{Feature, NormalMotion};
    use crate::math::vec2::Vec2;
    use crate::shapes::ShapeFactory;

    fn touching(bodies: &[Body], primary: usize, normal_body: usize) -> Collision {
        Collision::new(
            bodies,
            primary,
            Feature::Vertex(0),
            normal_body,
            0,
            Vec2::ZERO,
            Vec2::UP,
            NormalMotion::Straight,
            0.0,
        )
    }

    #[test]
    fn test_union_find_merges() {
        let mut sets = UnionFind::new(4);
        sets.union(0, 1);
        sets.union(2, 3);
        assert_eq!(sets.find(0), sets.find(1));
        assert_ne!(sets.find(1), sets.find(2));
        sets.union(1, 3);
        assert_eq!(sets.find(0), sets.find(2));
    }

    #[test]
    fn test_fixed_body_does_not_join_groups() {
        let mut factory = ShapeFactory::new();
        let floor = factory.wall(10.0, 1.0).unwrap();
        let a = factory.block(1.0, 1.0).unwrap();
        let b = factory.block(1.0, 1.0).unwrap();
        let c = factory.block(1.0, 1.0).unwrap();
        let bodies = vec![floor, a, b, c];
        let collisions = vec![
            touching(&bodies, 1, 0),
            touching(&bodies, 2, 0),
            touching(&bodies, 3, 2),
            touching(&bodies, 1, 0),
        ];
        let groups = group_collisions(&bodies, &collisions);
        assert_eq!(groups, vec![vec![0, 3], vec![1, 2]]);
    }
}
