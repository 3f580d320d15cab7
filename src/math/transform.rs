use super::vec2::Vec2;

/// Placement of a body in world space: where its center of mass sits and
/// how far it is rotated. Sine and cosine are cached since every
/// body-to-world conversion needs them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub angle: f64,
    sin_a: f64,
    cos_a: f64,
}

impl Pose {
    pub fn new(position: Vec2, angle: f64) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        Self { position, angle, sin_a, cos_a }
    }

    pub fn identity() -> Self {
        Self::new(Vec2::ZERO, 0.0)
    }

    /// Maps an offset from the center of mass (body orientation) to world
    /// coordinates: rotation then translation.
    pub fn apply(&self, offset: Vec2) -> Vec2 {
        offset.rotate_by(self.sin_a, self.cos_a) + self.position
    }

    /// Inverse of [`Pose::apply`].
    pub fn apply_inverse(&self, point: Vec2) -> Vec2 {
        (point - self.position).rotate_by(-self.sin_a, self.cos_a)
    }

    /// Rotates a direction without translating it.
    pub fn rotate(&self, direction: Vec2) -> Vec2 {
        direction.rotate_by(self.sin_a, self.cos_a)
    }

    pub fn rotate_inverse(&self, direction: Vec2) -> Vec2 {
        direction.rotate_by(-self.sin_a, self.cos_a)
    }

    /// True when both poses place a body identically (bitwise on the
    /// stored position and angle).
    pub fn same_placement(&self, other: &Pose) -> bool {
        self.position == other.position && self.angle == other.angle
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_pose_apply_combined() {
        let pose = Pose::new(Vec2::new(10.0, 5.0), PI / 2.0);
        let p = pose.apply(Vec2::new(1.0, 0.0));
        assert!(p.nearly_equal(Vec2::new(10.0, 6.0), EPSILON));
    }

    #[test]
    fn test_pose_inverse_round_trip() {
        let pose = Pose::new(Vec2::new(-3.0, 2.5), 0.77);
        let local = Vec2::new(1.5, -0.25);
        let back = pose.apply_inverse(pose.apply(local));
        assert!(back.nearly_equal(local, EPSILON));
    }

    #[test]
    fn test_pose_rotate_ignores_translation() {
        let pose = Pose::new(Vec2::new(100.0, 100.0), PI);
        assert!(pose.rotate(Vec2::RIGHT).nearly_equal(Vec2::new(-1.0, 0.0), EPSILON));
        assert!(pose.rotate_inverse(pose.rotate(Vec2::UP)).nearly_equal(Vec2::UP, EPSILON));
    }

    #[test]
    fn test_pose_same_placement() {
        let a = Pose::new(Vec2::new(1.0, 2.0), 0.3);
        let b = Pose::new(Vec2::new(1.0, 2.0), 0.3);
        let c = Pose::new(Vec2::new(1.0, 2.0), 0.30001);
        assert!(a.same_placement(&b));
        assert!(!a.same_placement(&c));
    }
}
