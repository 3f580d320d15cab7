use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A 2D vector or point with `f64` components.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const UP: Vec2 = Vec2 { x: 0.0, y: 1.0 };
    pub const RIGHT: Vec2 = Vec2 { x: 1.0, y: 0.0 };

    /// Creates a new Vec2.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` radians from the positive x axis.
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Squared length. Preferred on hot paths since it avoids a square root.
    pub fn magnitude_squared(self) -> f64 {
        self.dot(self)
    }

    pub fn magnitude(self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Returns the unit vector in the same direction, or `None` for a
    /// vector too short to have a meaningful direction.
    pub fn try_normalize(self) -> Option<Self> {
        let mag = self.magnitude();
        if mag < 1e-300 || !mag.is_finite() {
            None
        } else {
            Some(self * (1.0 / mag))
        }
    }

    /// Returns a unit vector, or the zero vector when the magnitude is zero.
    pub fn normalize(self) -> Self {
        self.try_normalize().unwrap_or(Self::ZERO)
    }

    pub fn distance_squared(self, other: Self) -> f64 {
        (self - other).magnitude_squared()
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).magnitude()
    }

    /// Rotates the vector by `angle` radians counter-clockwise.
    pub fn rotate(self, angle: f64) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        self.rotate_by(sin_a, cos_a)
    }

    /// Rotation with a precomputed sine and cosine.
    pub fn rotate_by(self, sin_a: f64, cos_a: f64) -> Self {
        Self::new(self.x * cos_a - self.y * sin_a, self.x * sin_a + self.y * cos_a)
    }

    /// The 2D cross product, i.e. the z component of the 3D cross product.
    pub fn cross(self, other: Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Cross product of a scalar angular quantity (along z) with this vector:
    /// `w × r`. Gives the velocity of a point at offset `r` on a body
    /// spinning at `w`.
    pub fn scalar_cross(w: f64, r: Vec2) -> Vec2 {
        Vec2::new(-w * r.y, w * r.x)
    }

    /// Angle of the vector measured from the positive x axis, in `(-PI, PI]`.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Component-wise near-equality.
    pub fn nearly_equal(self, other: Vec2, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl Mul<Vec2> for f64 {
    type Output = Vec2;

    fn mul(self, vec: Vec2) -> Vec2 {
        vec * self
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}
