use core::ops::Sub;

/// Integer pixel coordinate inside a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pixel {
    pub x: usize,
    pub y: usize,
}

impl Pixel {
    /// Coordinates reported for "no pixel" when a position must be serialized.
    pub const INVALID_COORDS: (i64, i64) = (-1, -1);

    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Signed coordinates, with `None` mapped to [`Pixel::INVALID_COORDS`].
    pub fn coords_or_invalid(p: Option<Pixel>) -> (i64, i64) {
        match p {
            Some(p) => (p.x as i64, p.y as i64),
            None => Self::INVALID_COORDS,
        }
    }

    pub fn left(self) -> Option<Pixel> {
        self.x.checked_sub(1).map(|x| Pixel::new(x, self.y))
    }

    pub fn up(self) -> Option<Pixel> {
        self.y.checked_sub(1).map(|y| Pixel::new(self.x, y))
    }

    pub fn right(self) -> Pixel {
        Pixel::new(self.x + 1, self.y)
    }

    pub fn down(self) -> Pixel {
        Pixel::new(self.x, self.y + 1)
    }
}

/// World-space position, in the depth buffer's native units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3f {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3f {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Self) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    pub fn norm(self) -> f32 {
        self.dot(self).sqrt()
    }
}

impl Sub<Point3f> for Point3f {
    type Output = Vec3f;

    fn sub(self, rhs: Point3f) -> Self::Output {
        Vec3f {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

/// Area of the triangle `a b c`: half the norm of the edge cross product.
pub fn triangle_area(a: Point3f, b: Point3f, c: Point3f) -> f32 {
    0.5 * (b - a).cross(c - a).norm()
}
