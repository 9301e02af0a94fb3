use ds_core::Point3f;

/// Maps a depth sample at pixel `(x, y)` to a world-space point.
///
/// `resize_factor` scales pixel coordinates of a downsampled depth buffer
/// back to the sensor's reference resolution. Implementations must be pure.
pub trait DepthToWorld {
    fn depth_to_world(&self, x: f32, y: f32, depth: f32, resize_factor: f32) -> Point3f;

    /// Same mapping for a packed `(x, y, depth)` sample.
    fn point_to_world(&self, sample: Point3f, resize_factor: f32) -> Point3f {
        self.depth_to_world(sample.x, sample.y, sample.z, resize_factor)
    }
}

impl<C: DepthToWorld + ?Sized> DepthToWorld for &C {
    fn depth_to_world(&self, x: f32, y: f32, depth: f32, resize_factor: f32) -> Point3f {
        (**self).depth_to_world(x, y, depth, resize_factor)
    }
}

/// Pinhole model of a structured-light depth camera.
///
/// World X grows to the right, world Y grows upward and world Z is the
/// depth value itself, all in the depth buffer's units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeConversion {
    pub reference_width: f32,
    pub reference_height: f32,
    /// Horizontal field of view in radians.
    pub horizontal_fov: f32,
    /// Vertical field of view in radians.
    pub vertical_fov: f32,
}

impl Default for PinholeConversion {
    fn default() -> Self {
        Self {
            reference_width: 320.0,
            reference_height: 240.0,
            horizontal_fov: 1.0225,
            vertical_fov: 0.796616,
        }
    }
}

impl PinholeConversion {
    fn xz_factor(&self) -> f32 {
        (self.horizontal_fov * 0.5).tan() * 2.0
    }

    fn yz_factor(&self) -> f32 {
        (self.vertical_fov * 0.5).tan() * 2.0
    }
}

impl DepthToWorld for PinholeConversion {
    fn depth_to_world(&self, x: f32, y: f32, depth: f32, resize_factor: f32) -> Point3f {
        let nx = x * resize_factor / self.reference_width - 0.5;
        let ny = 0.5 - y * resize_factor / self.reference_height;

        Point3f {
            x: nx * depth * self.xz_factor(),
            y: ny * depth * self.yz_factor(),
            z: depth,
        }
    }
}
