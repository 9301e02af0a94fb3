//! Foundational primitives for depth-image segmentation.
//!
//! ## Grids
//! Every per-pixel buffer (depth, area, score, masks, pixel state) is an
//! [`Image<T>`]: a flat `Vec<T>` with row-major offsets `y * width + x`.
//! Length is validated against `width * height` at construction and every
//! coordinate access is bounds-checked through [`Pixel`].
//!
//! ## Depth
//! Depth values are `f32` in the sensor's native units (millimetres for the
//! usual structured-light cameras). `0` is the only "no reading" sentinel
//! and is never a real measurement.

mod error;
mod geom;
mod image;

pub use error::Error;
pub use geom::{Pixel, Point3f, Vec3f, triangle_area};
pub use image::{Image, ImageView, depth_from_u16};
