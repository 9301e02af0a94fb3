use ds_core::{Error, Image, Point3f, triangle_area};

use crate::conversion::DepthToWorld;

/// World-space area of the triangle spanned by three `(x, y, depth)` samples.
pub fn depth_triangle_area<C: DepthToWorld + ?Sized>(
    conv: &C,
    p1: Point3f,
    p2: Point3f,
    p3: Point3f,
    resize_factor: f32,
) -> f32 {
    triangle_area(
        conv.point_to_world(p1, resize_factor),
        conv.point_to_world(p2, resize_factor),
        conv.point_to_world(p3, resize_factor),
    )
}

/// Per-pixel world-space surface area.
///
/// Each pixel is split into the triangles `(x,y)-(x+1,y)-(x,y+1)` and
/// `(x+1,y)-(x,y+1)-(x+1,y+1)`, all at the pixel's own depth. The last row
/// and column have no right/below neighbour and stay `0`, as do pixels
/// without a depth reading.
pub fn calculate_segment_area<C: DepthToWorld + ?Sized>(
    depth: &Image<f32>,
    conv: &C,
    resize_factor: f32,
) -> Image<f32> {
    let mut area = Image::new_fill(depth.width(), depth.height(), 0.0f32);
    fill_segment_area(depth, conv, resize_factor, &mut area);
    area
}

pub fn calculate_segment_area_into<C: DepthToWorld + ?Sized>(
    depth: &Image<f32>,
    conv: &C,
    resize_factor: f32,
    area: &mut Image<f32>,
) -> Result<(), Error> {
    depth.ensure_same_dims(area)?;
    fill_segment_area(depth, conv, resize_factor, area);
    Ok(())
}

fn fill_segment_area<C: DepthToWorld + ?Sized>(
    depth: &Image<f32>,
    conv: &C,
    resize_factor: f32,
    area: &mut Image<f32>,
) {
    area.fill(0.0);

    for y in 0..depth.height().saturating_sub(1) {
        let depth_row = depth.row(y);
        let area_row = area.row_mut(y);

        for x in 0..depth_row.len().saturating_sub(1) {
            let d = depth_row[x];
            if d == 0.0 {
                continue;
            }

            let (fx, fy) = (x as f32, y as f32);
            let p1 = Point3f::new(fx, fy, d);
            let p2 = Point3f::new(fx + 1.0, fy, d);
            let p3 = Point3f::new(fx, fy + 1.0, d);
            let p4 = Point3f::new(fx + 1.0, fy + 1.0, d);

            area_row[x] = depth_triangle_area(conv, p1, p2, p3, resize_factor)
                + depth_triangle_area(conv, p2, p3, p4, resize_factor);
        }
    }
}
