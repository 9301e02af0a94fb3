//! Binary morphology with a 3x3 cross structuring element.
//!
//! Pixels are treated as binary with threshold `> 0`.
//! Outputs are `0` or `255` in `u8`.
//!
//! Border rule: neighbours outside the image are ignored. They never set a
//! pixel during dilation and never clear one during erosion, so an image
//! that is entirely set is a fixed point of [`erode_cross_u8_into`].

use ds_core::{Image, ImageView};

const CROSS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

pub fn dilate_cross_u8(src: &ImageView<'_, u8>) -> Image<u8> {
    let mut out = Image::new_fill(src.width(), src.height(), 0u8);
    dilate_cross_u8_into(src, &mut out);
    out
}

/// Erodes `src` into `dst`, resizing `dst` if needed.
pub fn erode_cross_u8_into(src: &ImageView<'_, u8>, dst: &mut Image<u8>) {
    apply_cross(src, dst, true);
}

/// Dilates `src` into `dst`, resizing `dst` if needed.
pub fn dilate_cross_u8_into(src: &ImageView<'_, u8>, dst: &mut Image<u8>) {
    apply_cross(src, dst, false);
}

pub fn count_nonzero_u8(src: &ImageView<'_, u8>) -> usize {
    src.data().iter().filter(|&&v| v != 0).count()
}

fn apply_cross(src: &ImageView<'_, u8>, dst: &mut Image<u8>, erode: bool) {
    let (w, h) = (src.width(), src.height());
    if dst.dims() != (w, h) {
        dst.reset(w, h, 0);
    }
    if w == 0 || h == 0 {
        return;
    }

    let data = src.data();
    let out = dst.data_mut();
    for y in 0..h {
        for x in 0..w {
            let center = data[y * w + x] != 0;
            // Erosion keeps a set pixel only if no in-bounds arm is clear;
            // dilation sets a pixel if the centre or any in-bounds arm is set.
            let mut set = center;
            for (dx, dy) in CROSS {
                if erode != set {
                    break;
                }
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let arm = data[ny as usize * w + nx as usize] != 0;
                set = if erode { arm } else { arm || set };
            }
            out[y * w + x] = if set { 255 } else { 0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use ds_core::Image;

    use crate::{count_nonzero_u8, dilate_cross_u8, erode_cross_u8_into};

    fn eroded(img: &Image<u8>) -> Image<u8> {
        let mut out = Image::default();
        erode_cross_u8_into(&img.as_view(), &mut out);
        out
    }

    fn from_rows(rows: &[&[u8]]) -> Image<u8> {
        let w = rows[0].len();
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Image::from_vec(w, rows.len(), data).expect("valid image")
    }

    #[test]
    fn dilate_grows_single_pixel_into_cross() {
        let mut data = vec![0u8; 25];
        data[12] = 1;
        let img = Image::from_vec(5, 5, data).expect("valid image");

        let out = dilate_cross_u8(&img.as_view());
        let expected = from_rows(&[
            &[0, 0, 0, 0, 0],
            &[0, 0, 255, 0, 0],
            &[0, 255, 255, 255, 0],
            &[0, 0, 255, 0, 0],
            &[0, 0, 0, 0, 0],
        ]);
        assert_eq!(out, expected);
    }

    #[test]
    fn erode_shrinks_square_but_keeps_border_support() {
        let img = from_rows(&[
            &[9, 9, 9, 0],
            &[9, 9, 9, 0],
            &[9, 9, 9, 0],
            &[0, 0, 0, 0],
        ]);

        let out = eroded(&img);
        // Out-of-image arms are ignored, so the top-left corner survives.
        let expected = from_rows(&[
            &[255, 255, 0, 0],
            &[255, 255, 0, 0],
            &[0, 0, 0, 0],
            &[0, 0, 0, 0],
        ]);
        assert_eq!(out, expected);
    }

    #[test]
    fn full_image_never_erodes() {
        let img = Image::new_fill(4, 3, 255u8);
        let out = eroded(&img);
        assert_eq!(count_nonzero_u8(&out.as_view()), 12);
    }

    #[test]
    fn erode_into_resizes_destination() {
        let img = Image::new_fill(3, 3, 255u8);
        let mut dst = Image::new_fill(1, 1, 0u8);
        erode_cross_u8_into(&img.as_view(), &mut dst);
        assert_eq!(dst.dims(), (3, 3));
        assert!(dst.data().iter().all(|&v| v == 255));
    }
}
