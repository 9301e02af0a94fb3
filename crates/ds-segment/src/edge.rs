use ds_core::{Error, Image};
use ds_morph::{count_nonzero_u8, dilate_cross_u8, erode_cross_u8_into};
use tracing::debug;

/// Area-weighted distance of every mask pixel to the mask boundary.
///
/// The mask is dilated once, then eroded repeatedly; after every erosion the
/// area of each surviving pixel is added to its accumulator. Erosion stops
/// when nothing survives, when everything survives (a full mask never
/// erodes), or after `width / 2` rounds. At least one round always runs.
pub fn calculate_edge_distance(
    segmentation: &Image<u8>,
    area: &Image<f32>,
) -> Result<Image<f32>, Error> {
    let mut out = Image::new_fill(segmentation.width(), segmentation.height(), 0.0f32);
    calculate_edge_distance_into(segmentation, area, &mut out)?;
    Ok(out)
}

pub fn calculate_edge_distance_into(
    segmentation: &Image<u8>,
    area: &Image<f32>,
    edge_distance: &mut Image<f32>,
) -> Result<(), Error> {
    segmentation.ensure_same_dims(area)?;
    segmentation.ensure_same_dims(edge_distance)?;

    edge_distance.fill(0.0);
    let len = segmentation.len();
    if len == 0 {
        return Ok(());
    }

    let max_rounds = segmentation.width() / 2;
    let mut eroded = dilate_cross_u8(&segmentation.as_view());
    let mut scratch = Image::new_fill(segmentation.width(), segmentation.height(), 0u8);
    let mut rounds = 0usize;

    loop {
        erode_cross_u8_into(&eroded.as_view(), &mut scratch);
        std::mem::swap(&mut eroded, &mut scratch);

        for ((acc, &a), &m) in edge_distance
            .data_mut()
            .iter_mut()
            .zip(area.data())
            .zip(eroded.data())
        {
            if m != 0 {
                *acc += a;
            }
        }

        let remaining = count_nonzero_u8(&eroded.as_view());
        rounds += 1;
        if remaining == 0 || remaining >= len || rounds >= max_rounds {
            debug!(rounds, remaining, "edge distance accumulated");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use ds_core::{Error, Image, Pixel};

    use super::calculate_edge_distance;

    fn block_mask(width: usize, height: usize, x0: usize, y0: usize, side: usize) -> Image<u8> {
        let mut mask = Image::new_fill(width, height, 0u8);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                *mask.get_mut(Pixel::new(x, y)).expect("in bounds") = 255;
            }
        }
        mask
    }

    #[test]
    fn centre_of_block_is_farthest_from_edge() {
        let mask = block_mask(9, 9, 3, 3, 3);
        let area = Image::new_fill(9, 9, 2.0f32);

        let out = calculate_edge_distance(&mask, &area).expect("same dims");
        assert_eq!(out.get(Pixel::new(4, 4)), Some(&4.0));
        for (x, y) in [(3, 3), (4, 3), (5, 5), (3, 5)] {
            assert_eq!(out.get(Pixel::new(x, y)), Some(&2.0), "at ({x}, {y})");
        }
        // Pixels added by the hole-closing dilation erode first.
        assert_eq!(out.get(Pixel::new(2, 4)), Some(&0.0));
        assert_eq!(out.get(Pixel::new(0, 0)), Some(&0.0));
    }

    #[test]
    fn accumulates_local_area_not_a_constant() {
        let mask = block_mask(9, 9, 3, 3, 3);
        let mut area = Image::new_fill(9, 9, 1.0f32);
        *area.get_mut(Pixel::new(4, 4)).expect("in bounds") = 10.0;

        let out = calculate_edge_distance(&mask, &area).expect("same dims");
        assert_eq!(out.get(Pixel::new(4, 4)), Some(&20.0));
        assert_eq!(out.get(Pixel::new(3, 3)), Some(&1.0));
    }

    #[test]
    fn full_mask_stops_after_one_round() {
        let mask = Image::new_fill(4, 4, 255u8);
        let area = Image::new_fill(4, 4, 1.5f32);

        let out = calculate_edge_distance(&mask, &area).expect("same dims");
        assert!(out.data().iter().all(|&d| d == 1.5));
    }

    #[test]
    fn rounds_are_capped_at_half_width() {
        // Rows 0, 1, 9 and 10 are empty; every column is full width so only
        // vertical erosion happens. Width 5 caps the run at 2 rounds.
        let mut mask = Image::new_fill(5, 11, 255u8);
        for y in [0, 1, 9, 10] {
            mask.row_mut(y).fill(0);
        }
        let area = Image::new_fill(5, 11, 1.0f32);

        let out = calculate_edge_distance(&mask, &area).expect("same dims");
        assert_eq!(out.get(Pixel::new(2, 1)), Some(&0.0));
        assert_eq!(out.get(Pixel::new(2, 2)), Some(&1.0));
        assert_eq!(out.get(Pixel::new(2, 5)), Some(&2.0));
        assert_eq!(out.get(Pixel::new(2, 8)), Some(&1.0));
    }

    #[test]
    fn empty_mask_yields_zeros() {
        let mask = Image::new_fill(6, 6, 0u8);
        let area = Image::new_fill(6, 6, 3.0f32);
        let out = calculate_edge_distance(&mask, &area).expect("same dims");
        assert!(out.data().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn rejects_mismatched_area() {
        let mask = Image::new_fill(6, 6, 0u8);
        let area = Image::new_fill(6, 5, 3.0f32);
        assert_eq!(
            calculate_edge_distance(&mask, &area),
            Err(Error::DimensionMismatch {
                expected: (6, 6),
                actual: (6, 5)
            })
        );
    }
}
