use ds_core::{Error, Image};

use crate::conversion::DepthToWorld;

/// Far limit of the sensor range, in depth-buffer units.
pub const MAX_DEPTH: f32 = 10000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreConfig {
    /// Weight of world-space height (world Y).
    pub height_factor: f32,
    /// Weight of nearness, `max_depth - world Z`.
    pub depth_factor: f32,
    pub resize_factor: f32,
    pub max_depth: f32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            height_factor: 1.0,
            depth_factor: 1.0,
            resize_factor: 1.0,
            max_depth: MAX_DEPTH,
        }
    }
}

/// Scores every pixel by height and nearness; pixels without depth score `0`.
pub fn calculate_basic_score<C: DepthToWorld + ?Sized>(
    depth: &Image<f32>,
    conv: &C,
    cfg: &ScoreConfig,
) -> Image<f32> {
    let mut score = Image::new_fill(depth.width(), depth.height(), 0.0f32);
    fill_basic_score(depth, conv, cfg, &mut score);
    score
}

pub fn calculate_basic_score_into<C: DepthToWorld + ?Sized>(
    depth: &Image<f32>,
    conv: &C,
    cfg: &ScoreConfig,
    score: &mut Image<f32>,
) -> Result<(), Error> {
    depth.ensure_same_dims(score)?;
    fill_basic_score(depth, conv, cfg, score);
    Ok(())
}

fn fill_basic_score<C: DepthToWorld + ?Sized>(
    depth: &Image<f32>,
    conv: &C,
    cfg: &ScoreConfig,
    score: &mut Image<f32>,
) {
    let width = depth.width();
    for (i, (&d, s)) in depth.data().iter().zip(score.data_mut()).enumerate() {
        *s = if d == 0.0 {
            0.0
        } else {
            let (x, y) = ((i % width) as f32, (i / width) as f32);
            let world = conv.depth_to_world(x, y, d, cfg.resize_factor);
            world.y * cfg.height_factor + (cfg.max_depth - world.z) * cfg.depth_factor
        };
    }
}

#[cfg(test)]
mod tests {
    use ds_core::{Error, Image, Pixel};

    use super::{ScoreConfig, calculate_basic_score, calculate_basic_score_into};
    use crate::conversion::PinholeConversion;
    use crate::conversion::tests::Orthographic;

    #[test]
    fn combines_height_and_inverted_depth() {
        let depth = Image::from_vec(2, 2, vec![0.0f32, 9000.0, 8000.0, 9500.0]).expect("valid");
        let cfg = ScoreConfig {
            height_factor: 2.0,
            depth_factor: 0.5,
            ..ScoreConfig::default()
        };

        let score = calculate_basic_score(&depth, &Orthographic, &cfg);
        assert_eq!(score.get(Pixel::new(0, 0)), Some(&0.0));
        // (x=1, y=0): 0 * 2 + (10000 - 9000) * 0.5
        assert!((score.get(Pixel::new(1, 0)).expect("in bounds") - 500.0).abs() < 1e-3);
        // (x=0, y=1): 1 * 2 + (10000 - 8000) * 0.5
        assert!((score.get(Pixel::new(0, 1)).expect("in bounds") - 1002.0).abs() < 1e-3);
        // (x=1, y=1): 1 * 2 + (10000 - 9500) * 0.5
        assert!((score.get(Pixel::new(1, 1)).expect("in bounds") - 252.0).abs() < 1e-3);
    }

    #[test]
    fn nearer_and_higher_pixels_score_more_with_pinhole() {
        let depth = Image::new_fill(320, 240, 1500.0f32);
        let score = calculate_basic_score(&depth, &PinholeConversion::default(), &ScoreConfig::default());

        let top = *score.get(Pixel::new(160, 10)).expect("in bounds");
        let bottom = *score.get(Pixel::new(160, 230)).expect("in bounds");
        assert!(top > bottom);
        assert!(score.data().iter().all(|&s| s > 0.0));

        let mut nearer = depth.clone();
        *nearer.get_mut(Pixel::new(160, 230)).expect("in bounds") = 1000.0;
        let rescored =
            calculate_basic_score(&nearer, &PinholeConversion::default(), &ScoreConfig::default());
        assert!(*rescored.get(Pixel::new(160, 230)).expect("in bounds") > bottom);
    }

    #[test]
    fn into_variant_overwrites_and_checks_dimensions() {
        let depth = Image::new_fill(3, 2, 0.0f32);
        let mut score = Image::new_fill(3, 2, 42.0f32);
        calculate_basic_score_into(&depth, &Orthographic, &ScoreConfig::default(), &mut score)
            .expect("same dims");
        assert!(score.data().iter().all(|&s| s == 0.0));

        let mut wrong = Image::new_fill(2, 3, 0.0f32);
        assert!(matches!(
            calculate_basic_score_into(&depth, &Orthographic, &ScoreConfig::default(), &mut wrong),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
