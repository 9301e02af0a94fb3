use ds_core::{Image, Pixel};

use crate::frame::PixelType;

/// Takes the first `Foreground` pixel in row-major order, downgrading it to
/// `Searched` so repeated calls enumerate each candidate seed once.
pub fn find_foreground_pixel(foreground: &mut Image<PixelType>) -> Option<Pixel> {
    let idx = foreground
        .data()
        .iter()
        .position(|&p| p == PixelType::Foreground)?;
    foreground.data_mut()[idx] = PixelType::Searched;
    Some(foreground.pixel_at(idx))
}
