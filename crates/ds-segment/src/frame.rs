use ds_core::{Error, Image};

/// Region-growing progress of one pixel across tracker calls in a frame.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelType {
    #[default]
    Unvisited = 0,
    /// Candidate seed; refreshes the flood-fill budget when reached.
    Foreground = 1,
    Searched = 2,
}

/// Read-only per-frame inputs, validated to share one size.
#[derive(Debug, Clone, Copy)]
pub struct DepthFrame<'a> {
    depth: &'a Image<f32>,
    area: &'a Image<f32>,
    score: &'a Image<f32>,
}

impl<'a> DepthFrame<'a> {
    pub fn new(
        depth: &'a Image<f32>,
        area: &'a Image<f32>,
        score: &'a Image<f32>,
    ) -> Result<Self, Error> {
        depth.ensure_same_dims(area)?;
        depth.ensure_same_dims(score)?;
        Ok(Self { depth, area, score })
    }

    pub fn width(&self) -> usize {
        self.depth.width()
    }

    pub fn height(&self) -> usize {
        self.depth.height()
    }

    pub fn dims(&self) -> (usize, usize) {
        self.depth.dims()
    }

    pub fn depth(&self) -> &'a Image<f32> {
        self.depth
    }

    pub fn area(&self) -> &'a Image<f32> {
        self.area
    }

    pub fn score(&self) -> &'a Image<f32> {
        self.score
    }
}

/// Caller-owned buffers that accumulate across every tracked point of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationState {
    pub foreground: Image<PixelType>,
    /// Union of every layer segmentation produced this frame (`0` / `255`).
    pub global_segmentation: Image<u8>,
}

impl SegmentationState {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            foreground: Image::new_fill(width, height, PixelType::Unvisited),
            global_segmentation: Image::new_fill(width, height, 0u8),
        }
    }

    pub fn for_frame(frame: &DepthFrame<'_>) -> Self {
        Self::new(frame.width(), frame.height())
    }

    /// Resets both buffers for a new frame of the given size.
    pub fn clear(&mut self, width: usize, height: usize) {
        self.foreground.reset(width, height, PixelType::Unvisited);
        self.global_segmentation.reset(width, height, 0);
    }

    pub fn ensure_matches(&self, frame: &DepthFrame<'_>) -> Result<(), Error> {
        frame.depth().ensure_same_dims(&self.foreground)?;
        frame.depth().ensure_same_dims(&self.global_segmentation)
    }
}

#[cfg(test)]
mod tests {
    use ds_core::{Error, Image};

    use super::{DepthFrame, PixelType, SegmentationState};

    #[test]
    fn frame_requires_matching_buffers() {
        let depth = Image::new_fill(4, 3, 500.0f32);
        let area = Image::new_fill(4, 3, 1.0f32);
        let score = Image::new_fill(3, 4, 0.0f32);

        assert!(matches!(
            DepthFrame::new(&depth, &area, &score),
            Err(Error::DimensionMismatch { .. })
        ));
        let frame = DepthFrame::new(&depth, &area, &area).expect("same dims");
        assert_eq!(frame.dims(), (4, 3));
    }

    #[test]
    fn state_tracks_frame_size() {
        let depth = Image::new_fill(4, 3, 500.0f32);
        let frame = DepthFrame::new(&depth, &depth, &depth).expect("same dims");

        let mut state = SegmentationState::new(2, 2);
        assert!(state.ensure_matches(&frame).is_err());

        state.clear(4, 3);
        assert!(state.ensure_matches(&frame).is_ok());
        assert_eq!(state, SegmentationState::for_frame(&frame));
        assert!(state.foreground.data().iter().all(|&p| p == PixelType::Unvisited));
    }
}
