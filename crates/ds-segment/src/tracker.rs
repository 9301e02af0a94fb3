use ds_core::{Error, Image, Pixel};
use tracing::debug;

use crate::flood::{DepthBand, FloodFill, FloodParams};
use crate::frame::{DepthFrame, SegmentationState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackedPointType {
    #[default]
    Candidate,
    /// Currently pursued; searches farther until it touches valid depth.
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingContext {
    pub seed: Pixel,
    pub reference_depth: f32,
    pub bandwidth_depth: f32,
    pub point_type: TrackedPointType,
    /// Upper bound on tracker passes; `0` still runs one pass.
    pub iteration_max: usize,
}

impl TrackingContext {
    pub fn depth_band(&self) -> DepthBand {
        DepthBand::new(self.reference_depth, self.bandwidth_depth)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentationConfig {
    /// Flood-fill distance budget, in world units.
    pub max_ttl: f32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self { max_ttl: 250.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The tracker returned its own seed.
    FixedPoint,
    IterationLimit,
    /// A pass grew an empty region.
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    pub point: Option<Pixel>,
    pub iterations: usize,
    pub stop: StopReason,
}

/// Flood fill + best-score re-seeding with reusable scratch buffers.
#[derive(Debug, Clone, Default)]
pub struct SegmentationTracker {
    cfg: SegmentationConfig,
    flood: FloodFill,
    layer: Image<u8>,
}

impl SegmentationTracker {
    pub fn new(cfg: SegmentationConfig) -> Self {
        Self {
            cfg,
            flood: FloodFill::new(),
            layer: Image::default(),
        }
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.cfg
    }

    /// Segmentation grown by the most recent tracker pass.
    pub fn layer_segmentation(&self) -> &Image<u8> {
        &self.layer
    }

    /// Runs one flood fill from `seed` and returns the best-scoring pixel of
    /// the grown region, or `None` if the region is empty.
    ///
    /// The region is OR-merged into `state.global_segmentation`.
    pub fn track_point_from_seed(
        &mut self,
        frame: &DepthFrame<'_>,
        state: &mut SegmentationState,
        ctx: &TrackingContext,
        seed: Pixel,
    ) -> Result<Option<Pixel>, Error> {
        state.ensure_matches(frame)?;
        if !frame.depth().contains(seed) {
            return Err(Error::OutOfBounds);
        }
        self.track_pass(frame, state, ctx, seed)
    }

    /// Re-seeds from each pass's best pixel until the seed stops moving,
    /// the region is lost or `ctx.iteration_max` passes have run.
    pub fn converge(
        &mut self,
        frame: &DepthFrame<'_>,
        state: &mut SegmentationState,
        ctx: &TrackingContext,
    ) -> Result<Convergence, Error> {
        state.ensure_matches(frame)?;
        if !frame.depth().contains(ctx.seed) {
            return Err(Error::OutOfBounds);
        }

        let mut seed = ctx.seed;
        let mut iterations = 0usize;
        let outcome = loop {
            let next = self.track_pass(frame, state, ctx, seed)?;
            iterations += 1;

            let stop = match next {
                None => StopReason::Lost,
                Some(p) if p == seed => StopReason::FixedPoint,
                Some(_) if iterations >= ctx.iteration_max => StopReason::IterationLimit,
                Some(p) => {
                    seed = p;
                    continue;
                }
            };
            break Convergence {
                point: next,
                iterations,
                stop,
            };
        };

        debug!(
            seed_x = ctx.seed.x,
            seed_y = ctx.seed.y,
            point = ?outcome.point,
            iterations = outcome.iterations,
            stop = ?outcome.stop,
            "track point converged"
        );
        Ok(outcome)
    }

    pub fn converge_track_point_from_seed(
        &mut self,
        frame: &DepthFrame<'_>,
        state: &mut SegmentationState,
        ctx: &TrackingContext,
    ) -> Result<Option<Pixel>, Error> {
        Ok(self.converge(frame, state, ctx)?.point)
    }

    fn track_pass(
        &mut self,
        frame: &DepthFrame<'_>,
        state: &mut SegmentationState,
        ctx: &TrackingContext,
        seed: Pixel,
    ) -> Result<Option<Pixel>, Error> {
        let (width, height) = frame.dims();
        self.layer.reset(width, height, 0);

        let params = FloodParams {
            seed,
            band: ctx.depth_band(),
            active: ctx.point_type == TrackedPointType::Active,
            max_ttl: self.cfg.max_ttl,
        };
        self.flood
            .segment_foreground(frame, &mut state.foreground, &mut self.layer, &params)?;

        for (g, &l) in state
            .global_segmentation
            .data_mut()
            .iter_mut()
            .zip(self.layer.data())
        {
            *g |= l;
        }

        Ok(best_in_mask(frame.score(), &self.layer))
    }
}

/// First maximum of `score` in row-major order among pixels set in `mask`.
fn best_in_mask(score: &Image<f32>, mask: &Image<u8>) -> Option<Pixel> {
    let mut best: Option<(usize, f32)> = None;
    for (i, (&s, &m)) in score.data().iter().zip(mask.data()).enumerate() {
        if m == 0 {
            continue;
        }
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| score.pixel_at(i))
}

/// One-shot convergence with a default-configured tracker.
pub fn converge_track_point_from_seed(
    frame: &DepthFrame<'_>,
    state: &mut SegmentationState,
    ctx: &TrackingContext,
) -> Result<Option<Pixel>, Error> {
    SegmentationTracker::default().converge_track_point_from_seed(frame, state, ctx)
}
