use std::collections::VecDeque;

use ds_core::{Error, Image, Pixel};
use tracing::trace;

use crate::frame::{DepthFrame, PixelType};

/// Depth band `[reference, reference + bandwidth)` a region must fall in.
///
/// Membership only enforces the far edge: a pixel is in range when it has a
/// reading and lies nearer than `reference + bandwidth`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBand {
    pub reference: f32,
    pub bandwidth: f32,
}

impl DepthBand {
    pub fn new(reference: f32, bandwidth: f32) -> Self {
        Self {
            reference,
            bandwidth,
        }
    }

    pub fn far_limit(&self) -> f32 {
        self.reference + self.bandwidth
    }

    #[inline]
    pub fn contains(&self, depth: f32) -> bool {
        depth != 0.0 && depth < self.far_limit()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloodParams {
    pub seed: Pixel,
    pub band: DepthBand,
    /// Active points only start spending budget once anything is in range.
    pub active: bool,
    pub max_ttl: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FloodStats {
    /// Queue entries taken off the queue.
    pub dequeued: usize,
    /// Entries that still had budget and were marked searched.
    pub searched: usize,
    /// Pixels written to the layer segmentation.
    pub segmented: usize,
}

#[derive(Debug, Clone, Copy)]
struct PointTtl {
    point: Pixel,
    ttl: f32,
    path_in_range: bool,
}

/// Breadth-first region grower with reusable visited/queue scratch.
#[derive(Debug, Clone, Default)]
pub struct FloodFill {
    visited: Vec<bool>,
    queue: VecDeque<PointTtl>,
}

impl FloodFill {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grows a region from `params.seed`, writing `255` into `layer` for every
    /// in-range pixel reached and marking processed pixels `Searched`.
    ///
    /// Budget decays by `sqrt(area)` per expanded pixel and is refilled to
    /// `max_ttl` on pixels already marked `Foreground`. Once a branch reaches
    /// an in-range pixel it never expands through out-of-range pixels again.
    /// Neighbours are enqueued right, left, down, up, each at most once.
    ///
    /// Fails with [`Error::DimensionMismatch`] unless `foreground` and `layer`
    /// match the frame. A seed outside the frame grows nothing.
    pub fn segment_foreground(
        &mut self,
        frame: &DepthFrame<'_>,
        foreground: &mut Image<PixelType>,
        layer: &mut Image<u8>,
        params: &FloodParams,
    ) -> Result<FloodStats, Error> {
        frame.depth().ensure_same_dims(foreground)?;
        frame.depth().ensure_same_dims(layer)?;

        let mut stats = FloodStats::default();
        let (width, height) = frame.dims();
        let Some(seed_idx) = frame.depth().offset(params.seed) else {
            return Ok(stats);
        };

        let depth = frame.depth().data();
        let area = frame.area().data();
        let state = foreground.data_mut();
        let mask = layer.data_mut();

        self.visited.clear();
        self.visited.resize(width * height, false);
        self.queue.clear();

        let seed_in_range = params.band.contains(depth[seed_idx]);
        let mut any_in_range = seed_in_range;

        self.visited[seed_idx] = true;
        self.queue.push_back(PointTtl {
            point: params.seed,
            ttl: params.max_ttl,
            path_in_range: seed_in_range,
        });

        while let Some(entry) = self.queue.pop_front() {
            stats.dequeued += 1;
            let p = entry.point;
            let idx = p.y * width + p.x;
            let mut ttl = entry.ttl;
            let mut path_in_range = entry.path_in_range;

            if state[idx] == PixelType::Foreground {
                ttl = params.max_ttl;
            }
            if ttl <= 0.0 {
                continue;
            }

            state[idx] = PixelType::Searched;
            stats.searched += 1;

            let point_in_range = params.band.contains(depth[idx]);
            if path_in_range && !point_in_range {
                continue;
            }

            // The flag is read mid-traversal, so decay depends on FIFO order.
            if !params.active || any_in_range {
                ttl -= area[idx].sqrt();
            }

            if point_in_range {
                path_in_range = true;
                any_in_range = true;
                mask[idx] = 255;
                stats.segmented += 1;
            }

            let right = (p.x + 1 < width).then_some(p.right());
            let down = (p.y + 1 < height).then_some(p.down());
            for n in [right, p.left(), down, p.up()].into_iter().flatten() {
                let n_idx = n.y * width + n.x;
                if self.visited[n_idx] {
                    continue;
                }
                self.visited[n_idx] = true;
                self.queue.push_back(PointTtl {
                    point: n,
                    ttl,
                    path_in_range,
                });
            }
        }

        trace!(
            seed_x = params.seed.x,
            seed_y = params.seed.y,
            dequeued = stats.dequeued,
            searched = stats.searched,
            segmented = stats.segmented,
            "flood fill finished"
        );
        Ok(stats)
    }
}
