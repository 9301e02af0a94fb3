//! Depth-image region growing and seed re-convergence for hand tracking.
//!
//! Per frame, the caller builds three fields from the depth buffer:
//! - [`calculate_segment_area`]: world-space surface area of every pixel,
//!   used as the flood-fill step cost.
//! - [`calculate_basic_score`]: height + nearness score used to pick seeds.
//! - [`calculate_edge_distance`]: area-weighted distance to the boundary of
//!   a segmentation mask.
//!
//! Each tracked point then runs [`SegmentationTracker::converge`]: a
//! distance-budgeted breadth-first flood fill restricted to a depth band,
//! followed by re-seeding at the best-scoring pixel of the grown region,
//! until the seed stops moving. Regions accumulate in a caller-owned
//! [`SegmentationState`]; [`find_foreground_pixel`] enumerates leftover
//! candidate seeds.
//!
//! Missing results are `None`; callers that need the `(-1, -1)` convention
//! use [`ds_core::Pixel::coords_or_invalid`].
//!
//! Depth-to-world mapping is pluggable through [`DepthToWorld`];
//! [`PinholeConversion`] models a typical structured-light sensor.

mod area;
mod conversion;
mod edge;
mod flood;
mod frame;
mod scan;
mod score;
mod tracker;

pub use area::{calculate_segment_area, calculate_segment_area_into, depth_triangle_area};
pub use conversion::{DepthToWorld, PinholeConversion};
pub use edge::{calculate_edge_distance, calculate_edge_distance_into};
pub use flood::{DepthBand, FloodFill, FloodParams, FloodStats};
pub use frame::{DepthFrame, PixelType, SegmentationState};
pub use scan::find_foreground_pixel;
pub use score::{MAX_DEPTH, ScoreConfig, calculate_basic_score, calculate_basic_score_into};
pub use tracker::{
    Convergence, SegmentationConfig, SegmentationTracker, StopReason, TrackedPointType,
    TrackingContext, converge_track_point_from_seed,
};
