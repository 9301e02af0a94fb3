//! Umbrella crate for the `depth-seg` workspace.
//!
//! Re-exports the grid primitives, the cross-element morphology and the
//! segmentation/tracking core so hosts depend on a single crate.

pub use ds_core::*;
pub use ds_morph::*;
pub use ds_segment::*;
