//! Preferred labels and annotation merging
//!
//! The projection builder hands us an entity -> labels mapping plus raw
//! annotation token lists. [`AnnotationMerger`] persists both and returns
//! the combined listing used by downstream embedding jobs.

mod merger;
mod projection;

pub use self::{merger::*, projection::*};
