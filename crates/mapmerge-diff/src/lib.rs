//! Diff engine for MapMerge.
//!
//! Computes the three-way comparison of one element's variants: a per-key
//! attribute comparison against the original, plus a single geometry conflict
//! flag that acts as one extra virtual field (`$map`).
//!
//! # Key Types
//!
//! - [`TagDiff`] / [`FieldComparison`] -- Per-key three-way attribute comparison
//! - [`ElementDiff`] -- Attribute diff, geometry conflict, and deleted branch of one element
//!
//! Every function here is pure: identical inputs always produce an identical,
//! identically ordered result.

pub mod element_diff;
pub mod geometry;
pub mod tag_diff;

pub use element_diff::{diff_element, ElementDiff};
pub use geometry::geometry_conflicted;
pub use tag_diff::{compare_attributes, FieldComparison, TagDiff};
