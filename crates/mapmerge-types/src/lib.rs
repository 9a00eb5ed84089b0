//! Foundation types for MapMerge.
//!
//! This crate provides the data model shared by every other MapMerge crate:
//! the three variants of a map element, their attribute maps and geometries,
//! and the operator's per-field resolution choices.
//!
//! # Key Types
//!
//! - [`ElementId`]: Typed OSM element identifier (`n123`, `w45`, `r7`)
//! - [`AttributeMap`]: Key/value tags of one variant (absent ≡ `null`)
//! - [`Geometry`]: GeoJSON geometry with structural equality
//! - [`ElementVariant`] / [`ConflictElement`]: original, ours, and theirs
//! - [`ResolutionChoice`]: Three-state per-field choice with toggle transition
//! - [`SubmissionId`]: UUID v7 identifier of a submitted merge

pub mod attributes;
pub mod element;
pub mod error;
pub mod geometry;
pub mod resolution;
pub mod submission;

pub use attributes::AttributeMap;
pub use element::{ConflictElement, ElementId, ElementKind, ElementVariant};
pub use error::{TypeError, TypeResult};
pub use geometry::{Geometry, Position};
pub use resolution::{ElementAction, ResolutionChoice, Side, GEOMETRY_KEY};
pub use submission::SubmissionId;
