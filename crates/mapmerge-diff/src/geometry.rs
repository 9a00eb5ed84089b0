//! Geometry conflict detection.

use mapmerge_types::Geometry;

/// Returns `true` iff both geometries are present and structurally differ.
///
/// Structure means type plus coordinates in order, compared through the
/// canonical serialized form. A missing geometry on either side never
/// conflicts.
pub fn geometry_conflicted(ours: Option<&Geometry>, theirs: Option<&Geometry>) -> bool {
    let (Some(ours), Some(theirs)) = (ours, theirs) else {
        return false;
    };
    match (ours.canonical_form(), theirs.canonical_form()) {
        (Ok(a), Ok(b)) => a != b,
        _ => ours != theirs,
    }
}
