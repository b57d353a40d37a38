//! Overlap rules between street segment ranges.
//!
//! Two ranges on the same street conflict when their sides can claim the
//! same house number and their closed intervals intersect.

use crate::models::{HouseRange, Side, StreetSegmentRange};

/// Whether a candidate `(range, side)` conflicts with an existing record.
///
/// Records without a numeric range never conflict.
pub fn conflicts(range: &HouseRange, side: Side, existing: &StreetSegmentRange) -> bool {
    match existing.range {
        Some(ref other) => side.overlaps(existing.side) && range.intersects(other),
        None => false,
    }
}

/// First record in `existing` that conflicts with the candidate
pub fn find_overlap<'a, I>(existing: I, range: &HouseRange, side: Side) -> Option<&'a StreetSegmentRange>
where
    I: IntoIterator<Item = &'a StreetSegmentRange>,
{
    existing.into_iter().find(|r| conflicts(range, side, r))
}
