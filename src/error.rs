//! Error taxonomy for range writes and address resolution.
//!
//! "No match" is never an error here: lookups return `Option` and the
//! pipeline reports an unresolved [`Resolution`](crate::pipeline::Resolution).

use thiserror::Error;

use crate::models::{HouseRange, RangeId, Side, StreetId, ZoneId};

/// Caller-supplied data is structurally invalid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("range_start and range_end must be given together")]
    IncompleteRange,

    #[error("range end {end} is lower than range start {start}")]
    InvertedRange { start: u32, end: u32 },

    #[error("address text needs at least {min} non-whitespace characters, got {got}")]
    InputTooShort { min: usize, got: usize },

    #[error("unknown side '{0}' (expected BOTH, EVEN, ODD or ALL)")]
    UnknownSide(String),

    #[error("{0} does not exist")]
    UnknownZone(ZoneId),

    #[error("{0} is inactive")]
    InactiveZone(ZoneId),

    #[error("unit of work is scoped to {expected}, not {got}")]
    StreetMismatch { expected: StreetId, got: StreetId },
}

/// A write would break one of the range table invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("range {range} ({side}) overlaps {existing} of {zone_id} covering {existing_range} ({existing_side})")]
    RangeOverlap {
        existing: RangeId,
        zone_id: ZoneId,
        existing_range: HouseRange,
        existing_side: Side,
        range: HouseRange,
        side: Side,
    },

    #[error("{existing} already maps {zone_id} from number {range_start} ({side})")]
    DuplicateRange {
        existing: RangeId,
        zone_id: ZoneId,
        range_start: u32,
        side: Side,
    },

    #[error("block '{block_label}' is already mapped by {existing} to {zone_id}")]
    DuplicateBlock {
        existing: RangeId,
        zone_id: ZoneId,
        block_label: String,
    },
}

/// Failure of a range store write
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("{0} not found")]
    NotFound(RangeId),
}

/// Failure of the free-text resolution pipeline before any lookup ran
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_message_names_zone_and_interval() {
        let err = ConflictError::RangeOverlap {
            existing: RangeId(4),
            zone_id: ZoneId(12),
            existing_range: HouseRange::new(100, 200).unwrap(),
            existing_side: Side::Both,
            range: HouseRange::new(150, 160).unwrap(),
            side: Side::Even,
        };
        let msg = err.to_string();
        assert!(msg.contains("zone/12"));
        assert!(msg.contains("[100, 200]"));
        assert!(msg.contains("[150, 160] (EVEN)"));
    }
}
