//! Street segment ranges: the house-number intervals (or block labels)
//! that map a street onto a zone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{StreetId, ZoneId};
use crate::error::ValidationError;

/// Lowest (highest-priority) value accepted for `priority`
pub const MIN_PRIORITY: u8 = 1;

/// Highest value accepted for `priority`; larger inputs are clamped
pub const MAX_PRIORITY: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeId(pub u64);

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "range/{}", self.0)
    }
}

/// Side of the street a range applies to.
///
/// `All` and `Both` mean the same thing; both spellings are accepted
/// because existing data uses either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Both,
    Even,
    Odd,
    All,
}

impl Side {
    /// True for `Both` and `All`
    pub fn covers_both(&self) -> bool {
        matches!(self, Side::Both | Side::All)
    }

    /// Whether a house number with this parity belongs on this side
    pub fn accepts(&self, number: u32) -> bool {
        match self {
            Side::Both | Side::All => true,
            Side::Even => number % 2 == 0,
            Side::Odd => number % 2 == 1,
        }
    }

    /// Whether two sides can claim the same house number
    pub fn overlaps(&self, other: Side) -> bool {
        self.covers_both() || other.covers_both() || *self == other
    }
}

impl Default for Side {
    fn default() -> Self {
        Side::Both
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Both => write!(f, "BOTH"),
            Side::Even => write!(f, "EVEN"),
            Side::Odd => write!(f, "ODD"),
            Side::All => write!(f, "ALL"),
        }
    }
}

impl FromStr for Side {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BOTH" | "AMBOS" => Ok(Side::Both),
            "EVEN" | "PAR" => Ok(Side::Even),
            "ODD" | "IMPAR" => Ok(Side::Odd),
            "ALL" | "TODOS" => Ok(Side::All),
            _ => Err(ValidationError::UnknownSide(s.to_string())),
        }
    }
}

/// Closed house-number interval `[start, end]` with `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HouseRange {
    start: u32,
    end: u32,
}

impl HouseRange {
    pub fn new(start: u32, end: u32) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build from optional bounds: both or neither must be given.
    pub fn from_bounds(start: Option<u32>, end: Option<u32>) -> Result<Option<Self>, ValidationError> {
        match (start, end) {
            (Some(start), Some(end)) => Self::new(start, end).map(Some),
            (None, None) => Ok(None),
            _ => Err(ValidationError::IncompleteRange),
        }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn contains(&self, number: u32) -> bool {
        self.start <= number && number <= self.end
    }

    /// Closed-interval intersection
    pub fn intersects(&self, other: &HouseRange) -> bool {
        !(self.end < other.start || self.start > other.end)
    }
}

impl fmt::Display for HouseRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Trim and upper-case a block label; blank labels count as absent.
pub fn normalize_block_label(label: &str) -> Option<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Clamp a requested priority into `[MIN_PRIORITY, MAX_PRIORITY]`, defaulting to 1.
pub fn clamp_priority(priority: Option<i64>) -> u8 {
    match priority {
        None => MIN_PRIORITY,
        Some(p) => p.clamp(MIN_PRIORITY as i64, MAX_PRIORITY as i64) as u8,
    }
}

/// A stored mapping from part of a street onto a zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetSegmentRange {
    pub id: RangeId,
    pub street_id: StreetId,
    pub zone_id: ZoneId,

    /// House-number bounds, absent for block-only records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<HouseRange>,

    pub side: Side,

    /// Normalized (upper-case) block label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_label: Option<String>,

    /// 1 is the highest priority
    pub priority: u8,

    pub active: bool,

    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl StreetSegmentRange {
    pub fn contains(&self, number: u32) -> bool {
        self.range.map(|r| r.contains(number)).unwrap_or(true)
    }
}

/// Input for creating a range
#[derive(Debug, Clone)]
pub struct NewRange {
    pub street_id: StreetId,
    pub zone_id: ZoneId,
    pub range_start: Option<u32>,
    pub range_end: Option<u32>,
    pub side: Side,
    pub block_label: Option<String>,
    pub priority: Option<i64>,
}

impl NewRange {
    /// Numeric range on a street
    pub fn numbered(street_id: StreetId, zone_id: ZoneId, start: u32, end: u32, side: Side) -> Self {
        Self {
            street_id,
            zone_id,
            range_start: Some(start),
            range_end: Some(end),
            side,
            block_label: None,
            priority: None,
        }
    }

    /// Block-only record on a street
    pub fn block(street_id: StreetId, zone_id: ZoneId, label: &str) -> Self {
        Self {
            street_id,
            zone_id,
            range_start: None,
            range_end: None,
            side: Side::Both,
            block_label: Some(label.to_string()),
            priority: None,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_block_label(mut self, label: &str) -> Self {
        self.block_label = Some(label.to_string());
        self
    }
}

/// Patch for an existing range. `None` keeps the stored value; the nested
/// `Option`s allow clearing the numeric range or the block label.
#[derive(Debug, Clone, Default)]
pub struct RangeUpdate {
    pub zone_id: Option<ZoneId>,
    pub bounds: Option<(Option<u32>, Option<u32>)>,
    pub side: Option<Side>,
    pub block_label: Option<Option<String>>,
    pub priority: Option<i64>,
}

impl RangeUpdate {
    pub fn bounds(start: u32, end: u32) -> Self {
        Self {
            bounds: Some((Some(start), Some(end))),
            ..Default::default()
        }
    }
}
