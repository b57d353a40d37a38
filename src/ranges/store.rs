//! Street segment range store.
//!
//! Writes go through a [`UnitOfWork`], which holds the table's write lock
//! from the first check to the final write. Two writers can therefore never
//! both pass the overlap check for the same street. Reads only take the
//! read lock and run concurrently.

use std::cmp::Reverse;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use hashbrown::HashMap;
use tracing::{debug, info};

use super::overlap::find_overlap;
use crate::catalog::ZoneCatalog;
use crate::error::{ConflictError, RangeError, ValidationError};
use crate::models::{
    clamp_priority, normalize_block_label, HouseRange, NewRange, RangeId, RangeUpdate, Side,
    StreetId, StreetSegmentRange, ZoneId,
};

#[derive(Default)]
struct RangeTable {
    rows: HashMap<RangeId, StreetSegmentRange>,
    by_street: HashMap<StreetId, Vec<RangeId>>,
    next_id: u64,
}

impl RangeTable {
    /// Active records of a street, optionally leaving one out
    fn active_on(
        &self,
        street_id: StreetId,
        exclude: Option<RangeId>,
    ) -> impl Iterator<Item = &StreetSegmentRange> {
        self.by_street
            .get(&street_id)
            .into_iter()
            .flatten()
            .filter(move |id| Some(**id) != exclude)
            .filter_map(move |id| self.rows.get(id))
            .filter(|r| r.active)
    }
}

/// Field values a record would have after a write, before it is stored
struct Candidate {
    zone_id: ZoneId,
    range: Option<HouseRange>,
    side: Side,
    block_label: Option<String>,
    priority: u8,
}

pub struct RangeStore {
    catalog: Arc<ZoneCatalog>,
    table: RwLock<RangeTable>,
}

impl RangeStore {
    pub fn new(catalog: Arc<ZoneCatalog>) -> Self {
        Self {
            catalog,
            table: RwLock::new(RangeTable::default()),
        }
    }

    pub fn catalog(&self) -> &ZoneCatalog {
        &self.catalog
    }

    /// Open a unit of work scoped to one street.
    ///
    /// Blocks until no other unit of work is open.
    pub fn begin(&self, street_id: StreetId) -> UnitOfWork<'_> {
        UnitOfWork {
            street_id,
            table: self.table.write().unwrap_or_else(PoisonError::into_inner),
            catalog: &self.catalog,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RangeTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert in a unit of work of its own
    pub fn insert(&self, new: NewRange, actor: &str) -> Result<StreetSegmentRange, RangeError> {
        self.begin(new.street_id).insert(new, actor)
    }

    /// Update in a unit of work of its own
    pub fn update(
        &self,
        id: RangeId,
        patch: RangeUpdate,
        actor: &str,
    ) -> Result<StreetSegmentRange, RangeError> {
        let street_id = self.get(id).ok_or(RangeError::NotFound(id))?.street_id;
        self.begin(street_id).update(id, patch, actor)
    }

    /// Soft delete in a unit of work of its own
    pub fn deactivate(&self, id: RangeId, actor: &str) -> Result<StreetSegmentRange, RangeError> {
        let street_id = self.get(id).ok_or(RangeError::NotFound(id))?.street_id;
        self.begin(street_id).deactivate(id, actor)
    }

    pub fn get(&self, id: RangeId) -> Option<StreetSegmentRange> {
        self.read().rows.get(&id).cloned()
    }

    /// Active ranges of `street_id` that may contain `number`: those whose
    /// interval holds it plus those without a numeric interval.
    ///
    /// Ordered by priority, then most recently created first.
    pub fn ranges_containing(&self, street_id: StreetId, number: u32) -> Vec<StreetSegmentRange> {
        let table = self.read();
        let mut hits: Vec<StreetSegmentRange> = table
            .active_on(street_id, None)
            .filter(|r| r.contains(number))
            .cloned()
            .collect();

        // TODO: equal-priority order is a placeholder until the business rule is settled
        hits.sort_by_key(|r| (r.priority, Reverse(r.created_at), Reverse(r.id)));
        hits
    }

    /// Active range carrying the given block label (case-insensitive)
    pub fn range_for_block(&self, street_id: StreetId, block_label: &str) -> Option<StreetSegmentRange> {
        let label = normalize_block_label(block_label)?;
        self.read()
            .active_on(street_id, None)
            .find(|r| r.block_label.as_deref() == Some(label.as_str()))
            .cloned()
    }

    /// Active ranges of a street, numeric ones by start, block-only ones last
    pub fn ranges_for_street(&self, street_id: StreetId) -> Vec<StreetSegmentRange> {
        let mut rows: Vec<StreetSegmentRange> = self.read().active_on(street_id, None).cloned().collect();
        rows.sort_by_key(|r| (r.range.is_none(), r.range.map(|h| h.start()), r.id));
        rows
    }

    /// Number of active ranges
    pub fn len(&self) -> usize {
        self.read().rows.values().filter(|r| r.active).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive write scope over the range table, bound to one street.
///
/// Every check and the write it guards happen while the unit of work is
/// alive; dropping it (or calling [`commit`](UnitOfWork::commit)) releases
/// the lock. A failed operation leaves the table untouched.
pub struct UnitOfWork<'a> {
    street_id: StreetId,
    table: RwLockWriteGuard<'a, RangeTable>,
    catalog: &'a ZoneCatalog,
}

impl<'a> UnitOfWork<'a> {
    pub fn street_id(&self) -> StreetId {
        self.street_id
    }

    fn ensure_street(&self, street_id: StreetId) -> Result<(), ValidationError> {
        if street_id != self.street_id {
            return Err(ValidationError::StreetMismatch {
                expected: self.street_id,
                got: street_id,
            });
        }
        Ok(())
    }

    pub fn insert(&mut self, new: NewRange, actor: &str) -> Result<StreetSegmentRange, RangeError> {
        self.ensure_street(new.street_id)?;

        let candidate = Candidate {
            zone_id: new.zone_id,
            range: HouseRange::from_bounds(new.range_start, new.range_end)?,
            side: new.side,
            block_label: new.block_label.as_deref().and_then(normalize_block_label),
            priority: clamp_priority(new.priority),
        };
        self.validate(&candidate, None)?;

        let table = &mut *self.table;
        table.next_id += 1;
        let id = RangeId(table.next_id);
        let now = Utc::now();
        let row = StreetSegmentRange {
            id,
            street_id: self.street_id,
            zone_id: candidate.zone_id,
            range: candidate.range,
            side: candidate.side,
            block_label: candidate.block_label,
            priority: candidate.priority,
            active: true,
            created_at: now,
            created_by: actor.to_string(),
            updated_at: now,
            updated_by: actor.to_string(),
        };

        table.by_street.entry(self.street_id).or_default().push(id);
        table.rows.insert(id, row.clone());

        debug!(
            "{} created {} on {} -> {} ({:?} {})",
            actor, id, self.street_id, row.zone_id, row.range, row.side
        );
        Ok(row)
    }

    pub fn update(
        &mut self,
        id: RangeId,
        patch: RangeUpdate,
        actor: &str,
    ) -> Result<StreetSegmentRange, RangeError> {
        let current = match self.table.rows.get(&id) {
            Some(r) if r.active => r.clone(),
            _ => return Err(RangeError::NotFound(id)),
        };
        self.ensure_street(current.street_id)?;

        let range = match patch.bounds {
            Some((start, end)) => HouseRange::from_bounds(start, end)?,
            None => current.range,
        };
        let block_label = match patch.block_label {
            Some(label) => label.as_deref().and_then(normalize_block_label),
            None => current.block_label.clone(),
        };
        let candidate = Candidate {
            zone_id: patch.zone_id.unwrap_or(current.zone_id),
            range,
            side: patch.side.unwrap_or(current.side),
            block_label,
            priority: patch.priority.map_or(current.priority, |p| clamp_priority(Some(p))),
        };
        self.validate(&candidate, Some(id))?;

        let row = StreetSegmentRange {
            zone_id: candidate.zone_id,
            range: candidate.range,
            side: candidate.side,
            block_label: candidate.block_label,
            priority: candidate.priority,
            updated_at: Utc::now(),
            updated_by: actor.to_string(),
            ..current
        };
        self.table.rows.insert(id, row.clone());

        info!("{} updated {} on {}", actor, id, self.street_id);
        Ok(row)
    }

    /// Soft delete; deactivating an inactive record is a no-op
    pub fn deactivate(&mut self, id: RangeId, actor: &str) -> Result<StreetSegmentRange, RangeError> {
        let street_id = self
            .table
            .rows
            .get(&id)
            .map(|r| r.street_id)
            .ok_or(RangeError::NotFound(id))?;
        self.ensure_street(street_id)?;

        let row = self.table.rows.get_mut(&id).ok_or(RangeError::NotFound(id))?;
        if row.active {
            row.active = false;
            row.updated_at = Utc::now();
            row.updated_by = actor.to_string();
            info!("{} deactivated {} on {}", actor, id, street_id);
        }
        Ok(row.clone())
    }

    /// Release the lock
    pub fn commit(self) {}

    /// All checks for a write, against the other active ranges of the street
    fn validate(&self, candidate: &Candidate, exclude: Option<RangeId>) -> Result<(), RangeError> {
        self.catalog.active_zone(candidate.zone_id)?;

        let others: Vec<&StreetSegmentRange> = self.table.active_on(self.street_id, exclude).collect();

        if let Some(range) = candidate.range {
            if let Some(dup) = others.iter().find(|r| {
                r.zone_id == candidate.zone_id
                    && r.side == candidate.side
                    && r.range.map(|h| h.start()) == Some(range.start())
            }) {
                debug!("Rejected duplicate of {} on {}", dup.id, self.street_id);
                return Err(ConflictError::DuplicateRange {
                    existing: dup.id,
                    zone_id: dup.zone_id,
                    range_start: range.start(),
                    side: dup.side,
                }
                .into());
            }
        }

        if let Some(label) = candidate.block_label.as_deref() {
            if let Some(dup) = others.iter().find(|r| r.block_label.as_deref() == Some(label)) {
                debug!("Rejected block '{}' already held by {}", label, dup.id);
                return Err(ConflictError::DuplicateBlock {
                    existing: dup.id,
                    zone_id: dup.zone_id,
                    block_label: label.to_string(),
                }
                .into());
            }
        }

        if let Some(range) = candidate.range {
            if let Some(hit) = find_overlap(others.iter().copied(), &range, candidate.side) {
                debug!("Rejected {} {}: overlaps {}", range, candidate.side, hit.id);
                return Err(ConflictError::RangeOverlap {
                    existing: hit.id,
                    zone_id: hit.zone_id,
                    existing_range: hit.range.unwrap_or(range),
                    existing_side: hit.side,
                    range,
                    side: candidate.side,
                }
                .into());
            }
        }

        Ok(())
    }
}
