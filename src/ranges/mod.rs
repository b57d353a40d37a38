//! Street segment range storage with write-time overlap protection.

mod overlap;
mod store;

pub use overlap::{conflicts, find_overlap};
pub use store::{RangeStore, UnitOfWork};
