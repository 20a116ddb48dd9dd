//! Slot mapping for bounded display surfaces.
//!
//! A session may have any number of pieces; dashboards and reports show a
//! fixed number of slots. [`map_to_slot`] projects piece indices onto
//! slots and [`SlotGrid`] keeps the worst verdict seen per slot.

mod grid;
mod mapper;

pub use grid::{SlotCounts, SlotGrid};
pub use mapper::{map_to_slot, DEFAULT_SLOT_COUNT, MAX_SLOT_COUNT};
