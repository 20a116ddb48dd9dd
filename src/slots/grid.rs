//! Bounded grid of slot states.

use crate::core::{SlotState, Verdict};
use crate::slots::mapper::map_to_slot;

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Per-slot tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCounts {
    /// Slots with no contributing piece.
    pub empty: usize,
    /// Slots whose worst piece is clean.
    pub clean: usize,
    /// Slots whose worst piece is suspicious.
    pub suspicious: usize,
    /// Slots with at least one malicious piece.
    pub malicious: usize,
}

/// Fixed-size grid of display slots for one session.
///
/// The grid always holds exactly `slot_count` states, whatever the
/// session's piece count, so its memory is bounded by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGrid {
    slots: Vec<SlotState>,
    total_pieces: u64,
}

impl SlotGrid {
    /// Creates an empty grid.
    pub fn new(total_pieces: u64, slot_count: NonZeroUsize) -> Self {
        Self {
            slots: vec![SlotState::Empty; slot_count.get()],
            total_pieces,
        }
    }

    /// Rebuilds a grid from recorded piece verdicts.
    ///
    /// Used by late-joining consumers; yields the same grid as applying
    /// the pieces one by one in any order.
    pub fn rebuild<I>(total_pieces: u64, slot_count: NonZeroUsize, pieces: I) -> Self
    where
        I: IntoIterator<Item = (u64, Verdict)>,
    {
        let mut grid = Self::new(total_pieces, slot_count);
        for (index, verdict) in pieces {
            grid.apply(index, verdict);
        }
        grid
    }

    /// Folds a piece verdict into its slot.
    ///
    /// Returns the slot index, or `None` if the index does not land on
    /// the grid.
    pub fn apply(&mut self, piece_index: u64, verdict: Verdict) -> Option<usize> {
        let slot = map_to_slot(piece_index, self.total_pieces, self.slot_count());
        let state = self.slots.get_mut(slot)?;
        *state = state.absorb(verdict);
        Some(slot)
    }

    /// Returns the state of a slot.
    pub fn get(&self, slot: usize) -> Option<SlotState> {
        self.slots.get(slot).copied()
    }

    /// Returns all slot states.
    pub fn states(&self) -> &[SlotState] {
        &self.slots
    }

    /// Returns the number of slots.
    pub fn slot_count(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.slots.len()).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the number of slots that can receive pieces.
    pub fn active_slots(&self) -> usize {
        self.slots
            .len()
            .min(usize::try_from(self.total_pieces).unwrap_or(usize::MAX))
    }

    /// Tallies slots by state.
    pub fn counts(&self) -> SlotCounts {
        self.slots
            .iter()
            .fold(SlotCounts::default(), |mut counts, state| {
                match state {
                    SlotState::Empty => counts.empty += 1,
                    SlotState::Clean => counts.clean += 1,
                    SlotState::Suspicious => counts.suspicious += 1,
                    SlotState::Malicious => counts.malicious += 1,
                }
                counts
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_collision_keeps_worst() {
        let mut grid = SlotGrid::new(1000, slots(400));
        grid.apply(0, Verdict::Clean);
        grid.apply(400, Verdict::Malicious);
        grid.apply(800, Verdict::Clean);

        assert_eq!(grid.get(0), Some(SlotState::Malicious));
        assert_eq!(grid.get(1), Some(SlotState::Empty));
    }

    #[test]
    fn test_order_independence() {
        let pieces = [
            (5, Verdict::Clean),
            (405, Verdict::Suspicious),
            (805, Verdict::Clean),
            (1205, Verdict::Malicious),
        ];

        let expected = SlotGrid::rebuild(1600, slots(400), pieces);
        assert_eq!(expected.get(5), Some(SlotState::Malicious));

        // Every rotation and the reverse order land on the same grid.
        for shift in 0..pieces.len() {
            let mut rotated = pieces.to_vec();
            rotated.rotate_left(shift);
            assert_eq!(SlotGrid::rebuild(1600, slots(400), rotated.clone()), expected);

            rotated.reverse();
            assert_eq!(SlotGrid::rebuild(1600, slots(400), rotated), expected);
        }
    }

    #[test]
    fn test_replay_is_idempotent() {
        let mut grid = SlotGrid::new(10, slots(400));
        grid.apply(3, Verdict::Suspicious);
        let once = grid.clone();
        grid.apply(3, Verdict::Suspicious);
        assert_eq!(grid, once);
    }

    #[test]
    fn test_worst_of_reduction() {
        let cases = [
            (vec![], SlotState::Empty),
            (vec![Verdict::Clean, Verdict::Clean], SlotState::Clean),
            (vec![Verdict::Clean, Verdict::Suspicious], SlotState::Suspicious),
            (
                vec![Verdict::Suspicious, Verdict::Malicious, Verdict::Clean],
                SlotState::Malicious,
            ),
        ];

        for (verdicts, expected) in cases {
            let pieces = verdicts
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i as u64 * 4, v));
            let grid = SlotGrid::rebuild(100, slots(4), pieces);
            assert_eq!(grid.get(0), Some(expected));
        }
    }

    #[test]
    fn test_identity_leaves_tail_empty() {
        let mut grid = SlotGrid::new(25, slots(400));
        assert_eq!(grid.active_slots(), 25);

        grid.apply(24, Verdict::Clean);
        let counts = grid.counts();
        assert_eq!(counts.clean, 1);
        assert_eq!(counts.empty, 399);
        assert_eq!(grid.states().len(), 400);
    }

    #[test]
    fn test_active_slots_with_huge_total() {
        let grid = SlotGrid::new(u64::MAX, slots(8));
        assert_eq!(grid.active_slots(), 8);
        assert_eq!(SlotGrid::new(3, slots(8)).active_slots(), 3);
    }

    #[test]
    fn test_off_grid_index() {
        let mut grid = SlotGrid::new(10, slots(8));
        // total 10 > 8 slots, so indices wrap and always land.
        assert_eq!(grid.apply(9, Verdict::Clean), Some(1));

        let mut grid = SlotGrid::new(5, slots(8));
        assert_eq!(grid.apply(9, Verdict::Clean), None);
    }
}
