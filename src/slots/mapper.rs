//! Projection of piece indices onto display slots.

use std::num::NonZeroUsize;

/// Default number of display slots.
pub const DEFAULT_SLOT_COUNT: usize = 400;

/// Largest slot count an engine configuration accepts.
pub const MAX_SLOT_COUNT: usize = 65_536;

/// Maps a piece index onto a display slot.
///
/// When the artifact has more pieces than there are slots, indices wrap
/// with `piece_index % slot_count`, so several pieces share a slot; the
/// worst-of rule in [`SlotGrid`](crate::slots::SlotGrid) keeps a collision
/// from hiding a threat. Otherwise the mapping is the identity and slots at
/// or beyond `total_pieces` stay empty. An index that does not fit in
/// `usize` maps to `usize::MAX`, which is never a valid slot.
///
/// # Examples
///
/// ```rust
/// use std::num::NonZeroUsize;
/// use torrentguard::slots::map_to_slot;
///
/// let slots = NonZeroUsize::new(400).unwrap();
/// assert_eq!(map_to_slot(800, 1000, slots), 0);
/// assert_eq!(map_to_slot(17, 20, slots), 17);
/// ```
pub fn map_to_slot(piece_index: u64, total_pieces: u64, slot_count: NonZeroUsize) -> usize {
    let slots = slot_count.get() as u64;
    if total_pieces > slots {
        (piece_index % slots) as usize
    } else {
        usize::try_from(piece_index).unwrap_or(usize::MAX)
    }
}
