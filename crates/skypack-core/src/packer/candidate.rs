use std::cmp::Ordering;

/// A pending box as seen by candidate evaluation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingBox {
    /// Position in the pending set.
    pub slot: usize,
    /// Position in the packer's input (sorted) order.
    pub index: usize,
    pub w: u32,
    pub h: u32,
}

/// Per-placement tuning values, refreshed before every placement.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Heuristics {
    pub spread_factor: u32,
    /// Outer-window width for the adjacent-gap penalty.
    pub h_spread: u32,
    /// Segments narrower than this get filled after a placement.
    pub min_gap: u32,
    /// Smallest pending box height; smaller headroom is dead space.
    pub min_height: u32,
    /// Current lowest skyline height.
    pub lowest: u32,
}

/// One evaluated (box, segment, anchor direction) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackCandidate {
    pub slot: usize,
    pub box_index: usize,
    pub box_w: u32,
    /// Anchor segment index.
    pub segment: usize,
    /// Number of segments spanned; positive when anchored at the segment's left
    /// edge and growing rightward, negative when anchored at its right edge.
    pub crossing: i32,
    pub waste: u64,
    /// Exact-fit bonus, 0..=3.
    pub fit: u8,
    pub spread_ok: bool,
    pub x: u32,
    pub y: u32,
    /// Skyline height over the box once placed.
    pub top: u32,
}

impl PackCandidate {
    pub fn is_left_anchored(&self) -> bool {
        self.crossing > 0
    }

    /// Number of segments the box covers.
    pub fn span(&self) -> usize {
        self.crossing.unsigned_abs() as usize
    }

    /// Total selection order; `Less` means `self` is the better candidate.
    pub fn priority(&self, other: &Self) -> Ordering {
        other
            .spread_ok
            .cmp(&self.spread_ok)
            .then_with(|| self.waste.cmp(&other.waste))
            .then_with(|| other.fit.cmp(&self.fit))
            .then_with(|| other.box_w.cmp(&self.box_w))
            .then_with(|| self.y.cmp(&other.y))
            .then_with(|| self.segment.cmp(&other.segment))
            .then_with(|| self.box_index.cmp(&other.box_index))
            .then_with(|| other.is_left_anchored().cmp(&self.is_left_anchored()))
    }

    pub fn outranks(&self, other: &Self) -> bool {
        self.priority(other) == Ordering::Less
    }
}
