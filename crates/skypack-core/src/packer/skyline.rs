use super::candidate::{Heuristics, PackCandidate, PendingBox};

/// A horizontal span `[x, x + w)` of the skyline whose occupied height is `h`.
///
/// `left_fit`/`right_fit` are the widths of the widest run starting at this segment
/// and extending left/right over segments no taller than it: a box anchored here
/// fits horizontally iff its width is within the fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub x: u32,
    pub w: u32,
    pub h: u32,
    pub left_fit: u32,
    pub right_fit: u32,
}

impl Segment {
    fn flat(x: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            w,
            h,
            left_fit: w,
            right_fit: w,
        }
    }
    /// Exclusive right edge.
    #[inline]
    pub fn end(&self) -> u32 {
        self.x + self.w
    }
}

/// Occupied-height profile of one bin.
///
/// Segments stay sorted by `x`, contiguous, and cover exactly `[0, width)`.
#[derive(Clone, Debug)]
pub struct Skyline {
    width: u32,
    height: u32,
    segments: Vec<Segment>,
    back: Vec<Segment>,
    lowest: u32,
}

impl Skyline {
    pub fn new(width: u32, height: u32) -> Self {
        let mut skyline = Self {
            width,
            height,
            segments: Vec::with_capacity(16),
            back: Vec::with_capacity(16),
            lowest: 0,
        };
        skyline.reset();
        skyline
    }

    /// Back to a single flat segment at height 0.
    pub fn reset(&mut self) {
        self.segments.clear();
        self.segments.push(Segment::flat(0, self.width, 0));
        self.lowest = 0;
    }

    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
    pub fn len(&self) -> usize {
        self.segments.len()
    }
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
    pub fn lowest(&self) -> u32 {
        self.lowest
    }
    pub fn highest(&self) -> u32 {
        self.segments.iter().map(|s| s.h).max().unwrap_or(0)
    }

    /// Box anchored at the left edge of segment `i`, spanning rightward.
    pub(crate) fn anchor_left(
        &self,
        i: usize,
        b: &PendingBox,
        heur: &Heuristics,
    ) -> Option<PackCandidate> {
        let seg = self.segments[i];
        if seg.right_fit < b.w {
            return None;
        }
        let top = seg.h.checked_add(b.h).filter(|&t| t <= self.height)?;

        let mut waste = 0u64;
        let mut last = i;
        let mut covered = seg.w;
        while covered < b.w {
            last += 1;
            let next = self.segments[last];
            waste += deficit(seg.h, &next);
            covered += next.w;
        }

        let tail = self.segments[last];
        let rem = tail.end() - (seg.x + b.w);
        waste += window_waste(
            self.segments[..i].iter().rev(),
            0,
            0,
            top,
            heur.h_spread,
        );
        waste += window_waste(
            self.segments[last + 1..].iter(),
            rem,
            (top - tail.h) as u64 * rem as u64,
            top,
            heur.h_spread,
        );
        waste += headroom_waste(self.height - top, b.w, heur.min_height);

        let mut fit = 0u8;
        if b.w == seg.w {
            fit += 1;
        }
        if top == self.height {
            fit += 1;
        }
        if i > 0 && self.segments[i - 1].h.checked_sub(seg.h) == Some(b.h) {
            fit += 1;
        }

        Some(PackCandidate {
            slot: b.slot,
            box_index: b.index,
            box_w: b.w,
            segment: i,
            crossing: (last - i + 1) as i32,
            waste,
            fit,
            spread_ok: top - heur.lowest <= heur.spread_factor,
            x: seg.x,
            y: seg.h,
            top,
        })
    }

    /// Box anchored at the right edge of segment `i`, spanning leftward.
    pub(crate) fn anchor_right(
        &self,
        i: usize,
        b: &PendingBox,
        heur: &Heuristics,
    ) -> Option<PackCandidate> {
        let seg = self.segments[i];
        if seg.left_fit < b.w {
            return None;
        }
        let top = seg.h.checked_add(b.h).filter(|&t| t <= self.height)?;
        let x = seg.end() - b.w;

        let mut waste = 0u64;
        let mut first = i;
        let mut covered = seg.w;
        while covered < b.w {
            first -= 1;
            let prev = self.segments[first];
            waste += deficit(seg.h, &prev);
            covered += prev.w;
        }

        let head = self.segments[first];
        let rem = x - head.x;
        waste += window_waste(
            self.segments[i + 1..].iter(),
            0,
            0,
            top,
            heur.h_spread,
        );
        waste += window_waste(
            self.segments[..first].iter().rev(),
            rem,
            (top - head.h) as u64 * rem as u64,
            top,
            heur.h_spread,
        );
        waste += headroom_waste(self.height - top, b.w, heur.min_height);

        let mut fit = 0u8;
        if b.w == seg.w {
            fit += 1;
        }
        if top == self.height {
            fit += 1;
        }
        if self
            .segments
            .get(i + 1)
            .and_then(|next| next.h.checked_sub(seg.h))
            == Some(b.h)
        {
            fit += 1;
        }

        Some(PackCandidate {
            slot: b.slot,
            box_index: b.index,
            box_w: b.w,
            segment: i,
            crossing: -((i - first + 1) as i32),
            waste,
            fit,
            spread_ok: top - heur.lowest <= heur.spread_factor,
            x,
            y: seg.h,
            top,
        })
    }

    /// Raises the spanned run of `c` to `c.top`, keeps the uncovered remainder of the
    /// boundary segment, then levels equal neighbours and fills gaps narrower than
    /// `min_gap` that sit between taller neighbours.
    pub(crate) fn place(&mut self, c: &PackCandidate, w: u32, min_gap: u32) {
        let segs = &self.segments;
        let back = &mut self.back;
        back.clear();

        if c.is_left_anchored() {
            let last = c.segment + c.span() - 1;
            let tail = segs[last];
            let end = c.x + w;
            back.extend_from_slice(&segs[..c.segment]);
            back.push(Segment::flat(c.x, w, c.top));
            if tail.end() > end {
                back.push(Segment::flat(end, tail.end() - end, tail.h));
            }
            back.extend_from_slice(&segs[last + 1..]);
        } else {
            let first = c.segment + 1 - c.span();
            let head = segs[first];
            back.extend_from_slice(&segs[..first]);
            if c.x > head.x {
                back.push(Segment::flat(head.x, c.x - head.x, head.h));
            }
            back.push(Segment::flat(c.x, w, c.top));
            back.extend_from_slice(&segs[c.segment + 1..]);
        }

        merge_level(back);
        fill_narrow_gaps(back, min_gap, self.height);
        merge_level(back);

        std::mem::swap(&mut self.segments, &mut self.back);
        self.refresh();
        debug_assert!(self.is_well_formed());
    }

    /// Recomputes `left_fit`/`right_fit` and the lowest height.
    fn refresh(&mut self) {
        let n = self.segments.len();
        let mut lowest = self.height;
        for i in 0..n {
            let h = self.segments[i].h;
            lowest = lowest.min(h);
            let mut left_fit = self.segments[i].w;
            for s in self.segments[..i].iter().rev() {
                if s.h > h {
                    break;
                }
                left_fit += s.w;
            }
            let mut right_fit = self.segments[i].w;
            for s in &self.segments[i + 1..] {
                if s.h > h {
                    break;
                }
                right_fit += s.w;
            }
            self.segments[i].left_fit = left_fit;
            self.segments[i].right_fit = right_fit;
        }
        self.lowest = lowest;
    }

    /// Contiguous, sorted, full-width coverage with heights inside the bin.
    pub fn is_well_formed(&self) -> bool {
        let mut x = 0;
        for s in &self.segments {
            if s.x != x || s.w == 0 || s.h > self.height {
                return false;
            }
            x = s.end();
        }
        x == self.width
    }
}

/// Empty area left under the box above a spanned segment lower than the anchor.
#[inline]
fn deficit(anchor_h: u32, seg: &Segment) -> u64 {
    (anchor_h - seg.h) as u64 * seg.w as u64
}

/// Walks outward from a placement collecting the area between `top` and each
/// segment no taller than it. The area only counts when a taller segment closes
/// the run within `h_spread` pixels: such a pit is too narrow to use later.
fn window_waste<'a>(
    outward: impl Iterator<Item = &'a Segment>,
    mut run: u32,
    mut area: u64,
    top: u32,
    h_spread: u32,
) -> u64 {
    for s in outward {
        if s.h > top {
            return if run < h_spread { area } else { 0 };
        }
        run += s.w;
        area += (top - s.h) as u64 * s.w as u64;
    }
    0
}

/// Headroom lower than every pending box can never be filled.
#[inline]
fn headroom_waste(headroom: u32, w: u32, min_height: u32) -> u64 {
    if headroom < min_height {
        headroom as u64 * w as u64
    } else {
        0
    }
}

fn merge_level(segs: &mut Vec<Segment>) {
    segs.dedup_by(|next, prev| {
        if next.h == prev.h {
            prev.w += next.w;
            true
        } else {
            false
        }
    });
}

/// A segment narrower than `min_gap` with both neighbours taller (bin edges count
/// as full height) is raised into its lower neighbour; on a tie it joins the right one.
fn fill_narrow_gaps(segs: &mut Vec<Segment>, min_gap: u32, bin_height: u32) {
    let mut out: Vec<Segment> = Vec::with_capacity(segs.len());
    let mut i = 0;
    while i < segs.len() {
        let seg = segs[i];
        i += 1;
        if seg.w >= min_gap {
            out.push(seg);
            continue;
        }
        let lh = out.last().map_or(bin_height, |s| s.h);
        let rh = segs.get(i).map_or(bin_height, |s| s.h);
        if lh < seg.h || rh < seg.h {
            out.push(seg);
            continue;
        }
        if lh < rh {
            if let Some(prev) = out.last_mut() {
                prev.w += seg.w;
                continue;
            }
        }
        if let Some(next) = segs.get_mut(i) {
            next.x = seg.x;
            next.w += seg.w;
            continue;
        }
        out.push(seg);
    }
    *segs = out;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Skyline of height `height` made of `(w, h)` runs laid out left to right.
    fn sky(height: u32, profile: &[(u32, u32)]) -> Skyline {
        let width = profile.iter().map(|&(w, _)| w).sum();
        let mut s = Skyline::new(width, height);
        s.segments.clear();
        let mut x = 0;
        for &(w, h) in profile {
            s.segments.push(Segment::flat(x, w, h));
            x += w;
        }
        s.refresh();
        s
    }

    fn heur(h_spread: u32, min_height: u32) -> Heuristics {
        Heuristics {
            spread_factor: 1000,
            h_spread,
            min_gap: 0,
            min_height,
            lowest: 0,
        }
    }

    fn boxed(w: u32, h: u32) -> PendingBox {
        PendingBox {
            slot: 0,
            index: 0,
            w,
            h,
        }
    }

    fn runs(segs: &[Segment]) -> Vec<(u32, u32, u32)> {
        segs.iter().map(|s| (s.x, s.w, s.h)).collect()
    }

    #[test]
    fn fits_span_runs_no_taller_than_the_segment() {
        let s = sky(20, &[(4, 5), (3, 2), (3, 5)]);
        let fits: Vec<(u32, u32)> = s.segments().iter().map(|g| (g.left_fit, g.right_fit)).collect();
        assert_eq!(fits, vec![(4, 10), (3, 3), (10, 3)]);
        assert_eq!(s.lowest(), 2);
    }

    #[test]
    fn spanned_segments_charge_their_deficit() {
        let s = sky(20, &[(4, 5), (3, 2), (3, 5)]);
        let c = s.anchor_left(0, &boxed(7, 3), &heur(100, 1)).expect("left");
        assert_eq!((c.x, c.y, c.top), (0, 5, 8));
        assert_eq!(c.crossing, 2);
        assert_eq!(c.waste, 9);
        assert_eq!(c.fit, 0);

        let c = s.anchor_right(2, &boxed(7, 3), &heur(100, 1)).expect("right");
        assert_eq!((c.x, c.y, c.top), (3, 5, 8));
        assert_eq!(c.crossing, -3);
        assert_eq!(c.waste, 9);
        assert_eq!(c.fit, 0);
    }

    #[test]
    fn side_pit_is_charged_only_within_h_spread() {
        let s = sky(20, &[(6, 0), (2, 1), (4, 9)]);
        let c = s.anchor_left(0, &boxed(6, 4), &heur(3, 1)).expect("left");
        assert_eq!(c.waste, 6);
        assert_eq!(c.fit, 1);
        let c = s.anchor_left(0, &boxed(6, 4), &heur(2, 1)).expect("left");
        assert_eq!(c.waste, 0);
    }

    #[test]
    fn left_side_walk_runs_outward_to_the_wall() {
        let s = sky(20, &[(2, 3), (3, 1), (5, 0)]);
        let c = s.anchor_left(2, &boxed(5, 2), &heur(4, 1)).expect("left");
        assert_eq!(c.waste, 3);
        assert_eq!(c.fit, 1);
        let c = s.anchor_left(2, &boxed(5, 2), &heur(3, 1)).expect("left");
        assert_eq!(c.waste, 0);
    }

    #[test]
    fn remainder_of_the_anchor_segment_starts_the_walk() {
        let s = sky(20, &[(10, 0), (6, 5)]);
        let c = s.anchor_left(0, &boxed(4, 3), &heur(7, 1)).expect("left");
        assert_eq!(c.crossing, 1);
        assert_eq!(c.waste, 18);
        let c = s.anchor_left(0, &boxed(4, 3), &heur(6, 1)).expect("left");
        assert_eq!(c.waste, 0);

        // the box hugs the wall, and the leftover run reaches the bin edge
        let c = s.anchor_right(0, &boxed(4, 3), &heur(7, 1)).expect("right");
        assert_eq!((c.x, c.crossing), (6, -1));
        assert_eq!(c.waste, 0);
    }

    #[test]
    fn partial_right_anchor_remainder_is_walked_leftward() {
        let s = sky(20, &[(3, 1), (3, 4)]);
        let c = s.anchor_right(1, &boxed(5, 2), &heur(100, 1)).expect("right");
        assert_eq!((c.x, c.y, c.top), (1, 4, 6));
        assert_eq!(c.crossing, -2);
        // deficit of the low run; the 1px leftover reaches the bin edge
        assert_eq!(c.waste, 9);
    }

    #[test]
    fn shallow_headroom_is_dead_space() {
        let s = sky(10, &[(8, 0)]);
        let c = s.anchor_left(0, &boxed(8, 7), &heur(100, 4)).expect("left");
        assert_eq!(c.waste, 24);
        assert_eq!(c.fit, 1);
        let c = s.anchor_left(0, &boxed(8, 7), &heur(100, 3)).expect("left");
        assert_eq!(c.waste, 0);
    }

    #[test]
    fn each_fit_bonus_counts_once() {
        // width match and full height
        let s = sky(10, &[(8, 0)]);
        let c = s.anchor_left(0, &boxed(8, 10), &heur(100, 4)).expect("left");
        assert_eq!((c.fit, c.waste), (2, 0));

        // width match and a step equal to the box height on the left
        let s = sky(20, &[(4, 6), (6, 2)]);
        let c = s.anchor_left(1, &boxed(6, 4), &heur(100, 1)).expect("left");
        assert_eq!((c.fit, c.waste), (2, 0));

        // the step only counts toward the anchored side
        let s = sky(20, &[(10, 0), (6, 5)]);
        let left = s.anchor_left(0, &boxed(4, 5), &heur(100, 1)).expect("left");
        let right = s.anchor_right(0, &boxed(4, 5), &heur(100, 1)).expect("right");
        assert_eq!(left.fit, 0);
        assert_eq!(right.fit, 1);
        assert!(right.outranks(&left));
    }

    #[test]
    fn too_tall_or_too_wide_has_no_candidate() {
        let s = sky(10, &[(4, 6), (6, 2)]);
        assert!(s.anchor_left(0, &boxed(2, 5), &heur(100, 1)).is_none());
        assert!(s.anchor_left(1, &boxed(7, 1), &heur(100, 1)).is_none());
        assert!(s.anchor_right(1, &boxed(7, 1), &heur(100, 1)).is_none());
        assert!(s.anchor_right(0, &boxed(5, 1), &heur(100, 1)).is_none());
    }

    #[test]
    fn narrow_gap_joins_its_lower_neighbour() {
        let mut segs = vec![
            Segment::flat(0, 4, 2),
            Segment::flat(4, 2, 0),
            Segment::flat(6, 4, 5),
        ];
        fill_narrow_gaps(&mut segs, 3, 10);
        assert_eq!(runs(&segs), vec![(0, 6, 2), (6, 4, 5)]);

        let mut segs = vec![
            Segment::flat(0, 4, 5),
            Segment::flat(4, 2, 0),
            Segment::flat(6, 4, 3),
        ];
        fill_narrow_gaps(&mut segs, 3, 10);
        assert_eq!(runs(&segs), vec![(0, 4, 5), (4, 6, 3)]);
    }

    #[test]
    fn narrow_gap_tie_goes_right() {
        let mut segs = vec![
            Segment::flat(0, 4, 5),
            Segment::flat(4, 2, 0),
            Segment::flat(6, 4, 5),
        ];
        fill_narrow_gaps(&mut segs, 3, 10);
        assert_eq!(runs(&segs), vec![(0, 4, 5), (4, 6, 5)]);
    }

    #[test]
    fn bin_edge_counts_as_full_height() {
        let mut segs = vec![Segment::flat(0, 2, 0), Segment::flat(2, 8, 5)];
        fill_narrow_gaps(&mut segs, 3, 10);
        assert_eq!(runs(&segs), vec![(0, 10, 5)]);
    }

    #[test]
    fn gap_with_a_lower_neighbour_stays() {
        let mut segs = vec![
            Segment::flat(0, 4, 5),
            Segment::flat(4, 2, 3),
            Segment::flat(6, 4, 1),
        ];
        fill_narrow_gaps(&mut segs, 3, 10);
        assert_eq!(runs(&segs), vec![(0, 4, 5), (4, 2, 3), (6, 4, 1)]);
    }

    #[test]
    fn placing_fills_the_leftover_gap_and_refreshes() {
        let mut s = sky(10, &[(10, 0)]);
        let c = s.anchor_left(0, &boxed(7, 4), &heur(100, 1)).expect("left");
        s.place(&c, 7, 4);
        assert_eq!(runs(s.segments()), vec![(0, 10, 4)]);
        assert_eq!(s.lowest(), 4);
        assert_eq!((s.segments()[0].left_fit, s.segments()[0].right_fit), (10, 10));

        let mut s = sky(10, &[(10, 0)]);
        let c = s.anchor_left(0, &boxed(7, 4), &heur(100, 1)).expect("left");
        s.place(&c, 7, 3);
        assert_eq!(runs(s.segments()), vec![(0, 7, 4), (7, 3, 0)]);
        assert_eq!(s.lowest(), 0);
        assert_eq!(s.segments()[1].left_fit, 3);
    }

    #[test]
    fn placing_merges_equal_levels() {
        let mut s = sky(20, &[(4, 6), (6, 2)]);
        let c = s.anchor_left(1, &boxed(6, 4), &heur(100, 1)).expect("left");
        s.place(&c, 6, 0);
        assert_eq!(runs(s.segments()), vec![(0, 10, 6)]);
    }
}
