//! Skyline bin packer.
//!
//! Boxes are placed one at a time: every pending box is scored against every
//! skyline segment, anchored at either end, and the best candidate wins. When
//! nothing fits the packer opens a fresh bin.

use crate::config::SkylineConfig;
use crate::error::{Result, SkypackError};
use crate::model::{PackBox, Placement};
use std::fmt::Display;
use tracing::{debug, trace};

pub mod candidate;
pub mod skyline;

use candidate::{Heuristics, PackCandidate, PendingBox};
use skyline::Skyline;

/// Stateful skyline packer over a fixed list of boxes.
///
/// Boxes are considered in the order given; that order only matters for tie-breaks.
pub struct SkylinePacker<K = usize> {
    config: SkylineConfig,
    boxes: Vec<PackBox<K>>,
    pending: Vec<usize>,
    skyline: Skyline,
    bin: usize,
    placed_in_bin: usize,
}

impl<K: Clone + Display> SkylinePacker<K> {
    /// Rejects any box larger than the bin up front, so `place_next` can always
    /// make progress by opening a new bin.
    pub fn new(config: SkylineConfig, boxes: Vec<PackBox<K>>) -> Result<Self> {
        if config.bin_width == 0 || config.bin_height == 0 {
            return Err(SkypackError::InvalidDimensions {
                width: config.bin_width,
                height: config.bin_height,
            });
        }
        if let Some(b) = boxes
            .iter()
            .find(|b| b.w > config.bin_width || b.h > config.bin_height)
        {
            return Err(oversize(&config, b));
        }
        let mut pending = Vec::with_capacity(boxes.len());
        pending.extend(0..boxes.len());
        Ok(Self {
            skyline: Skyline::new(config.bin_width, config.bin_height),
            config,
            boxes,
            pending,
            bin: 0,
            placed_in_bin: 0,
        })
    }

    /// Places one more box, or returns `Ok(None)` once every box is placed.
    pub fn place_next(&mut self) -> Result<Option<Placement<K>>> {
        if self.pending.is_empty() {
            return Ok(None);
        }

        if let Some(slot) = self.zero_area_slot() {
            let index = self.pending.swap_remove(slot);
            let b = &self.boxes[index];
            trace!(bin = self.bin, w = b.w, h = b.h, "zero-area box");
            return Ok(Some(Placement {
                key: b.key.clone(),
                bin: self.bin,
                x: 0,
                y: 0,
                w: b.w,
                h: b.h,
            }));
        }

        let heur = self.heuristics();
        if let Some(c) = self.best_candidate(&heur) {
            return Ok(Some(self.apply(&c, &heur)));
        }

        if self.placed_in_bin > 0 {
            self.bin += 1;
            self.placed_in_bin = 0;
            self.skyline.reset();
            debug!(bin = self.bin, pending = self.pending.len(), "opening new bin");
            let heur = self.heuristics();
            if let Some(c) = self.best_candidate(&heur) {
                return Ok(Some(self.apply(&c, &heur)));
            }
        }

        let stuck = self
            .pending
            .iter()
            .copied()
            .min()
            .map(|i| &self.boxes[i])
            .ok_or(SkypackError::Empty)?;
        Err(oversize(&self.config, stuck))
    }

    /// Runs `place_next` to completion.
    pub fn pack_all(mut self) -> Result<Vec<Placement<K>>> {
        let mut out = Vec::with_capacity(self.boxes.len());
        while let Some(p) = self.place_next()? {
            out.push(p);
        }
        Ok(out)
    }

    /// Index of the bin currently being filled.
    pub fn bin_index(&self) -> usize {
        self.bin
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn skyline(&self) -> &Skyline {
        &self.skyline
    }

    fn zero_area_slot(&self) -> Option<usize> {
        self.pending
            .iter()
            .enumerate()
            .filter(|&(_, &i)| self.boxes[i].w == 0 || self.boxes[i].h == 0)
            .min_by_key(|&(_, &i)| i)
            .map(|(slot, _)| slot)
    }

    fn heuristics(&self) -> Heuristics {
        let mut min_w = u32::MAX;
        let mut min_h = u32::MAX;
        for &i in &self.pending {
            min_w = min_w.min(self.boxes[i].w);
            min_h = min_h.min(self.boxes[i].h);
        }
        Heuristics {
            spread_factor: self.config.spread_factor,
            h_spread: self.config.h_spread.unwrap_or(min_w),
            min_gap: self.config.min_gap_width.unwrap_or(min_w),
            min_height: min_h,
            lowest: self.skyline.lowest(),
        }
    }

    fn best_candidate(&self, heur: &Heuristics) -> Option<PackCandidate> {
        let mut best: Option<PackCandidate> = None;
        for (slot, &index) in self.pending.iter().enumerate() {
            let b = &self.boxes[index];
            let pb = PendingBox {
                slot,
                index,
                w: b.w,
                h: b.h,
            };
            for seg in 0..self.skyline.len() {
                let left = self.skyline.anchor_left(seg, &pb, heur);
                let right = self.skyline.anchor_right(seg, &pb, heur);
                for c in left.into_iter().chain(right) {
                    if best.as_ref().is_none_or(|cur| c.outranks(cur)) {
                        best = Some(c);
                    }
                }
            }
        }
        best
    }

    fn apply(&mut self, c: &PackCandidate, heur: &Heuristics) -> Placement<K> {
        let index = self.pending.swap_remove(c.slot);
        let b = &self.boxes[index];
        self.skyline.place(c, b.w, heur.min_gap);
        self.placed_in_bin += 1;
        trace!(
            bin = self.bin,
            x = c.x,
            y = c.y,
            w = b.w,
            h = b.h,
            waste = c.waste,
            fit = c.fit,
            "placed"
        );
        Placement {
            key: b.key.clone(),
            bin: self.bin,
            x: c.x,
            y: c.y,
            w: b.w,
            h: b.h,
        }
    }
}

fn oversize<K: Display>(config: &SkylineConfig, b: &PackBox<K>) -> SkypackError {
    SkypackError::Oversize {
        name: b.key.to_string(),
        width: b.w,
        height: b.h,
        bin_width: config.bin_width,
        bin_height: config.bin_height,
    }
}
