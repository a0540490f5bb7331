//! Turns packer placements into page images and atlas records.

use crate::compositing::blit_rgba;
use crate::config::PackConfig;
use crate::dedup::AliasTable;
use crate::model::{AtlasSprite, Page, Placement, Rect, SpriteInfo};
use crate::pipeline::SpriteSheet;
use crate::pixels::PixelBuffer;
use image::RgbaImage;
use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A sprite after trimming, with the index of the sheet holding its pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimmedSprite {
    pub sheet: usize,
    pub info: SpriteInfo,
}

/// Content rect of a placed box: the sprite sits inside its spacing slot,
/// shifted by half the spacing on each axis.
///
/// The offset is added, not subtracted, so the frame never leaves its padded box
/// and a box at the bin edge keeps non-negative coordinates.
pub fn content_frame(placed: &Rect, content: (u32, u32), spacing: (u32, u32)) -> Rect {
    Rect::new(
        placed.x + spacing.0 / 2,
        placed.y + spacing.1 / 2,
        content.0,
        content.1,
    )
}

/// Builds one page per bin. `placements` are keyed by index into `sprites`;
/// `aliases` maps duplicate names onto placed canonical sprites.
pub fn assemble<P: PixelBuffer + Sync>(
    sheets: &[SpriteSheet<P>],
    sprites: &[TrimmedSprite],
    placements: &[Placement<usize>],
    aliases: &AliasTable,
    cfg: &PackConfig,
) -> (Vec<Page>, Vec<RgbaImage>) {
    let num_pages = placements.iter().map(|p| p.bin + 1).max().unwrap_or(0);
    let mut by_page: Vec<Vec<&Placement<usize>>> = vec![Vec::new(); num_pages];
    for p in placements {
        by_page[p.bin].push(p);
    }

    let mut pages: Vec<Page> = by_page
        .iter()
        .enumerate()
        .map(|(id, placed)| Page {
            id,
            width: cfg.atlas_width,
            height: cfg.atlas_height,
            sprites: placed
                .iter()
                .map(|p| atlas_sprite(&sprites[p.key], p, cfg.spacing))
                .collect(),
        })
        .collect();

    broadcast_aliases(&mut pages, sprites, aliases);

    let canvases = render_pages(sheets, sprites, &by_page, cfg);
    (pages, canvases)
}

fn atlas_sprite(sprite: &TrimmedSprite, p: &Placement<usize>, spacing: (u32, u32)) -> AtlasSprite {
    let info = &sprite.info;
    AtlasSprite {
        name: info.name.clone(),
        page: p.bin,
        frame: content_frame(&p.rect(), (info.rect.w, info.rect.h), spacing),
        source: info.rect,
        pivot: info.pivot,
        alias_of: None,
    }
}

/// Every alias gets a copy of its canonical entry on the canonical's page.
fn broadcast_aliases(pages: &mut [Page], sprites: &[TrimmedSprite], aliases: &AliasTable) {
    if aliases.is_empty() {
        return;
    }
    let sources: HashMap<&str, Rect> = sprites
        .iter()
        .map(|s| (s.info.name.as_str(), s.info.rect))
        .collect();
    let mut placed: HashMap<String, AtlasSprite> = HashMap::new();
    for page in pages.iter() {
        for s in &page.sprites {
            placed.insert(s.name.clone(), s.clone());
        }
    }
    for (dup, canonical) in aliases.iter() {
        let Some(base) = placed.get(canonical) else {
            continue;
        };
        let entry = AtlasSprite {
            name: dup.to_string(),
            source: sources.get(dup).copied().unwrap_or(base.source),
            alias_of: Some(canonical.to_string()),
            ..base.clone()
        };
        pages[base.page].sprites.push(entry);
    }
}

fn render_pages<P: PixelBuffer + Sync>(
    sheets: &[SpriteSheet<P>],
    sprites: &[TrimmedSprite],
    by_page: &[Vec<&Placement<usize>>],
    cfg: &PackConfig,
) -> Vec<RgbaImage> {
    let render = |placed: &Vec<&Placement<usize>>| {
        let mut canvas = RgbaImage::new(cfg.atlas_width, cfg.atlas_height);
        for p in placed {
            let sprite = &sprites[p.key];
            let rect = sprite.info.rect;
            let frame = content_frame(&p.rect(), (rect.w, rect.h), cfg.spacing);
            blit_rgba(
                &sheets[sprite.sheet].pixels,
                &rect,
                &mut canvas,
                frame.x,
                frame.y,
                cfg.outlines,
            );
        }
        canvas
    };

    #[cfg(feature = "parallel")]
    {
        if cfg.parallel {
            return by_page.par_iter().map(&render).collect();
        }
    }
    by_page.iter().map(&render).collect()
}
