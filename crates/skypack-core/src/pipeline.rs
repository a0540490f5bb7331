use crate::assemble::{TrimmedSprite, assemble, content_frame};
use crate::config::PackConfig;
use crate::dedup::{AliasTable, Dedup, dedup, sprite_checksum};
use crate::error::{Result, SkypackError};
use crate::model::{Atlas, Meta, PackBox, PackStats, Page, Pivot, Placement, Rect, SpriteInfo};
use crate::ordering::packing_order;
use crate::packer::SkylinePacker;
use crate::pixels::PixelBuffer;
use crate::trim::trim_sprite;
use image::RgbaImage;
use std::collections::HashSet;
use std::fmt::Display;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One source image and the named sprites cut from it.
pub struct SpriteSheet<P> {
    pub pixels: P,
    pub sprites: Vec<SpriteInfo>,
}

impl<P: PixelBuffer> SpriteSheet<P> {
    pub fn new(pixels: P, sprites: Vec<SpriteInfo>) -> Self {
        Self { pixels, sprites }
    }

    /// A sheet that is a single sprite covering the whole image.
    pub fn single(name: impl Into<String>, pixels: P, pivot: Pivot) -> Self {
        let rect = Rect::new(0, 0, pixels.width(), pixels.height());
        Self {
            sprites: vec![SpriteInfo::new(name, rect, pivot)],
            pixels,
        }
    }
}

/// Output RGBA page and its logical page record.
pub struct OutputPage {
    pub page: Page,
    pub rgba: RgbaImage,
}

/// Output of a packing run: atlas metadata and RGBA pages.
pub struct PackOutput {
    pub atlas: Atlas,
    pub pages: Vec<OutputPage>,
}

impl PackOutput {
    /// Convenience for `atlas.stats()`.
    pub fn stats(&self) -> PackStats {
        self.atlas.stats()
    }
}

/// Trims, deduplicates, orders and packs every sprite of `sheets`, then renders the pages.
///
/// Fails before producing anything when a sprite cannot fit an empty page.
#[instrument(skip_all)]
pub fn pack_sprites<P: PixelBuffer + Sync>(
    sheets: &[SpriteSheet<P>],
    cfg: &PackConfig,
) -> Result<PackOutput> {
    cfg.validate()?;
    let jobs = collect_jobs(sheets)?;
    if jobs.is_empty() {
        return Err(SkypackError::Empty);
    }

    let prepared = prepare(sheets, &jobs, cfg);
    let (trimmed, checksums): (Vec<TrimmedSprite>, Vec<u32>) = prepared.into_iter().unzip();

    let Dedup { unique, aliases } = if cfg.dedup {
        let names: Vec<&str> = trimmed.iter().map(|s| s.info.name.as_str()).collect();
        let sizes: Vec<(u32, u32)> = trimmed
            .iter()
            .map(|s| (s.info.rect.w, s.info.rect.h))
            .collect();
        dedup(&names, &sizes, &checksums)
    } else {
        Dedup {
            unique: (0..trimmed.len()).collect(),
            aliases: AliasTable::new(),
        }
    };
    debug!(
        sprites = trimmed.len(),
        unique = unique.len(),
        aliases = aliases.len(),
        "deduplicated"
    );

    let sizes: Vec<(u32, u32)> = unique
        .iter()
        .map(|&i| (trimmed[i].info.rect.w, trimmed[i].info.rect.h))
        .collect();
    let boxes: Vec<PackBox<usize>> = packing_order(&sizes, cfg.sort_order)
        .into_iter()
        .map(|o| {
            let (w, h) = padded(sizes[o], cfg.spacing);
            PackBox::new(unique[o], w, h)
        })
        .collect();
    if let Some(b) = boxes
        .iter()
        .find(|b| b.w > cfg.atlas_width || b.h > cfg.atlas_height)
    {
        return Err(SkypackError::Oversize {
            name: trimmed[b.key].info.name.clone(),
            width: b.w,
            height: b.h,
            bin_width: cfg.atlas_width,
            bin_height: cfg.atlas_height,
        });
    }

    let placements = SkylinePacker::new(cfg.skyline(), boxes)?.pack_all()?;
    let (pages, canvases) = assemble(sheets, &trimmed, &placements, &aliases, cfg);
    debug!(pages = pages.len(), "assembled");

    let atlas = Atlas {
        pages: pages.clone(),
        aliases: aliases.into_map(),
        meta: meta(cfg),
    };
    let pages = pages
        .into_iter()
        .zip(canvases)
        .map(|(page, rgba)| OutputPage { page, rgba })
        .collect();
    Ok(PackOutput { atlas, pages })
}

/// Packs `(key, width, height)` sizes without pixel data. Sizes are content sizes;
/// spacing is added for packing and the returned rects are the content frames.
/// Placements come back in placement order.
pub fn pack_layout<K: Clone + Display>(
    inputs: Vec<(K, u32, u32)>,
    cfg: &PackConfig,
) -> Result<Vec<Placement<K>>> {
    cfg.validate()?;
    if inputs.is_empty() {
        return Err(SkypackError::Empty);
    }
    let sizes: Vec<(u32, u32)> = inputs.iter().map(|&(_, w, h)| (w, h)).collect();
    let mut slots: Vec<Option<K>> = inputs.into_iter().map(|(k, _, _)| Some(k)).collect();
    let boxes: Vec<PackBox<K>> = packing_order(&sizes, cfg.sort_order)
        .into_iter()
        .filter_map(|i| {
            let (w, h) = padded(sizes[i], cfg.spacing);
            slots[i].take().map(|k| PackBox::new(k, w, h))
        })
        .collect();

    let placed = SkylinePacker::new(cfg.skyline(), boxes)?.pack_all()?;
    Ok(placed
        .into_iter()
        .map(|p| {
            let frame = content_frame(
                &p.rect(),
                (p.w - cfg.spacing.0, p.h - cfg.spacing.1),
                cfg.spacing,
            );
            Placement {
                key: p.key,
                bin: p.bin,
                x: frame.x,
                y: frame.y,
                w: frame.w,
                h: frame.h,
            }
        })
        .collect())
}

fn padded((w, h): (u32, u32), spacing: (u32, u32)) -> (u32, u32) {
    (w.saturating_add(spacing.0), h.saturating_add(spacing.1))
}

/// Flattens sheets into `(sheet index, sprite)` in input order, rejecting repeated
/// names and rects that leave their sheet.
fn collect_jobs<P: PixelBuffer>(sheets: &[SpriteSheet<P>]) -> Result<Vec<(usize, &SpriteInfo)>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut jobs = Vec::new();
    for (si, sheet) in sheets.iter().enumerate() {
        let (w, h) = (sheet.pixels.width(), sheet.pixels.height());
        let bounds = Rect::new(0, 0, w, h);
        for sprite in &sheet.sprites {
            if !seen.insert(sprite.name.as_str()) {
                return Err(SkypackError::DuplicateName(sprite.name.clone()));
            }
            let r = sprite.rect;
            if r.x.checked_add(r.w).is_none()
                || r.y.checked_add(r.h).is_none()
                || !bounds.contains(&r)
            {
                return Err(SkypackError::SpriteOutOfBounds {
                    name: sprite.name.clone(),
                    rect: r,
                    width: w,
                    height: h,
                });
            }
            jobs.push((si, sprite));
        }
    }
    Ok(jobs)
}

fn prepare<P: PixelBuffer + Sync>(
    sheets: &[SpriteSheet<P>],
    jobs: &[(usize, &SpriteInfo)],
    cfg: &PackConfig,
) -> Vec<(TrimmedSprite, u32)> {
    let one = |&(sheet, sprite): &(usize, &SpriteInfo)| {
        let pixels = &sheets[sheet].pixels;
        let info = if cfg.trim {
            trim_sprite(pixels, sprite, cfg.trim_color, cfg.trim_margin)
        } else {
            sprite.clone()
        };
        let crc = sprite_checksum(pixels, &info.rect);
        (TrimmedSprite { sheet, info }, crc)
    };

    #[cfg(feature = "parallel")]
    {
        if cfg.parallel {
            return jobs.par_iter().map(&one).collect();
        }
    }
    jobs.iter().map(&one).collect()
}

fn meta(cfg: &PackConfig) -> Meta {
    Meta {
        schema_version: "1".into(),
        app: "skypack".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        format: "RGBA8888".into(),
        size: (cfg.atlas_width, cfg.atlas_height),
        spacing: cfg.spacing,
        margin: cfg.trim_margin,
        trim: cfg.trim,
        trim_color: cfg.trim_color,
        spread_factor: cfg.effective_spread_factor(),
    }
}
