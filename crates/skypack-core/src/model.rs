use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// True when the two rects share at least one pixel. Empty rects never intersect.
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.is_empty()
            || r.is_empty()
            || self.x >= r.right()
            || r.x >= self.right()
            || self.y >= r.bottom()
            || r.y >= self.bottom())
    }
}

/// Pivot normalized to a sprite's rect. Values outside `[0, 1]` describe an
/// off-rect pivot and are kept as-is.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Pivot {
    pub x: f32,
    pub y: f32,
}

impl Pivot {
    pub const CENTER: Pivot = Pivot { x: 0.5, y: 0.5 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Absolute image-space position of this pivot on `rect`.
    pub fn to_absolute(self, rect: &Rect) -> (f64, f64) {
        (
            rect.x as f64 + self.x as f64 * rect.w as f64,
            rect.y as f64 + self.y as f64 * rect.h as f64,
        )
    }

    /// Normalizes an absolute position against `rect`. Degenerate axes keep `fallback`.
    pub fn from_absolute(abs: (f64, f64), rect: &Rect, fallback: Pivot) -> Self {
        let x = if rect.w > 0 {
            ((abs.0 - rect.x as f64) / rect.w as f64) as f32
        } else {
            fallback.x
        };
        let y = if rect.h > 0 {
            ((abs.1 - rect.y as f64) / rect.h as f64) as f32
        } else {
            fallback.y
        };
        Self { x, y }
    }
}

/// A named sprite: a sub-rect of a pixel buffer plus its pivot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpriteInfo {
    pub name: String,
    pub rect: Rect,
    #[serde(default = "default_pivot")]
    pub pivot: Pivot,
}

fn default_pivot() -> Pivot {
    Pivot::CENTER
}

impl SpriteInfo {
    pub fn new(name: impl Into<String>, rect: Rect, pivot: Pivot) -> Self {
        Self {
            name: name.into(),
            rect,
            pivot,
        }
    }
}

/// A rectangle handed to the skyline packer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackBox<K = usize> {
    pub key: K,
    pub w: u32,
    pub h: u32,
}

impl<K> PackBox<K> {
    pub fn new(key: K, w: u32, h: u32) -> Self {
        Self { key, w, h }
    }
}

/// Where the packer put a box: bin index and top-left position of the whole box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement<K = usize> {
    pub key: K,
    pub bin: usize,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl<K> Placement<K> {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

/// A sprite as it ends up in the atlas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtlasSprite {
    pub name: String,
    /// Page (bin) index.
    pub page: usize,
    /// Placed content rectangle within the page.
    pub frame: Rect,
    /// Trimmed rectangle in the source sheet.
    pub source: Rect,
    /// Pivot normalized to `frame`.
    pub pivot: Pivot,
    /// Canonical sprite name when this entry shares pixels with another sprite.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alias_of: Option<String>,
}

/// A single atlas page (logical record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: usize,
    pub width: u32,
    pub height: u32,
    pub sprites: Vec<AtlasSprite>,
}

/// Atlas-level metadata used by exporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub format: String,
    pub size: (u32, u32),
    pub spacing: (u32, u32),
    pub margin: (u32, u32),
    pub trim: bool,
    pub trim_color: [u8; 4],
    pub spread_factor: u32,
}

/// Atlas of pages, alias table and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atlas {
    pub pages: Vec<Page>,
    /// Duplicate sprite name -> canonical sprite name.
    pub aliases: BTreeMap<String, String>,
    pub meta: Meta,
}

impl Atlas {
    /// Looks up any input sprite name, aliases included.
    pub fn sprite(&self, name: &str) -> Option<&AtlasSprite> {
        self.pages
            .iter()
            .flat_map(|p| p.sprites.iter())
            .find(|s| s.name == name)
    }

    /// Iterates every sprite entry across all pages.
    pub fn sprites(&self) -> impl Iterator<Item = &AtlasSprite> {
        self.pages.iter().flat_map(|p| p.sprites.iter())
    }

    /// Computes packing statistics for this atlas. Aliases do not count towards used area.
    pub fn stats(&self) -> PackStats {
        let num_pages = self.pages.len();
        let mut num_sprites = 0;
        let mut num_aliases = 0;
        let mut total_page_area = 0u64;
        let mut used_area = 0u64;

        for page in &self.pages {
            total_page_area += page.width as u64 * page.height as u64;
            for sprite in &page.sprites {
                num_sprites += 1;
                if sprite.alias_of.is_some() {
                    num_aliases += 1;
                } else {
                    used_area += sprite.frame.area();
                }
            }
        }

        let occupancy = if total_page_area > 0 {
            used_area as f64 / total_page_area as f64
        } else {
            0.0
        };

        PackStats {
            num_pages,
            num_sprites,
            num_unique: num_sprites - num_aliases,
            num_aliases,
            total_page_area,
            used_area,
            occupancy,
        }
    }
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    pub num_pages: usize,
    /// Every input name, aliases included.
    pub num_sprites: usize,
    /// Sprites that own pixels in a page.
    pub num_unique: usize,
    pub num_aliases: usize,
    pub total_page_area: u64,
    /// Sum of unique frame areas (spacing excluded).
    pub used_area: u64,
    /// used_area / total_page_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Pages: {}, Sprites: {} ({} unique, {} aliased), Occupancy: {:.2}%, Total Area: {} px², Used Area: {} px²",
            self.num_pages,
            self.num_sprites,
            self.num_unique,
            self.num_aliases,
            self.occupancy * 100.0,
            self.total_page_area,
            self.used_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_page_area.saturating_sub(self.used_area)
    }
}
