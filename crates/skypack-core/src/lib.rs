//! Core library for packing sprites into fixed-size atlas pages.
//!
//! - Preprocessing: background trimming with pivot re-normalisation, CRC-32 deduplication
//! - Packing: skyline packer scoring left/right anchored placements by waste and fit,
//!   overflowing into new pages
//! - Pipeline: `pack_sprites` takes sprite sheets and returns pages + metadata;
//!   `pack_layout` packs plain sizes
//!
//! Quick example:
//! ```ignore
//! use skypack_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let img = image::open("hero.png")?.to_rgba8();
//! let sheets = vec![SpriteSheet::single("hero", img, Pivot::CENTER)];
//! let cfg = PackConfig::builder().with_atlas_size(1024, 1024).build();
//! let out = pack_sprites(&sheets, &cfg)?;
//! println!("pages: {}", out.pages.len());
//! # Ok(()) }
//! ```

pub mod assemble;
pub mod compositing;
pub mod config;
pub mod dedup;
pub mod error;
pub mod export;
pub mod model;
pub mod ordering;
pub mod packer;
pub mod pipeline;
pub mod pixels;
pub mod trim;

pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use packer::SkylinePacker;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `skypack_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{PackConfig, PackConfigBuilder, PivotAlignment, SkylineConfig, SortOrder};
    pub use crate::dedup::AliasTable;
    pub use crate::model::{
        Atlas, AtlasSprite, Meta, PackBox, PackStats, Page, Pivot, Placement, Rect, SpriteInfo,
    };
    pub use crate::packer::SkylinePacker;
    pub use crate::pixels::PixelBuffer;
    pub use crate::{
        OutputPage, PackOutput, SpriteSheet, pack_layout, pack_sprites, to_json_array,
        to_json_hash,
    };
}
