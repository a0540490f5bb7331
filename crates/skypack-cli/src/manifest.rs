//! Sprite-sheet manifests in the Aseprite / TexturePacker JSON export shape.
//!
//! Both `frames` layouts are accepted: an object keyed by frame name, or an array
//! of frames carrying a `filename`. `meta.image` names the sheet image relative to
//! the manifest file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use skypack_core::config::PivotAlignment;
use skypack_core::model::{Pivot, Rect, SpriteInfo};

#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub frames: Frames,
    pub meta: ManifestMeta,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Frames {
    Hash(BTreeMap<String, FrameEntry>),
    Array(Vec<NamedFrame>),
}

#[derive(Debug, Deserialize)]
pub struct NamedFrame {
    pub filename: String,
    #[serde(flatten)]
    pub entry: FrameEntry,
}

#[derive(Debug, Deserialize)]
pub struct FrameEntry {
    pub frame: JsonRect,
    #[serde(default)]
    pub rotated: bool,
    #[serde(default)]
    pub pivot: Option<JsonPoint>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct JsonRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct JsonPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Deserialize)]
pub struct ManifestMeta {
    pub image: String,
}

impl Manifest {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read manifest {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse manifest {}", path.display()))
    }

    /// Sheet image path, resolved against the manifest's directory.
    pub fn image_path(&self, manifest: &Path) -> PathBuf {
        manifest
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&self.meta.image)
    }

    /// Sprites in manifest order. Frames without a pivot get `default_pivot`.
    pub fn sprites(&self, default_pivot: PivotAlignment) -> anyhow::Result<Vec<SpriteInfo>> {
        let entries: Vec<(&str, &FrameEntry)> = match &self.frames {
            Frames::Hash(map) => map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            Frames::Array(list) => list
                .iter()
                .map(|f| (f.filename.as_str(), &f.entry))
                .collect(),
        };
        entries
            .into_iter()
            .map(|(name, e)| {
                if e.rotated {
                    anyhow::bail!("frame '{name}' is rotated; rotated sheets are not supported");
                }
                let r = e.frame;
                let pivot = e
                    .pivot
                    .map(|p| Pivot::new(p.x, p.y))
                    .unwrap_or_else(|| default_pivot.resolve(r.w, r.h));
                Ok(SpriteInfo::new(
                    sprite_name(name),
                    Rect::new(r.x, r.y, r.w, r.h),
                    pivot,
                ))
            })
            .collect()
    }
}

/// Frame names often carry the source file extension; sprite names do not.
fn sprite_name(frame: &str) -> String {
    const EXTS: [&str; 4] = [".png", ".aseprite", ".ase", ".gif"];
    let lower = frame.to_ascii_lowercase();
    for ext in EXTS {
        if lower.ends_with(ext) {
            return frame[..frame.len() - ext.len()].to_string();
        }
    }
    frame.to_string()
}
