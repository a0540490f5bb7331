//! Content checksums and duplicate collapsing.
//!
//! Sprites are keyed by their trimmed size and a CRC-32 of their trimmed RGBA
//! bytes. Two different sprites of one size that happen to share a checksum are
//! merged; that risk is accepted and never detected.

use crate::model::Rect;
use crate::pixels::PixelBuffer;
use std::collections::{BTreeMap, HashMap};

/// Reflected CRC-32 (IEEE polynomial) lookup table.
static CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = 0xEDB88320 ^ (crc >> 1);
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Running CRC-32 state: init 0xFFFFFFFF, final XOR 0xFFFFFFFF.
#[derive(Debug, Clone, Copy)]
pub struct Crc32(u32);

impl Default for Crc32 {
    fn default() -> Self {
        Self(0xFFFF_FFFF)
    }
}

impl Crc32 {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            let index = ((self.0 ^ byte as u32) & 0xFF) as usize;
            self.0 = CRC32_TABLE[index] ^ (self.0 >> 8);
        }
    }

    pub fn finish(self) -> u32 {
        !self.0
    }
}

/// CRC-32 of a byte slice.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update(data);
    crc.finish()
}

/// CRC-32 over the RGBA bytes of `rect`, rows top to bottom.
pub fn sprite_checksum<P: PixelBuffer + ?Sized>(pixels: &P, rect: &Rect) -> u32 {
    let mut crc = Crc32::new();
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            crc.update(&pixels.pixel(x, y));
        }
    }
    crc.finish()
}

/// Duplicate sprite name -> canonical sprite name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    map: BTreeMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, duplicate: impl Into<String>, canonical: impl Into<String>) {
        self.map.insert(duplicate.into(), canonical.into());
    }

    /// Canonical name for `name`; `name` itself when it is not an alias.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.map.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.map
    }
}

/// Result of collapsing identical sprites.
#[derive(Debug, Clone, Default)]
pub struct Dedup {
    /// Indices (into the deduplicated slice) of canonical sprites, in first-seen order.
    pub unique: Vec<usize>,
    pub aliases: AliasTable,
}

/// Keeps the first sprite per `(width, height, checksum)` and aliases every later
/// one to it. The size is part of the key: a 2x1 and a 1x2 run of one colour hash
/// the same bytes.
///
/// `names[i]`, `sizes[i]` and `checksums[i]` describe the same sprite.
pub fn dedup<S: AsRef<str>>(names: &[S], sizes: &[(u32, u32)], checksums: &[u32]) -> Dedup {
    debug_assert_eq!(names.len(), checksums.len());
    debug_assert_eq!(names.len(), sizes.len());
    let mut first_seen: HashMap<(u32, u32, u32), usize> = HashMap::with_capacity(names.len());
    let mut out = Dedup {
        unique: Vec::with_capacity(names.len()),
        aliases: AliasTable::new(),
    };
    for (i, ((name, &(w, h)), &crc)) in names.iter().zip(sizes).zip(checksums).enumerate() {
        match first_seen.get(&(w, h, crc)) {
            Some(&canonical) => {
                out.aliases
                    .insert(name.as_ref(), names[canonical].as_ref());
            }
            None => {
                first_seen.insert((w, h, crc), i);
                out.unique.push(i);
            }
        }
    }
    out
}
