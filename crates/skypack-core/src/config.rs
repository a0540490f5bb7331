use crate::model::Pivot;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Order in which unique sprites are handed to the packer. All orders are stable:
/// ties keep input order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Width descending, then height ascending.
    WidthDesc,
    AreaDesc,
    HeightDesc,
    None,
}

impl FromStr for SortOrder {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "width_desc" => Ok(Self::WidthDesc),
            "area_desc" => Ok(Self::AreaDesc),
            "height_desc" => Ok(Self::HeightDesc),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// Pivot presets for sprites whose source carries no pivot of its own.
/// Coordinates are image space: y grows downward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PivotAlignment {
    Center,
    TopLeft,
    TopCenter,
    TopRight,
    LeftCenter,
    RightCenter,
    BottomLeft,
    BottomCenter,
    BottomRight,
    /// Already normalized.
    Custom { x: f32, y: f32 },
    /// Pixel offset from the sprite's top-left corner.
    Pixel { x: u32, y: u32 },
}

impl PivotAlignment {
    /// Resolves the preset against a `width` x `height` sprite.
    pub fn resolve(&self, width: u32, height: u32) -> Pivot {
        match *self {
            Self::Center => Pivot::new(0.5, 0.5),
            Self::TopLeft => Pivot::new(0.0, 0.0),
            Self::TopCenter => Pivot::new(0.5, 0.0),
            Self::TopRight => Pivot::new(1.0, 0.0),
            Self::LeftCenter => Pivot::new(0.0, 0.5),
            Self::RightCenter => Pivot::new(1.0, 0.5),
            Self::BottomLeft => Pivot::new(0.0, 1.0),
            Self::BottomCenter => Pivot::new(0.5, 1.0),
            Self::BottomRight => Pivot::new(1.0, 1.0),
            Self::Custom { x, y } => Pivot::new(x, y),
            Self::Pixel { x, y } => Pivot::new(
                if width > 0 { x as f32 / width as f32 } else { 0.0 },
                if height > 0 { y as f32 / height as f32 } else { 0.0 },
            ),
        }
    }
}

impl FromStr for PivotAlignment {
    type Err = ();
    /// Accepts preset names (`center`, `bottom-center`, `bottom_center`, ...),
    /// `custom:X,Y` (normalized) and `pixel:X,Y`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase().replace('-', "_");
        if let Some(rest) = lower.strip_prefix("custom:") {
            let (x, y) = rest.split_once(',').ok_or(())?;
            return Ok(Self::Custom {
                x: x.trim().parse().map_err(|_| ())?,
                y: y.trim().parse().map_err(|_| ())?,
            });
        }
        if let Some(rest) = lower.strip_prefix("pixel:") {
            let (x, y) = rest.split_once(',').ok_or(())?;
            return Ok(Self::Pixel {
                x: x.trim().parse().map_err(|_| ())?,
                y: y.trim().parse().map_err(|_| ())?,
            });
        }
        match lower.as_str() {
            "center" => Ok(Self::Center),
            "top_left" => Ok(Self::TopLeft),
            "top_center" => Ok(Self::TopCenter),
            "top_right" => Ok(Self::TopRight),
            "left_center" => Ok(Self::LeftCenter),
            "right_center" => Ok(Self::RightCenter),
            "bottom_left" => Ok(Self::BottomLeft),
            "bottom_center" => Ok(Self::BottomCenter),
            "bottom_right" => Ok(Self::BottomRight),
            _ => Err(()),
        }
    }
}

/// Configuration for one import: built once, passed by reference through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Atlas page width in pixels.
    pub atlas_width: u32,
    /// Atlas page height in pixels.
    pub atlas_height: u32,

    /// Trim background borders before packing.
    pub trim: bool,
    /// Colour treated as background. Any zero-alpha pixel counts as `[0, 0, 0, 0]`.
    pub trim_color: [u8; 4],
    /// Pixels kept around the trimmed content (clamped to the original rect).
    pub trim_margin: (u32, u32),
    /// Pixels added to every box before packing.
    pub spacing: (u32, u32),

    /// Collapse pixel-identical sprites into one packed entry.
    pub dedup: bool,
    pub sort_order: SortOrder,

    /// Max distance between a placement's top and the lowest skyline point before the
    /// placement loses priority. None => three quarters of the atlas height.
    pub spread_factor: Option<u32>,
    /// Window for the adjacent-gap waste penalty. None => narrowest pending box.
    pub h_spread: Option<u32>,
    /// Skyline segments narrower than this are filled up. None => narrowest pending box.
    pub min_gap_width: Option<u32>,

    /// Run per-sprite pixel work on rayon when the crate feature "parallel" is on.
    pub parallel: bool,
    /// Draw red outlines around placed sprites (debug).
    pub outlines: bool,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            atlas_width: 2048,
            atlas_height: 2048,
            trim: true,
            trim_color: [0, 0, 0, 0],
            trim_margin: (2, 2),
            spacing: (1, 1),
            dedup: true,
            sort_order: SortOrder::WidthDesc,
            spread_factor: None,
            h_spread: None,
            min_gap_width: None,
            parallel: false,
            outlines: false,
        }
    }
}

impl PackConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if the atlas has a zero dimension or the spacing alone
    /// leaves no room for a single pixel of content.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SkypackError;

        if self.atlas_width == 0 || self.atlas_height == 0 {
            return Err(SkypackError::InvalidDimensions {
                width: self.atlas_width,
                height: self.atlas_height,
            });
        }
        if self.spacing.0 >= self.atlas_width || self.spacing.1 >= self.atlas_height {
            return Err(SkypackError::InvalidConfig(format!(
                "spacing {:?} leaves no usable space in a {}x{} atlas",
                self.spacing, self.atlas_width, self.atlas_height
            )));
        }
        Ok(())
    }

    /// Spread factor actually used by the packer.
    pub fn effective_spread_factor(&self) -> u32 {
        self.spread_factor
            .unwrap_or_else(|| (self.atlas_height as u64 * 3 / 4) as u32)
    }

    /// Packer-facing subset of this configuration.
    pub fn skyline(&self) -> SkylineConfig {
        SkylineConfig {
            bin_width: self.atlas_width,
            bin_height: self.atlas_height,
            spread_factor: self.effective_spread_factor(),
            h_spread: self.h_spread,
            min_gap_width: self.min_gap_width,
        }
    }

    /// Create a fluent builder for `PackConfig`.
    pub fn builder() -> PackConfigBuilder {
        PackConfigBuilder::new()
    }
}

/// Geometry-only parameters of the skyline packer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkylineConfig {
    pub bin_width: u32,
    pub bin_height: u32,
    pub spread_factor: u32,
    pub h_spread: Option<u32>,
    pub min_gap_width: Option<u32>,
}

impl SkylineConfig {
    pub fn new(bin_width: u32, bin_height: u32, spread_factor: u32) -> Self {
        Self {
            bin_width,
            bin_height,
            spread_factor,
            h_spread: None,
            min_gap_width: None,
        }
    }
}

/// Builder for `PackConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackConfigBuilder {
    cfg: PackConfig,
}

impl PackConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackConfig::default(),
        }
    }
    pub fn with_atlas_size(mut self, w: u32, h: u32) -> Self {
        self.cfg.atlas_width = w;
        self.cfg.atlas_height = h;
        self
    }
    pub fn trim(mut self, v: bool) -> Self {
        self.cfg.trim = v;
        self
    }
    pub fn trim_color(mut self, v: [u8; 4]) -> Self {
        self.cfg.trim_color = v;
        self
    }
    pub fn trim_margin(mut self, x: u32, y: u32) -> Self {
        self.cfg.trim_margin = (x, y);
        self
    }
    pub fn spacing(mut self, x: u32, y: u32) -> Self {
        self.cfg.spacing = (x, y);
        self
    }
    pub fn dedup(mut self, v: bool) -> Self {
        self.cfg.dedup = v;
        self
    }
    pub fn sort_order(mut self, v: SortOrder) -> Self {
        self.cfg.sort_order = v;
        self
    }
    pub fn spread_factor(mut self, v: Option<u32>) -> Self {
        self.cfg.spread_factor = v;
        self
    }
    pub fn h_spread(mut self, v: Option<u32>) -> Self {
        self.cfg.h_spread = v;
        self
    }
    pub fn min_gap_width(mut self, v: Option<u32>) -> Self {
        self.cfg.min_gap_width = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn outlines(mut self, v: bool) -> Self {
        self.cfg.outlines = v;
        self
    }
    pub fn build(self) -> PackConfig {
        self.cfg
    }
}
