use crate::model::Rect;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkypackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid atlas dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Duplicate sprite name: {0}")]
    DuplicateName(String),
    #[error("Sprite '{name}' rect {rect:?} lies outside its {width}x{height} sheet")]
    SpriteOutOfBounds {
        name: String,
        rect: Rect,
        width: u32,
        height: u32,
    },
    /// A box does not fit even on an empty bin.
    #[error("Sprite '{name}' ({width}x{height} incl. spacing) does not fit in a {bin_width}x{bin_height} atlas")]
    Oversize {
        name: String,
        width: u32,
        height: u32,
        bin_width: u32,
        bin_height: u32,
    },
    #[error("Nothing to pack")]
    Empty,
}

pub type Result<T> = std::result::Result<T, SkypackError>;
