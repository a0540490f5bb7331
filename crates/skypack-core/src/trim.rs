use crate::model::{Pivot, Rect, SpriteInfo};
use crate::pixels::{PixelBuffer, canonical};

/// Tightest rect inside `rect` holding every pixel that differs from `background`.
///
/// Zero-alpha pixels compare as `[0, 0, 0, 0]`, and so does a zero-alpha background.
/// Returns `None` when the whole rect is background.
pub fn content_bounds<P: PixelBuffer + ?Sized>(
    pixels: &P,
    rect: &Rect,
    background: [u8; 4],
) -> Option<Rect> {
    let background = canonical(background);
    let mut x1 = u32::MAX;
    let mut y1 = u32::MAX;
    let mut x2 = 0u32;
    let mut y2 = 0u32;
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            if canonical(pixels.pixel(x, y)) != background {
                x1 = x1.min(x);
                y1 = y1.min(y);
                x2 = x2.max(x + 1);
                y2 = y2.max(y + 1);
            }
        }
    }
    if x1 == u32::MAX {
        return None;
    }
    Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
}

/// Shrinks `sprite.rect` to its non-background content grown by `margin`
/// (clamped to the original rect) and re-normalizes the pivot so it keeps
/// pointing at the same image-space position.
///
/// An all-background sprite collapses to a zero-size rect at its top-left corner
/// and keeps its pivot.
pub fn trim_sprite<P: PixelBuffer + ?Sized>(
    pixels: &P,
    sprite: &SpriteInfo,
    background: [u8; 4],
    margin: (u32, u32),
) -> SpriteInfo {
    let old = sprite.rect;
    let Some(content) = content_bounds(pixels, &old, background) else {
        return SpriteInfo {
            name: sprite.name.clone(),
            rect: Rect::new(old.x, old.y, 0, 0),
            pivot: sprite.pivot,
        };
    };

    let x1 = content.x.saturating_sub(margin.0).max(old.x);
    let y1 = content.y.saturating_sub(margin.1).max(old.y);
    let x2 = content.right().saturating_add(margin.0).min(old.right());
    let y2 = content.bottom().saturating_add(margin.1).min(old.bottom());
    let rect = Rect::new(x1, y1, x2 - x1, y2 - y1);

    if rect == old {
        return sprite.clone();
    }
    let pivot = Pivot::from_absolute(sprite.pivot.to_absolute(&old), &rect, sprite.pivot);
    SpriteInfo {
        name: sprite.name.clone(),
        rect,
        pivot,
    }
}
