use image::{Rgba, RgbaImage};
use skypack_core::model::{Pivot, Rect, SpriteInfo};
use skypack_core::trim::{content_bounds, trim_sprite};

const RED: [u8; 4] = [255, 0, 0, 255];

fn canvas_with(w: u32, h: u32, fill: [u8; 4], opaque: &[(u32, u32)]) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(w, h, Rgba(fill));
    for &(x, y) in opaque {
        img.put_pixel(x, y, Rgba(RED));
    }
    img
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn trims_to_bbox_and_keeps_pivot_in_image_space() {
    let img = canvas_with(8, 8, [0, 0, 0, 0], &[(2, 3), (4, 5)]);
    let sprite = SpriteInfo::new("s", Rect::new(0, 0, 8, 8), Pivot::CENTER);
    let t = trim_sprite(&img, &sprite, [0, 0, 0, 0], (0, 0));
    assert_eq!(t.rect, Rect::new(2, 3, 3, 3));
    // absolute (4, 4) re-expressed against the trimmed rect
    assert!(close(t.pivot.x, 2.0 / 3.0), "{:?}", t.pivot);
    assert!(close(t.pivot.y, 1.0 / 3.0), "{:?}", t.pivot);
}

#[test]
fn trimming_twice_changes_nothing() {
    let img = canvas_with(16, 16, [0, 0, 0, 0], &[(5, 5), (9, 12)]);
    let sprite = SpriteInfo::new("s", Rect::new(0, 0, 16, 16), Pivot::new(0.3, 0.9));
    let once = trim_sprite(&img, &sprite, [0, 0, 0, 0], (0, 0));
    let twice = trim_sprite(&img, &once, [0, 0, 0, 0], (0, 0));
    assert_eq!(once, twice);
    assert_eq!(once.pivot.x.to_bits(), twice.pivot.x.to_bits());
    assert_eq!(once.pivot.y.to_bits(), twice.pivot.y.to_bits());
}

#[test]
fn margin_is_clamped_to_the_original_rect() {
    let img = canvas_with(8, 8, [0, 0, 0, 0], &[(1, 1), (2, 2)]);
    let sprite = SpriteInfo::new("s", Rect::new(0, 0, 8, 8), Pivot::CENTER);
    let t = trim_sprite(&img, &sprite, [0, 0, 0, 0], (2, 2));
    assert_eq!(t.rect, Rect::new(0, 0, 5, 5));
}

#[test]
fn sub_rect_of_a_sheet_is_trimmed_in_sheet_coordinates() {
    let img = canvas_with(32, 16, [0, 0, 0, 0], &[(20, 4), (21, 6)]);
    let sprite = SpriteInfo::new("s", Rect::new(16, 0, 16, 16), Pivot::new(0.0, 0.0));
    let t = trim_sprite(&img, &sprite, [0, 0, 0, 0], (0, 0));
    assert_eq!(t.rect, Rect::new(20, 4, 2, 3));
    // top-left of the old rect, (16, 0), now lies left of and above the content
    assert!(close(t.pivot.x, -2.0));
    assert!(close(t.pivot.y, -4.0 / 3.0));
}

#[test]
fn all_background_collapses_and_keeps_pivot() {
    let img = canvas_with(8, 8, [0, 0, 0, 0], &[]);
    let sprite = SpriteInfo::new("s", Rect::new(2, 1, 4, 4), Pivot::new(0.5, 1.0));
    let t = trim_sprite(&img, &sprite, [0, 0, 0, 0], (2, 2));
    assert_eq!(t.rect, Rect::new(2, 1, 0, 0));
    assert_eq!(t.pivot, Pivot::new(0.5, 1.0));
}

#[test]
fn zero_alpha_counts_as_transparent_whatever_the_colour() {
    let img = canvas_with(6, 6, [255, 255, 255, 0], &[(3, 2)]);
    let b = content_bounds(&img, &Rect::new(0, 0, 6, 6), [0, 0, 0, 0]);
    assert_eq!(b, Some(Rect::new(3, 2, 1, 1)));
}

#[test]
fn opaque_trim_colour_is_treated_as_background() {
    let mut img = RgbaImage::from_pixel(6, 6, Rgba([0, 0, 255, 255]));
    img.put_pixel(1, 4, Rgba(RED));
    let b = content_bounds(&img, &Rect::new(0, 0, 6, 6), [0, 0, 255, 255]);
    assert_eq!(b, Some(Rect::new(1, 4, 1, 1)));
    // transparent pixels are content when the background is opaque
    img.put_pixel(5, 0, Rgba([0, 0, 0, 0]));
    let b = content_bounds(&img, &Rect::new(0, 0, 6, 6), [0, 0, 255, 255]);
    assert_eq!(b, Some(Rect::new(1, 0, 5, 5)));
}
