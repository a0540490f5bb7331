use crate::model::Rect;
use crate::pixels::PixelBuffer;

/// Copy `src_rect` of `src` into `canvas` with its top-left at (dx, dy), then
/// optionally draw a red 1px outline on the copied area for debugging.
///
/// Pixels that would land outside `canvas` are skipped.
pub fn blit_rgba<P: PixelBuffer + ?Sized, C: PixelBuffer + ?Sized>(
    src: &P,
    src_rect: &Rect,
    canvas: &mut C,
    dx: u32,
    dy: u32,
    outlines: bool,
) {
    let (cw, ch) = (canvas.width(), canvas.height());
    let (rw, rh) = (src_rect.w, src_rect.h);

    for yy in 0..rh {
        if dy + yy >= ch {
            break;
        }
        for xx in 0..rw {
            if dx + xx >= cw {
                break;
            }
            let px = src.pixel(src_rect.x + xx, src_rect.y + yy);
            canvas.set_pixel(dx + xx, dy + yy, px);
        }
    }

    if outlines && rw > 0 && rh > 0 {
        let red = [255, 0, 0, 255];
        let by = dy + rh - 1;
        let rx = dx + rw - 1;
        for xx in 0..rw {
            if dx + xx < cw && dy < ch {
                canvas.set_pixel(dx + xx, dy, red);
            }
            if dx + xx < cw && by < ch {
                canvas.set_pixel(dx + xx, by, red);
            }
        }
        for yy in 0..rh {
            if dx < cw && dy + yy < ch {
                canvas.set_pixel(dx, dy + yy, red);
            }
            if rx < cw && dy + yy < ch {
                canvas.set_pixel(rx, dy + yy, red);
            }
        }
    }
}
