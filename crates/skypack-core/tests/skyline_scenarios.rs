use skypack_core::config::SkylineConfig;
use skypack_core::error::SkypackError;
use skypack_core::model::{PackBox, Placement};
use skypack_core::packer::SkylinePacker;

fn pack(cfg: SkylineConfig, boxes: Vec<(&'static str, u32, u32)>) -> Vec<Placement<&'static str>> {
    let boxes = boxes
        .into_iter()
        .map(|(k, w, h)| PackBox::new(k, w, h))
        .collect();
    SkylinePacker::new(cfg, boxes)
        .expect("packer")
        .pack_all()
        .expect("pack")
}

fn at<'k>(p: &Placement<&'k str>) -> (&'k str, usize, u32, u32) {
    (p.key, p.bin, p.x, p.y)
}

#[test]
fn two_squares_fill_row_then_overflow() {
    let cfg = SkylineConfig::new(20, 10, 1000);
    let out = pack(cfg, vec![("a", 10, 10), ("b", 10, 10), ("c", 5, 5)]);
    let got: Vec<_> = out.iter().map(at).collect();
    assert_eq!(got, vec![("a", 0, 0, 0), ("b", 0, 10, 0), ("c", 1, 0, 0)]);
}

#[test]
fn taller_bin_stacks_third_box() {
    let cfg = SkylineConfig::new(20, 20, 1000);
    let out = pack(cfg, vec![("a", 10, 10), ("b", 10, 10), ("c", 5, 5)]);
    let got: Vec<_> = out.iter().map(at).collect();
    assert_eq!(got, vec![("a", 0, 0, 0), ("b", 0, 10, 0), ("c", 0, 0, 10)]);
}

#[test]
fn exact_quarters_share_one_bin() {
    let cfg = SkylineConfig::new(16, 16, 12);
    let out = pack(cfg, vec![("a", 8, 8), ("b", 8, 8), ("c", 8, 8), ("d", 8, 8)]);
    assert!(out.iter().all(|p| p.bin == 0));
    let mut spots: Vec<(u32, u32)> = out.iter().map(|p| (p.x, p.y)).collect();
    spots.sort();
    assert_eq!(spots, vec![(0, 0), (0, 8), (8, 0), (8, 8)]);
}

#[test]
fn oversize_box_is_rejected_by_name() {
    let cfg = SkylineConfig::new(16, 16, 12);
    let boxes = vec![PackBox::new("ok", 4, 4), PackBox::new("wide", 17, 4)];
    match SkylinePacker::new(cfg, boxes) {
        Err(SkypackError::Oversize {
            name,
            width,
            bin_width,
            ..
        }) => {
            assert_eq!(name, "wide");
            assert_eq!(width, 17);
            assert_eq!(bin_width, 16);
        }
        Err(e) => panic!("unexpected error {e}"),
        Ok(_) => panic!("expected Oversize"),
    }
}

#[test]
fn zero_area_box_goes_to_origin_without_using_space() {
    let cfg = SkylineConfig::new(8, 8, 6);
    let mut packer = SkylinePacker::new(
        cfg,
        vec![PackBox::new("a", 8, 8), PackBox::new("empty", 0, 0)],
    )
    .expect("packer");

    let first = packer.place_next().expect("place").expect("some");
    assert_eq!(at(&first), ("empty", 0, 0, 0));
    assert_eq!(packer.skyline().highest(), 0);

    let second = packer.place_next().expect("place").expect("some");
    assert_eq!(at(&second), ("a", 0, 0, 0));
    assert!(packer.is_done());
    assert!(packer.place_next().expect("place").is_none());
}

#[test]
fn fresh_bin_only_after_something_was_placed() {
    let cfg = SkylineConfig::new(10, 10, 7);
    let out = pack(cfg, vec![("a", 10, 10), ("b", 10, 10), ("c", 10, 10)]);
    let bins: Vec<usize> = out.iter().map(|p| p.bin).collect();
    assert_eq!(bins, vec![0, 1, 2]);
    assert!(out.iter().all(|p| p.x == 0 && p.y == 0));
}

#[test]
fn remaining_counts_down() {
    let cfg = SkylineConfig::new(32, 32, 24);
    let mut packer = SkylinePacker::new(
        cfg,
        vec![
            PackBox::new(0usize, 4, 4),
            PackBox::new(1, 4, 4),
            PackBox::new(2, 4, 4),
        ],
    )
    .expect("packer");
    assert_eq!(packer.remaining(), 3);
    packer.place_next().expect("place");
    assert_eq!(packer.remaining(), 2);
    assert_eq!(packer.bin_index(), 0);
}

fn tuned(w: u32, h: u32, h_spread: u32, min_gap: u32) -> SkylineConfig {
    SkylineConfig {
        h_spread: Some(h_spread),
        min_gap_width: Some(min_gap),
        ..SkylineConfig::new(w, h, 1000)
    }
}

#[test]
fn side_window_keeps_small_box_out_of_narrow_pit() {
    let boxes = vec![("a", 4, 6), ("b", 3, 1), ("c", 2, 2)];

    // c would leave a 3px pit against the 6px column, so it climbs onto b
    let out = pack(tuned(10, 10, 5, 0), boxes.clone());
    let got: Vec<_> = out.iter().map(at).collect();
    assert_eq!(got, vec![("a", 0, 0, 0), ("b", 0, 4, 0), ("c", 0, 4, 1)]);

    // without the window the lowest spot wins
    let out = pack(tuned(10, 10, 0, 0), boxes);
    let got: Vec<_> = out.iter().map(at).collect();
    assert_eq!(got, vec![("a", 0, 0, 0), ("b", 0, 4, 0), ("c", 0, 7, 0)]);
}

#[test]
fn shallow_headroom_reorders_equal_boxes() {
    // q comes first, but its 3px headroom is dead space; p leaves only 2px
    let out = pack(tuned(10, 10, 0, 0), vec![("q", 5, 7), ("p", 5, 8)]);
    let got: Vec<_> = out.iter().map(at).collect();
    assert_eq!(got, vec![("p", 0, 0, 0), ("q", 0, 5, 0)]);
}

#[test]
fn narrow_leftover_is_filled_before_the_next_box() {
    let out = pack(tuned(10, 10, 0, 4), vec![("a", 7, 4), ("b", 3, 3)]);
    let got: Vec<_> = out.iter().map(at).collect();
    assert_eq!(got, vec![("a", 0, 0, 0), ("b", 0, 0, 4)]);

    let out = pack(tuned(10, 10, 0, 3), vec![("a", 7, 4), ("b", 3, 3)]);
    let got: Vec<_> = out.iter().map(at).collect();
    assert_eq!(got, vec![("a", 0, 0, 0), ("b", 0, 7, 0)]);
}
