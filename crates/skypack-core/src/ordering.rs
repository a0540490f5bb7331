use crate::config::SortOrder;

/// Returns indices of `sizes` in packing order. The sort is stable, so ties keep
/// input order and identical inputs always produce the same order.
///
/// `WidthDesc` (widest first, then shortest first) keeps the skyline from
/// fragmenting under left/right anchored placement.
pub fn packing_order(sizes: &[(u32, u32)], order: SortOrder) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..sizes.len()).collect();
    match order {
        SortOrder::None => {}
        SortOrder::WidthDesc => {
            idx.sort_by(|&a, &b| {
                sizes[b]
                    .0
                    .cmp(&sizes[a].0)
                    .then_with(|| sizes[a].1.cmp(&sizes[b].1))
            });
        }
        SortOrder::AreaDesc => {
            idx.sort_by(|&a, &b| {
                let area = |i: usize| sizes[i].0 as u64 * sizes[i].1 as u64;
                area(b).cmp(&area(a))
            });
        }
        SortOrder::HeightDesc => {
            idx.sort_by(|&a, &b| sizes[b].1.cmp(&sizes[a].1));
        }
    }
    idx
}
