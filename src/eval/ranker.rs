use std::collections::HashSet;

use crate::data::{ItemId, UserId};
use crate::model::Recommender;

/// Build the ranking pool for one evaluation: the user's negatives followed by the
/// ground-truth item.
///
/// Returns a fresh vector; the negative list itself is never modified. Duplicates
/// are dropped (first occurrence wins) so the pool behaves as a set.
pub fn candidate_pool(negatives: &[ItemId], gt_item: ItemId) -> Vec<ItemId> {
    let mut seen = HashSet::with_capacity(negatives.len() + 1);
    let mut pool = Vec::with_capacity(negatives.len() + 1);
    for &item in negatives.iter().chain(std::iter::once(&gt_item)) {
        if seen.insert(item) {
            pool.push(item);
        }
    }
    pool
}

/// Score every candidate for `user` and return the top `k` by descending score.
///
/// The full list is sorted before truncation. The sort is stable, so equal scores
/// keep their order in `candidates`. NaN scores rank below every real score.
pub fn rank_top_k<M>(model: &M, user: UserId, candidates: &[ItemId], k: usize) -> Vec<ItemId>
where
    M: Recommender + ?Sized,
{
    let mut scored: Vec<(ItemId, f64)> = candidates
        .iter()
        .map(|&item| {
            let score = model.score(user, item);
            (item, if score.is_nan() { f64::NEG_INFINITY } else { score })
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(k);

    scored.into_iter().map(|(item, _)| item).collect()
}
