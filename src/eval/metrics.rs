//! Ranking metrics for a single held-out item: Hit Ratio, NDCG and Precision.
//!
//! All three take the ranked item list (already cut off at K) and the ground-truth
//! item, and return 0.0 when the item is not in the list.

use crate::data::ItemId;

fn rank_of(rank_list: &[ItemId], gt_item: ItemId) -> Option<usize> {
    rank_list.iter().position(|&item| item == gt_item)
}

/// Hit Ratio: 1.0 if the ground-truth item appears anywhere in the list.
pub fn hit_ratio(rank_list: &[ItemId], gt_item: ItemId) -> f64 {
    match rank_of(rank_list, gt_item) {
        Some(_) => 1.0,
        None => 0.0,
    }
}

/// NDCG with a single relevant item: ln(2) / ln(rank + 2) at 0-based rank.
///
/// The ideal DCG of one relevant item at rank 0 is 1, so no separate normalization.
pub fn ndcg(rank_list: &[ItemId], gt_item: ItemId) -> f64 {
    match rank_of(rank_list, gt_item) {
        Some(rank) => std::f64::consts::LN_2 / ((rank + 2) as f64).ln(),
        None => 0.0,
    }
}

/// Precision at the hit rank: 1 / (rank + 1) at 0-based rank (the reciprocal rank).
pub fn precision(rank_list: &[ItemId], gt_item: ItemId) -> f64 {
    match rank_of(rank_list, gt_item) {
        Some(rank) => 1.0 / (rank + 1) as f64,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_ratio_found_and_missing() {
        let ranked = vec![4, 9, 2];
        assert_eq!(hit_ratio(&ranked, 2), 1.0);
        assert_eq!(hit_ratio(&ranked, 5), 0.0);
        assert_eq!(hit_ratio(&[], 5), 0.0);
    }

    #[test]
    fn ndcg_first_rank_is_one() {
        assert!((ndcg(&[7, 1, 2], 7) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ndcg_second_rank() {
        let expected = 2f64.ln() / 3f64.ln();
        assert!((ndcg(&[6, 8], 8) - expected).abs() < 1e-12);
        assert!((ndcg(&[6, 8], 8) - 0.6309).abs() < 1e-4);
    }

    #[test]
    fn ndcg_strictly_decreasing_in_rank() {
        let ranked: Vec<ItemId> = (0..20).collect();
        for rank in 1..ranked.len() {
            assert!(ndcg(&ranked, rank) < ndcg(&ranked, rank - 1));
        }
    }

    #[test]
    fn precision_is_reciprocal_rank() {
        let ranked = vec![10, 11, 12, 13];
        assert_eq!(precision(&ranked, 10), 1.0);
        assert_eq!(precision(&ranked, 11), 0.5);
        assert_eq!(precision(&ranked, 13), 0.25);
        assert_eq!(precision(&ranked, 99), 0.0);
    }

    #[test]
    fn ndcg_dominates_precision_after_first_rank() {
        // Both are 1 at rank 0; the log discount decays slower than 1/(rank+1).
        let ranked: Vec<ItemId> = (0..50).collect();
        assert_eq!(precision(&ranked, 0), ndcg(&ranked, 0));
        for item in 1..ranked.len() {
            assert!(precision(&ranked, item) < ndcg(&ranked, item));
        }
    }

    #[test]
    fn misses_zero_all_metrics() {
        let ranked = vec![1, 2, 3];
        assert_eq!(hit_ratio(&ranked, 4), 0.0);
        assert_eq!(ndcg(&ranked, 4), 0.0);
        assert_eq!(precision(&ranked, 4), 0.0);
    }
}
