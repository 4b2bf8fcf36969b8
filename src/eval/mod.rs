//! Evaluation engine: ranking, metrics (HR, NDCG, Precision), offline and online protocols.

pub mod metrics;
pub mod offline;
pub mod online;
pub mod ranker;
pub mod report;
pub mod results;

use std::time::Instant;

use serde::Serialize;

pub use metrics::{hit_ratio, ndcg, precision};
pub use offline::{partition, partitions};
pub use online::{Breakdown, BucketStats, OnlineReport};
pub use ranker::{candidate_pool, rank_top_k};
pub use report::{format_elapsed, report, LogSink, MemorySink, ReportSink, WriterSink};
pub use results::{EvalResults, InstanceResult, MetricSummary};

use crate::config::EvalConfig;
use crate::data::{InteractionCounts, ItemId, NegativeCandidateStore, TestInstance, UserId};
use crate::error::{EvalError, Result};
use crate::model::Recommender;

/// Evaluation protocol of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Leave-one-out, one held-out instance per user, parallel over users.
    Offline,
    /// Replay of a time-ordered stream with a model update after each instance.
    Online,
}

impl Protocol {
    /// Offline when there is exactly one test instance per training user.
    pub fn detect(user_count: usize, test_len: usize) -> Self {
        if user_count == test_len {
            Protocol::Offline
        } else {
            Protocol::Online
        }
    }
}

/// Runs evaluations of a [`Recommender`] under one [`EvalConfig`].
///
/// The evaluator holds no per-run state: every call allocates fresh result vectors,
/// so results of one run never leak into the next.
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Result<Self> {
        config.validate()?;
        if config.ignore_train {
            log::warn!("ignore_train is reserved and does not change ranking");
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluate one (user, ground-truth item) pair against the current model.
    ///
    /// The candidate pool is the user's negatives plus `gt_item`, built as a fresh
    /// copy. Fails if the user has no negative-candidate list.
    pub fn evaluate_instance<M, N>(
        &self,
        model: &M,
        negatives: &N,
        user: UserId,
        gt_item: ItemId,
    ) -> Result<InstanceResult>
    where
        M: Recommender + ?Sized,
        N: NegativeCandidateStore + ?Sized,
    {
        let user_negatives = negatives
            .candidates_for(user)
            .ok_or(EvalError::MissingNegatives { user })?;

        let pool = candidate_pool(user_negatives, gt_item);
        let rank_list = rank_top_k(model, user, &pool, self.config.top_k);

        Ok(InstanceResult {
            hit: hit_ratio(&rank_list, gt_item),
            ndcg: ndcg(&rank_list, gt_item),
            precision: precision(&rank_list, gt_item),
        })
    }

    /// Evaluate after a training iteration and emit one progress line.
    ///
    /// Uses leave-one-out evaluation when there is one test instance per training
    /// user, and online evaluation over the test stream otherwise. Note that the
    /// online path updates the model with every test instance.
    pub fn show_progress<M, N>(
        &self,
        iter: usize,
        build_start: Instant,
        model: &mut M,
        negatives: &N,
        test: &[TestInstance],
        sink: &mut dyn ReportSink,
    ) -> Result<EvalResults>
    where
        M: Recommender + InteractionCounts + Sync + ?Sized,
        N: NegativeCandidateStore + Sync + ?Sized,
    {
        let protocol = Protocol::detect(model.user_count(), test.len());
        self.run_iteration(iter, build_start, protocol, model, negatives, test, sink)
    }

    /// Run one evaluation under an explicit protocol and emit its progress line.
    ///
    /// Training counts (user count offline, per-user history online) are read from
    /// the model, so online updates move users between breakdown buckets.
    #[allow(clippy::too_many_arguments)]
    pub fn run_iteration<M, N>(
        &self,
        iter: usize,
        build_start: Instant,
        protocol: Protocol,
        model: &mut M,
        negatives: &N,
        test: &[TestInstance],
        sink: &mut dyn ReportSink,
    ) -> Result<EvalResults>
    where
        M: Recommender + InteractionCounts + Sync + ?Sized,
        N: NegativeCandidateStore + Sync + ?Sized,
    {
        let build_elapsed = build_start.elapsed();
        let eval_start = Instant::now();

        let results = match protocol {
            Protocol::Offline => self.evaluate_offline(&*model, &*model, negatives, test)?,
            Protocol::Online => self.evaluate_online(model, negatives, test, sink)?.results,
        };

        let line = report::progress_line(
            iter,
            build_elapsed,
            model.loss(),
            &results.summary(),
            eval_start.elapsed(),
        );
        report::report(sink, &line);

        Ok(results)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    use crate::data::{InteractionCounts, ItemId, TrainMatrix, UserId};
    use crate::model::Recommender;

    /// Scores from a fixed (user, item) table; unknown pairs score 0.
    /// `apply` boosts the pair above anything in the table and records it in `history`.
    #[derive(Debug, Default)]
    pub struct TableModel {
        pub scores: HashMap<(UserId, ItemId), f64>,
        pub history: TrainMatrix,
        pub applied: Vec<(UserId, ItemId)>,
    }

    impl TableModel {
        pub fn for_user(user: UserId, scores: &[(ItemId, f64)]) -> Self {
            let mut model = Self::default();
            model.set_user(user, scores);
            model
        }

        pub fn set_user(&mut self, user: UserId, scores: &[(ItemId, f64)]) {
            for &(item, score) in scores {
                self.scores.insert((user, item), score);
            }
        }

        pub fn with_history(mut self, pairs: &[(UserId, ItemId)]) -> Self {
            self.history = TrainMatrix::from_pairs(pairs.iter().copied());
            self
        }
    }

    impl Recommender for TableModel {
        fn score(&self, user: UserId, item: ItemId) -> f64 {
            self.scores.get(&(user, item)).copied().unwrap_or(0.0)
        }

        fn train(&mut self) {}

        fn apply(&mut self, user: UserId, item: ItemId) {
            self.applied.push((user, item));
            self.history.insert(user, item);
            self.scores.insert((user, item), 100.0);
        }
    }

    impl InteractionCounts for TableModel {
        fn user_count(&self) -> usize {
            self.history.user_count()
        }

        fn count_for_user(&self, user: UserId) -> usize {
            self.history.count_for_user(user)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::TableModel;
    use super::*;
    use crate::data::NegativeCandidates;

    fn evaluator(top_k: usize) -> Evaluator {
        Evaluator::new(EvalConfig {
            top_k,
            ..EvalConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_ground_truth_in_top_k() {
        let model = TableModel::for_user(0, &[(5, 0.1), (6, 0.9), (7, 0.3), (8, 0.85)]);
        let negatives: Vec<Vec<ItemId>> = vec![vec![5, 6, 7]];

        let result = evaluator(2).evaluate_instance(&model, &negatives, 0, 8).unwrap();

        assert_eq!(result.hit, 1.0);
        assert!((result.ndcg - 2f64.ln() / 3f64.ln()).abs() < 1e-12);
        assert!((result.ndcg - 0.631).abs() < 1e-3);
        assert_eq!(result.precision, 0.5);
        assert_eq!(negatives, vec![vec![5, 6, 7]]);
    }

    #[test]
    fn test_ground_truth_below_cutoff() {
        let model = TableModel::for_user(0, &[(5, 0.1), (6, 0.9), (7, 0.3), (8, 0.05)]);
        let negatives: Vec<Vec<ItemId>> = vec![vec![5, 6, 7]];

        let result = evaluator(2).evaluate_instance(&model, &negatives, 0, 8).unwrap();

        assert_eq!(result, InstanceResult::default());
    }

    #[test]
    fn test_missing_negatives_is_an_error() {
        let model = TableModel::default();
        let negatives = NegativeCandidates::from(vec![vec![1, 2]]);

        let err = evaluator(10).evaluate_instance(&model, &negatives, 3, 1).unwrap_err();
        assert!(matches!(err, EvalError::MissingNegatives { user: 3 }));
    }

    #[test]
    fn test_repeated_evaluation_is_stable() {
        let model = TableModel::for_user(0, &[(1, 0.2), (2, 0.4), (9, 0.3)]);
        let negatives: Vec<Vec<ItemId>> = vec![vec![1, 2]];
        let evaluator = evaluator(3);

        let first = evaluator.evaluate_instance(&model, &negatives, 0, 9).unwrap();
        let second = evaluator.evaluate_instance(&model, &negatives, 0, 9).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.precision, 0.5);
        assert_eq!(negatives[0].len(), 2);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let err = Evaluator::new(EvalConfig {
            thread_num: 0,
            ..EvalConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));
    }

    #[test]
    fn test_show_progress_picks_offline_for_leave_one_out() {
        let mut model = TableModel::default().with_history(&[(0, 0), (1, 1)]);
        model.set_user(0, &[(3, 1.0)]);
        model.set_user(1, &[(4, 1.0)]);
        let negatives: Vec<Vec<ItemId>> = vec![vec![1, 2], vec![0, 2]];
        let test = vec![TestInstance::new(0, 3), TestInstance::new(1, 4)];
        let mut sink = MemorySink::default();

        let results = evaluator(1)
            .show_progress(7, Instant::now(), &mut model, &negatives, &test, &mut sink)
            .unwrap();

        assert_eq!(results.hits, vec![1.0, 1.0]);
        assert!(model.applied.is_empty());
        assert_eq!(sink.lines.len(), 1);
        assert!(sink.lines[0].starts_with("Iter=7["));
        assert!(sink.lines[0].contains("1.0000\t 1.0000\t 1.0000"));
    }

    #[test]
    fn test_show_progress_picks_online_for_global_split() {
        let mut model = TableModel::default().with_history(&[(0, 0), (1, 1)]);
        let negatives: Vec<Vec<ItemId>> = vec![vec![1, 2], vec![0, 2]];
        let test = vec![TestInstance::new(0, 3)];
        let mut sink = MemorySink::default();

        let results = evaluator(5)
            .show_progress(1, Instant::now(), &mut model, &negatives, &test, &mut sink)
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(model.applied, vec![(0, 3)]);
        assert!(sink.lines.last().unwrap().starts_with("Iter=1["));
    }

    #[test]
    fn test_protocol_detect() {
        assert_eq!(Protocol::detect(3, 3), Protocol::Offline);
        assert_eq!(Protocol::detect(3, 10), Protocol::Online);
        assert_eq!(Protocol::detect(0, 0), Protocol::Offline);
    }

    #[test]
    fn test_run_iteration_forces_online_on_leave_one_out_data() {
        let mut model = TableModel::default().with_history(&[(0, 0), (1, 1)]);
        let negatives: Vec<Vec<ItemId>> = vec![vec![1, 2], vec![0, 2]];
        let test = vec![TestInstance::new(0, 3), TestInstance::new(1, 4)];
        let mut sink = MemorySink::default();

        let results = evaluator(5)
            .run_iteration(
                2,
                Instant::now(),
                Protocol::Online,
                &mut model,
                &negatives,
                &test,
                &mut sink,
            )
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(model.applied, vec![(0, 3), (1, 4)]);
        let progress: Vec<&String> = sink.lines.iter().filter(|l| l.starts_with("Iter=")).collect();
        assert_eq!(progress.len(), 1);
        assert!(progress[0].starts_with("Iter=2["));
    }
}
