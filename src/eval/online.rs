//! Online evaluation: replay a time-ordered test stream against an incrementally
//! updated model.
//!
//! Each instance is scored with the model as it was before that instance, then the
//! model is updated with it. Results are also broken down by how many interactions
//! the model has recorded for the instance's user at that point, so a user's bucket
//! moves up as the stream feeds the model.

use std::time::{Duration, Instant};

use crate::data::{InteractionCounts, NegativeCandidateStore, TestInstance};
use crate::error::Result;
use crate::eval::report::{self, ReportSink};
use crate::eval::results::{EvalResults, InstanceResult, MetricSummary};
use crate::eval::Evaluator;
use crate::model::Recommender;

/// Accumulated metrics of the instances that fell into one breakdown bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BucketStats {
    pub count: usize,
    pub hits: f64,
    pub ndcgs: f64,
    pub precs: f64,
}

impl BucketStats {
    fn add(&mut self, result: &InstanceResult) {
        self.count += 1;
        self.hits += result.hit;
        self.ndcgs += result.ndcg;
        self.precs += result.precision;
    }

    /// Mean metrics within the bucket, zeros when the bucket is empty.
    pub fn mean(&self) -> MetricSummary {
        if self.count == 0 {
            return MetricSummary {
                hit_ratio: 0.0,
                ndcg: 0.0,
                precision: 0.0,
            };
        }
        let n = self.count as f64;
        MetricSummary {
            hit_ratio: self.hits / n,
            ndcg: self.ndcgs / n,
            precision: self.precs / n,
        }
    }
}

/// Results grouped by the user's training-history size, clamped at `intervals`.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown {
    buckets: Vec<BucketStats>,
}

impl Breakdown {
    pub fn new(intervals: usize) -> Self {
        Self {
            buckets: vec![BucketStats::default(); intervals + 1],
        }
    }

    pub fn intervals(&self) -> usize {
        self.buckets.len() - 1
    }

    /// Bucket for a user with `interactions` training interactions.
    pub fn bucket_of(&self, interactions: usize) -> usize {
        interactions.min(self.intervals())
    }

    pub fn record(&mut self, interactions: usize, result: &InstanceResult) {
        let bucket = self.bucket_of(interactions);
        self.buckets[bucket].add(result);
    }

    pub fn buckets(&self) -> &[BucketStats] {
        &self.buckets
    }

    /// Number of recorded instances across all buckets.
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    /// Share of all recorded instances in `bucket`, in percent.
    pub fn percentage(&self, bucket: usize) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.buckets[bucket].count as f64 / total as f64 * 100.0
    }

    /// Report lines: a header, then one line per bucket.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.buckets.len() + 2);
        lines.push("Break down the results by number of user ratings for the test pair.".to_string());
        lines.push("#Rating\t Percentage\t HR\t NDCG\t Prec".to_string());
        for (bucket, stats) in self.buckets.iter().enumerate() {
            let label = if bucket == self.intervals() {
                format!("{}+", bucket)
            } else {
                bucket.to_string()
            };
            let mean = stats.mean();
            lines.push(format!(
                "{}\t {:.2}%\t {:.4}\t {:.4}\t {:.4}",
                label,
                self.percentage(bucket),
                mean.hit_ratio,
                mean.ndcg,
                mean.precision
            ));
        }
        lines
    }
}

/// Outcome of one online evaluation run.
#[derive(Debug, Clone)]
pub struct OnlineReport {
    /// One slot per test instance, in stream order.
    pub results: EvalResults,
    pub breakdown: Breakdown,
    /// Mean wall time of `Recommender::apply` per instance.
    pub avg_update_time: Duration,
}

impl Evaluator {
    /// Replay `stream` (sorted by time, oldest first), evaluating then updating the
    /// model for each instance.
    ///
    /// Each update calls `apply` `max_iter_online` times. Emits a running-average
    /// line every `interval` instances, then the breakdown and the mean update latency.
    pub fn evaluate_online<M, N>(
        &self,
        model: &mut M,
        negatives: &N,
        stream: &[TestInstance],
        sink: &mut dyn ReportSink,
    ) -> Result<OnlineReport>
    where
        M: Recommender + InteractionCounts + ?Sized,
        N: NegativeCandidateStore + ?Sized,
    {
        let interval = self.config().interval;
        let passes = self.config().max_iter_online;
        let mut results = EvalResults::with_len(stream.len());
        let mut breakdown = Breakdown::new(self.config().breakdown_intervals);
        let mut update_time = Duration::ZERO;

        for (i, instance) in stream.iter().enumerate() {
            if i > 0 && interval > 0 && i % interval == 0 {
                report::report(sink, &report::running_line(i, &results.prefix_summary(i)));
            }

            let result = self.evaluate_instance(&*model, negatives, instance.user, instance.item)?;
            results.set(i, result);
            breakdown.record(model.count_for_user(instance.user), &result);

            let update_start = Instant::now();
            for _ in 0..passes {
                model.apply(instance.user, instance.item);
            }
            update_time += update_start.elapsed();
        }

        for line in breakdown.lines() {
            report::report(sink, &line);
        }

        let avg_update_time = if stream.is_empty() {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(update_time.as_secs_f64() / stream.len() as f64)
        };
        report::report(
            sink,
            &format!(
                "Avg model update time per instance: {:.2} ms",
                avg_update_time.as_secs_f64() * 1000.0
            ),
        );
        log::debug!(
            "Online evaluation of {} instances, total update time {:?}",
            stream.len(),
            update_time
        );

        Ok(OnlineReport {
            results,
            breakdown,
            avg_update_time,
        })
    }
}
