//! Offline (leave-one-out) evaluation, parallelized over contiguous user blocks.
//!
//! Each worker owns a disjoint slice of the result vectors, so no locking is needed.
//! All workers are joined before the first failure (if any) is returned.

use std::ops::Range;
use std::time::Instant;

use crate::data::{InteractionCounts, NegativeCandidateStore, TestInstance};
use crate::error::{EvalError, Result};
use crate::eval::results::EvalResults;
use crate::eval::Evaluator;
use crate::model::Recommender;

/// Block of users handled by worker `t` out of `thread_num`.
///
/// Blocks are `total / thread_num` users long; the last block also takes the remainder.
/// A `thread_num` of 0 is treated as 1. Workers past the last one get an empty block.
pub fn partition(total: usize, thread_num: usize, t: usize) -> Range<usize> {
    let thread_num = thread_num.max(1);
    if t >= thread_num {
        return total..total;
    }
    let block = total / thread_num;
    let start = block * t;
    let end = if t == thread_num - 1 { total } else { block * (t + 1) };
    start..end
}

/// All `thread_num` blocks, in worker order. Together they cover `0..total` exactly once.
pub fn partitions(total: usize, thread_num: usize) -> Vec<Range<usize>> {
    (0..thread_num.max(1))
        .map(|t| partition(total, thread_num, t))
        .collect()
}

/// Check the dense leave-one-out correspondence: instance `i` belongs to user `i`.
fn check_leave_one_out(user_count: usize, test: &[TestInstance]) -> Result<()> {
    if test.len() != user_count {
        return Err(EvalError::Precondition(format!(
            "leave-one-out evaluation needs one test instance per user: {} users, {} instances",
            user_count,
            test.len()
        )));
    }
    if let Some((index, instance)) = test
        .iter()
        .enumerate()
        .find(|(index, instance)| instance.user != *index)
    {
        return Err(EvalError::Precondition(format!(
            "test instance {} belongs to user {}, expected user {}",
            index, instance.user, index
        )));
    }
    Ok(())
}

impl Evaluator {
    /// Leave-one-out evaluation of every user, split across `thread_num` workers.
    ///
    /// Blocks until every worker finishes. Returns one result slot per user.
    pub fn evaluate_offline<M, T, N>(
        &self,
        model: &M,
        train: &T,
        negatives: &N,
        test: &[TestInstance],
    ) -> Result<EvalResults>
    where
        M: Recommender + Sync + ?Sized,
        T: InteractionCounts + ?Sized,
        N: NegativeCandidateStore + Sync + ?Sized,
    {
        let user_count = train.user_count();
        check_leave_one_out(user_count, test)?;

        let thread_num = self.config().thread_num;

        let start = Instant::now();
        let blocks = partitions(user_count, thread_num);
        let mut results = EvalResults::with_len(user_count);

        let outcomes: Vec<Result<()>> = std::thread::scope(|scope| {
            let mut rest = results.slots_mut();
            let mut handles = Vec::with_capacity(blocks.len());

            for (worker, users) in blocks.iter().cloned().enumerate() {
                let (mut slots, tail) = rest.split_at(users.len());
                rest = tail;

                handles.push(scope.spawn(move || -> Result<()> {
                    log::debug!("Worker {} evaluating users {:?}", worker, users);
                    let first_user = users.start;
                    for user in users {
                        let result =
                            self.evaluate_instance(model, negatives, user, test[user].item)?;
                        slots.write(user - first_user, result);
                    }
                    Ok(())
                }));
            }

            handles
                .into_iter()
                .enumerate()
                .map(|(worker, handle)| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(EvalError::WorkerPanicked { worker }))
                })
                .collect()
        });

        let mut first_error = None;
        for (worker, outcome) in outcomes.into_iter().enumerate() {
            if let Err(e) = outcome {
                log::error!("Evaluation worker {} failed: {}", worker, e);
                first_error.get_or_insert(e);
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        log::info!(
            "Offline evaluation of {} users on {} workers took {:?}",
            user_count,
            thread_num,
            start.elapsed()
        );

        Ok(results)
    }
}
