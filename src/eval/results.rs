use serde::Serialize;

/// Metrics of one (user, ground-truth item) evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InstanceResult {
    pub hit: f64,
    pub ndcg: f64,
    pub precision: f64,
}

/// Per-slot result vectors of one evaluation run.
///
/// One slot per user for offline runs and one per test instance for online runs.
/// Allocated at the start of a run and written exactly once per slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalResults {
    pub hits: Vec<f64>,
    pub ndcgs: Vec<f64>,
    pub precs: Vec<f64>,
}

/// Mean of each metric over a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSummary {
    pub hit_ratio: f64,
    pub ndcg: f64,
    pub precision: f64,
}

/// Mean of a slice, 0.0 when empty.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

impl EvalResults {
    pub fn with_len(len: usize) -> Self {
        Self {
            hits: vec![0.0; len],
            ndcgs: vec![0.0; len],
            precs: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn set(&mut self, slot: usize, result: InstanceResult) {
        self.hits[slot] = result.hit;
        self.ndcgs[slot] = result.ndcg;
        self.precs[slot] = result.precision;
    }

    pub fn get(&self, slot: usize) -> Option<InstanceResult> {
        Some(InstanceResult {
            hit: *self.hits.get(slot)?,
            ndcg: *self.ndcgs.get(slot)?,
            precision: *self.precs.get(slot)?,
        })
    }

    /// Means over every slot.
    pub fn summary(&self) -> MetricSummary {
        MetricSummary {
            hit_ratio: mean(&self.hits),
            ndcg: mean(&self.ndcgs),
            precision: mean(&self.precs),
        }
    }

    /// Means over the first `n` slots (running averages during online evaluation).
    pub fn prefix_summary(&self, n: usize) -> MetricSummary {
        let n = n.min(self.len());
        MetricSummary {
            hit_ratio: mean(&self.hits[..n]),
            ndcg: mean(&self.ndcgs[..n]),
            precision: mean(&self.precs[..n]),
        }
    }

    pub(crate) fn slots_mut(&mut self) -> ResultSlots<'_> {
        ResultSlots {
            hits: &mut self.hits,
            ndcgs: &mut self.ndcgs,
            precs: &mut self.precs,
        }
    }
}

/// Mutable view over a contiguous range of result slots.
///
/// Offline workers each own one of these, split from the run's vectors, so no two
/// workers can write the same slot.
pub(crate) struct ResultSlots<'a> {
    hits: &'a mut [f64],
    ndcgs: &'a mut [f64],
    precs: &'a mut [f64],
}

impl<'a> ResultSlots<'a> {
    /// Split into `[0, mid)` and `[mid, len)`.
    pub(crate) fn split_at(self, mid: usize) -> (ResultSlots<'a>, ResultSlots<'a>) {
        let (hits_head, hits_tail) = self.hits.split_at_mut(mid);
        let (ndcgs_head, ndcgs_tail) = self.ndcgs.split_at_mut(mid);
        let (precs_head, precs_tail) = self.precs.split_at_mut(mid);
        (
            ResultSlots {
                hits: hits_head,
                ndcgs: ndcgs_head,
                precs: precs_head,
            },
            ResultSlots {
                hits: hits_tail,
                ndcgs: ndcgs_tail,
                precs: precs_tail,
            },
        )
    }

    /// Write a result at an offset relative to the start of this view.
    pub(crate) fn write(&mut self, offset: usize, result: InstanceResult) {
        self.hits[offset] = result.hit;
        self.ndcgs[offset] = result.ndcg;
        self.precs[offset] = result.precision;
    }
}
