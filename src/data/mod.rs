//! Evaluation inputs: training interactions, negative candidates and test instances.
//!
//! The evaluation engine only sees these through the narrow [`InteractionCounts`]
//! and [`NegativeCandidateStore`] traits, so callers can plug in their own storage.

pub mod loader;

use std::collections::BTreeSet;

pub use loader::{load_negatives, load_ratings, load_test_instances, load_train_matrix, Rating};

/// Dense 0-based user index.
pub type UserId = usize;
/// Dense 0-based item index.
pub type ItemId = usize;

/// A held-out (user, ground-truth item) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestInstance {
    pub user: UserId,
    pub item: ItemId,
}

impl TestInstance {
    pub fn new(user: UserId, item: ItemId) -> Self {
        Self { user, item }
    }
}

/// Read-only view of the training history the online breakdown buckets on.
pub trait InteractionCounts {
    /// Number of users in the training data.
    fn user_count(&self) -> usize;

    /// Number of items the user interacted with during training.
    fn count_for_user(&self, user: UserId) -> usize;
}

/// Per-user negative candidates used to build the ranking pool.
pub trait NegativeCandidateStore {
    /// Candidates for `user`, or None if the user has no registered list.
    fn candidates_for(&self, user: UserId) -> Option<&[ItemId]>;
}

/// Sparse user-by-item training matrix with implicit feedback.
#[derive(Debug, Clone, Default)]
pub struct TrainMatrix {
    rows: Vec<BTreeSet<ItemId>>,
    item_count: usize,
}

impl TrainMatrix {
    /// Create an empty matrix with fixed dimensions.
    pub fn new(user_count: usize, item_count: usize) -> Self {
        Self {
            rows: vec![BTreeSet::new(); user_count],
            item_count,
        }
    }

    /// Build a matrix from (user, item) pairs, sizing it to the largest ids seen.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (UserId, ItemId)>,
    {
        let mut matrix = Self::default();
        for (user, item) in pairs {
            matrix.insert(user, item);
        }
        matrix
    }

    /// Record an interaction, growing the matrix if needed.
    /// Returns false if the interaction was already present.
    pub fn insert(&mut self, user: UserId, item: ItemId) -> bool {
        if user >= self.rows.len() {
            self.rows.resize(user + 1, BTreeSet::new());
        }
        self.item_count = self.item_count.max(item + 1);
        self.rows[user].insert(item)
    }

    /// Items of a user in ascending order (empty for unknown users).
    pub fn items_of(&self, user: UserId) -> impl Iterator<Item = ItemId> + '_ {
        self.rows.get(user).into_iter().flat_map(|row| row.iter().copied())
    }

    pub fn contains(&self, user: UserId, item: ItemId) -> bool {
        self.rows.get(user).map_or(false, |row| row.contains(&item))
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Total number of stored interactions.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(BTreeSet::len).sum()
    }
}

impl InteractionCounts for TrainMatrix {
    fn user_count(&self) -> usize {
        self.rows.len()
    }

    fn count_for_user(&self, user: UserId) -> usize {
        self.rows.get(user).map_or(0, BTreeSet::len)
    }
}

/// Negative-candidate lists indexed by user.
#[derive(Debug, Clone, Default)]
pub struct NegativeCandidates {
    lists: Vec<Option<Vec<ItemId>>>,
}

impl NegativeCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the candidate list of a user.
    pub fn set(&mut self, user: UserId, candidates: Vec<ItemId>) {
        if user >= self.lists.len() {
            self.lists.resize(user + 1, None);
        }
        self.lists[user] = Some(candidates);
    }

    /// Number of users with a registered list.
    pub fn len(&self) -> usize {
        self.lists.iter().filter(|l| l.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Vec<ItemId>>> for NegativeCandidates {
    fn from(lists: Vec<Vec<ItemId>>) -> Self {
        Self {
            lists: lists.into_iter().map(Some).collect(),
        }
    }
}

impl NegativeCandidateStore for NegativeCandidates {
    fn candidates_for(&self, user: UserId) -> Option<&[ItemId]> {
        self.lists.get(user).and_then(|list| list.as_deref())
    }
}

impl NegativeCandidateStore for Vec<Vec<ItemId>> {
    fn candidates_for(&self, user: UserId) -> Option<&[ItemId]> {
        self.get(user).map(Vec::as_slice)
    }
}
