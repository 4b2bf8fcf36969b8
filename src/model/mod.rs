//! Recommender models consumed by the evaluation engine.

pub mod popularity;

pub use popularity::ItemPopularity;

use crate::data::{ItemId, UserId};

/// A top-K recommender the evaluation engine can score and update.
///
/// Offline evaluation calls [`Recommender::score`] from several worker threads at
/// once, so implementations used there must also be `Sync`. `apply` is never called
/// while scores are being computed on another thread.
pub trait Recommender {
    /// Prediction score of `user` on `item`; higher ranks first.
    fn score(&self, user: UserId, item: ItemId) -> f64;

    /// Build the model from its training data.
    fn train(&mut self);

    /// Update the model with one new observation.
    fn apply(&mut self, user: UserId, item: ItemId);

    /// Current training loss, shown in progress lines.
    fn loss(&self) -> f64 {
        0.0
    }
}
