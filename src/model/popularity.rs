use crate::data::{InteractionCounts, ItemId, TrainMatrix, UserId};
use crate::model::Recommender;

/// Non-personalized baseline: scores an item by the number of users who interacted with it.
///
/// Online updates add the new interaction to the training matrix, so repeated
/// observations of the same (user, item) pair are counted once. The same matrix
/// backs [`InteractionCounts`], so history sizes grow with online updates.
#[derive(Debug, Clone)]
pub struct ItemPopularity {
    train: TrainMatrix,
    popularity: Vec<f64>,
}

impl ItemPopularity {
    pub fn new(train: TrainMatrix) -> Self {
        Self {
            train,
            popularity: Vec::new(),
        }
    }

    pub fn train_matrix(&self) -> &TrainMatrix {
        &self.train
    }
}

impl Recommender for ItemPopularity {
    fn score(&self, _user: UserId, item: ItemId) -> f64 {
        self.popularity.get(item).copied().unwrap_or(0.0)
    }

    fn train(&mut self) {
        let mut popularity = vec![0.0; self.train.item_count()];
        for user in 0..self.train.user_count() {
            for item in self.train.items_of(user) {
                popularity[item] += 1.0;
            }
        }
        self.popularity = popularity;
    }

    fn apply(&mut self, user: UserId, item: ItemId) {
        if !self.train.insert(user, item) {
            return;
        }
        if item >= self.popularity.len() {
            self.popularity.resize(item + 1, 0.0);
        }
        self.popularity[item] += 1.0;
    }
}

impl InteractionCounts for ItemPopularity {
    fn user_count(&self) -> usize {
        self.train.user_count()
    }

    fn count_for_user(&self, user: UserId) -> usize {
        self.train.count_for_user(user)
    }
}
