use serde::{Deserialize, Serialize};

use crate::{RecipeId, UserId, EPS};

/// A single review: one recipe, one rating on the 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub recipe_id: RecipeId,
    pub rating: f32,
}

/// One user's complete rating history, sorted ascending by recipe id with no
/// duplicate recipes, plus the precomputed average used for imputation and
/// mean-centering. Built once at load time and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
    reviews: Vec<Review>,
    avg_rating: f32,
}

impl UserProfile {
    pub fn new(user_id: UserId, username: impl Into<String>, mut reviews: Vec<Review>) -> Self {
        // stable sort, so the first of any duplicate recipe ids survives dedup
        reviews.sort_by_key(|r| r.recipe_id);
        reviews.dedup_by_key(|r| r.recipe_id);

        let avg_rating = if reviews.is_empty() {
            EPS
        } else {
            reviews.iter().map(|r| r.rating).sum::<f32>() / reviews.len() as f32
        };

        Self {
            user_id,
            username: username.into(),
            reviews,
            avg_rating,
        }
    }

    /// Stand-in for a user absent from the dataset: no reviews, EPS average.
    pub fn placeholder(user_id: UserId) -> Self {
        Self::new(user_id, String::new(), Vec::new())
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn avg_rating(&self) -> f32 {
        self.avg_rating
    }

    /// Rating the user gave `recipe_id`. For an unrated recipe the fallback
    /// is the user's average when `fallback_to_average` is set, EPS otherwise.
    pub fn lookup(&self, recipe_id: RecipeId, fallback_to_average: bool) -> f32 {
        match self.reviews.binary_search_by_key(&recipe_id, |r| r.recipe_id) {
            Ok(idx) => self.reviews[idx].rating,
            Err(_) if fallback_to_average => self.avg_rating,
            Err(_) => EPS,
        }
    }
}
