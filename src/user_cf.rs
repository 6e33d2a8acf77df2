use std::borrow::Cow;
use std::time::Instant;

use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::parallel::{create_thread_pool, measure_similarity_chunked, predict_chunked};
use crate::prediction;
use crate::profile::UserProfile;
use crate::similarity::Similarity;
use crate::{RecipeId, UserId};

pub const DEFAULT_WORKERS: usize = 20;

/// Query-time knobs for a [`UserCf`] model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueryConfig {
    pub measure: Similarity,
    /// Impute a user's unrated recipes with their own average rather than EPS.
    pub impute_with_average: bool,
    pub num_workers: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            measure: Similarity::Cosine,
            impute_with_average: true,
            num_workers: DEFAULT_WORKERS,
        }
    }
}

/// Memory-based user-user collaborative filtering over a full snapshot of
/// review profiles. Holds no learned state: every query recomputes
/// similarities and predictions from the profiles it was built with.
#[derive(Serialize, Deserialize)]
pub struct UserCf {
    config: QueryConfig,
    profiles: Vec<UserProfile>,
}

impl UserCf {
    pub fn new(mut profiles: Vec<UserProfile>, config: QueryConfig) -> Self {
        profiles.sort_by_key(|p| p.user_id);
        Self { config, profiles }
    }

    pub fn profiles(&self) -> &[UserProfile] {
        &self.profiles
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Whether the dataset contains a profile for `user_id`. Lets callers
    /// tell a cold-start query apart from a data error before predictions
    /// come back degenerate.
    pub fn has_user(&self, user_id: UserId) -> bool {
        self.find_profile(user_id).is_some()
    }

    fn find_profile(&self, user_id: UserId) -> Option<&UserProfile> {
        self.profiles
            .binary_search_by_key(&user_id, |p| p.user_id)
            .ok()
            .map(|idx| &self.profiles[idx])
    }

    /// Recipes rated by at least one user other than the target, minus the
    /// recipes the target already rated. Sorted ascending so partitioning
    /// and tie-breaking stay deterministic run to run.
    pub fn candidate_recipes(&self, target_id: UserId) -> Vec<RecipeId> {
        let mut seen = FxHashSet::default();
        for profile in &self.profiles {
            if profile.user_id == target_id {
                continue;
            }
            seen.extend(profile.reviews().iter().map(|r| r.recipe_id));
        }
        if let Some(target) = self.find_profile(target_id) {
            for review in target.reviews() {
                seen.remove(&review.recipe_id);
            }
        }

        let mut candidates: Vec<RecipeId> = seen.into_iter().collect();
        candidates.sort_unstable();
        candidates
    }

    /// Rank candidate recipes for `target_id` by predicted rating,
    /// descending. When `candidates` is `None`, every recipe the target has
    /// not rated is scored.
    ///
    /// A target absent from the dataset is served from an empty placeholder
    /// profile; its predictions trend toward EPS rather than failing.
    pub fn recommend(
        &self,
        target_id: UserId,
        candidates: Option<Vec<RecipeId>>,
    ) -> Result<Vec<(RecipeId, f32)>> {
        let target: Cow<'_, UserProfile> = match self.find_profile(target_id) {
            Some(profile) => Cow::Borrowed(profile),
            None => {
                warn!(
                    user = target_id,
                    "target user not in dataset; predicting from an empty profile"
                );
                Cow::Owned(UserProfile::placeholder(target_id))
            }
        };
        let candidates = candidates.unwrap_or_else(|| self.candidate_recipes(target_id));
        let workers = self.config.num_workers;

        let start = Instant::now();
        let pool = create_thread_pool(workers)?;
        let (weights, weight_sum) = measure_similarity_chunked(
            &pool,
            target.as_ref(),
            &self.profiles,
            self.config.measure,
            self.config.impute_with_average,
            workers,
        );
        if weights.is_empty() {
            return Err(Error::EmptyNeighborhood(target_id));
        }

        let predictions = predict_chunked(
            &pool,
            target.as_ref(),
            &self.profiles,
            &candidates,
            &weights,
            weight_sum,
            self.config.impute_with_average,
            workers,
        )?;

        info!(
            user = target_id,
            candidates = candidates.len(),
            neighbors = weights.len(),
            elapsed = ?start.elapsed(),
            "recommendation query done"
        );
        Ok(prediction::rank(&candidates, &predictions))
    }
}
