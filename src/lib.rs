//! Memory-based collaborative filtering for recipe reviews.
//!
//! Builds one rating profile per user from a review dataset, scores the
//! target user against every other user with cosine or Pearson similarity
//! over the union of their rated recipes, and predicts ratings for unseen
//! recipes as a similarity-weighted average of neighbor deviations. Both the
//! all-pairs similarity pass and the per-recipe prediction pass fan out over
//! a rayon thread pool in contiguous chunks and merge disjoint partial
//! results after a join barrier.

pub mod data;
pub mod error;
mod parallel;
pub mod prediction;
pub mod profile;
pub mod serialization;
pub mod similarity;
pub mod user_cf;

pub use error::{Error, Result};
pub use profile::{Review, UserProfile};
pub use similarity::Similarity;
pub use user_cf::{QueryConfig, UserCf};

/// Identifier of a user in the reviews dataset.
pub type UserId = u64;
/// Identifier of a recipe.
pub type RecipeId = u64;

/// Small positive constant standing in wherever a plain zero would poison a
/// denominator or a ranking: empty-profile averages, imputed ratings,
/// similarity denominators, the prediction floor.
pub const EPS: f32 = 1e-5;
