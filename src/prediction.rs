use std::cmp::Ordering;

use fxhash::FxHashMap;

use crate::error::{Error, Result};
use crate::profile::UserProfile;
use crate::similarity::Similarity;
use crate::{RecipeId, UserId, EPS};

/// Similarity weights keyed by the other user's id, from the perspective of
/// one fixed target user.
pub type WeightMap = FxHashMap<UserId, f32>;

/// Predicted ratings keyed by recipe id.
pub type PredictionMap = FxHashMap<RecipeId, f32>;

/// Measure the target user against every other user in `others`, returning
/// the weight map and the running sum of all weights. Negative weights count
/// toward the sum; nothing is clamped. The target's own profile is skipped
/// by id, so `others` may be the full profile list or any slice of it.
pub fn measure_similarity(
    target: &UserProfile,
    others: &[UserProfile],
    measure: Similarity,
    impute_with_average: bool,
) -> (WeightMap, f32) {
    let mut weights = WeightMap::default();
    let mut weight_sum = 0.0f32;

    for other in others {
        if other.user_id == target.user_id {
            continue;
        }
        let weight = measure.weight(target, other, impute_with_average);
        weights.insert(other.user_id, weight);
        weight_sum += weight;
    }

    (weights, weight_sum)
}

/// Predict a rating for each candidate recipe.
///
/// Each neighbor contributes its deviation from its own average on the
/// candidate (imputed when unrated), scaled by its similarity weight; the
/// normalized sum is re-centered on the target's average and floored at EPS
/// so a prediction never goes non-positive. Candidates nobody rated still
/// get a prediction near the target's average.
///
/// `weight_sum` is derived from `weights` when not supplied. An empty weight
/// map is a fatal data error; an exact-zero sum is floored to EPS instead of
/// dividing by zero.
pub fn predict(
    target: &UserProfile,
    others: &[UserProfile],
    candidates: &[RecipeId],
    weights: &WeightMap,
    weight_sum: Option<f32>,
    impute_with_average: bool,
) -> Result<PredictionMap> {
    if weights.is_empty() {
        return Err(Error::EmptyNeighborhood(target.user_id));
    }
    let mut weight_sum = weight_sum.unwrap_or_else(|| weights.values().sum());
    if weight_sum == 0.0 {
        weight_sum = EPS;
    }

    let mut predictions = PredictionMap::default();
    for &recipe_id in candidates {
        let mut deviation_sum = 0.0f32;
        for other in others {
            if other.user_id == target.user_id {
                continue;
            }
            let Some(&weight) = weights.get(&other.user_id) else {
                continue;
            };
            deviation_sum +=
                weight * (other.lookup(recipe_id, impute_with_average) - other.avg_rating());
        }

        let rating = (deviation_sum / weight_sum + target.avg_rating()).max(EPS);
        predictions.insert(recipe_id, rating);
    }

    Ok(predictions)
}

/// Order predictions for display: descending by predicted rating, ties
/// keeping the candidate order (stable sort, no secondary key).
pub fn rank(candidates: &[RecipeId], predictions: &PredictionMap) -> Vec<(RecipeId, f32)> {
    let mut ranked: Vec<(RecipeId, f32)> = candidates
        .iter()
        .filter_map(|id| predictions.get(id).map(|&rating| (*id, rating)))
        .collect();
    ranked.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Review;

    fn profile(user_id: u64, ratings: &[(u64, f32)]) -> UserProfile {
        let reviews = ratings
            .iter()
            .map(|&(recipe_id, rating)| Review { recipe_id, rating })
            .collect();
        UserProfile::new(user_id, "", reviews)
    }

    #[test]
    fn test_measure_similarity_skips_target_and_sums_weights() {
        let target = profile(1, &[(1, 5.0), (2, 3.0)]);
        let others = vec![
            target.clone(),
            profile(2, &[(1, 4.0), (2, 4.0)]),
            profile(3, &[(2, 2.0)]),
        ];

        let (weights, weight_sum) =
            measure_similarity(&target, &others, Similarity::Cosine, true);

        assert_eq!(weights.len(), 2);
        assert!(!weights.contains_key(&1));
        let manual_sum: f32 = weights.values().sum();
        assert!((weight_sum - manual_sum).abs() < 1e-6);
    }

    #[test]
    fn test_prediction_lands_between_neighbor_signals() {
        // U1 and U2 both rated the candidate well; U3's prediction for it
        // must land strictly inside the rating scale, above U3's own average.
        let others = vec![
            profile(1, &[(1, 5.0), (2, 3.0)]),
            profile(2, &[(1, 4.0), (2, 4.0)]),
        ];
        let target = profile(3, &[(2, 2.0)]);

        let (weights, weight_sum) =
            measure_similarity(&target, &others, Similarity::Cosine, true);
        let predictions = predict(&target, &others, &[1], &weights, Some(weight_sum), true)
            .expect("two neighbors available");

        let predicted = predictions[&1];
        assert!(predicted > 1.0 && predicted < 5.0);
        assert!(predicted > target.avg_rating());
    }

    #[test]
    fn test_prediction_floor_is_eps() {
        // an unknown target has an EPS average, and both neighbors rated the
        // candidate far below their own averages, pushing the raw prediction
        // negative
        let others = vec![
            profile(1, &[(1, 5.0), (2, 1.0)]),
            profile(2, &[(1, 5.0), (2, 1.0)]),
        ];
        let target = UserProfile::placeholder(9);

        let (weights, weight_sum) =
            measure_similarity(&target, &others, Similarity::Cosine, true);
        let predictions = predict(&target, &others, &[2], &weights, Some(weight_sum), true)
            .expect("two neighbors available");

        assert_eq!(predictions[&2], EPS);
    }

    #[test]
    fn test_unrated_candidate_still_predicted() {
        let others = vec![
            profile(1, &[(1, 5.0)]),
            profile(2, &[(1, 4.0)]),
        ];
        let target = profile(3, &[(1, 3.0)]);

        let (weights, weight_sum) =
            measure_similarity(&target, &others, Similarity::Cosine, true);
        // recipe 99 appears in nobody's history
        let predictions = predict(&target, &others, &[99], &weights, Some(weight_sum), true)
            .expect("two neighbors available");

        // every neighbor's deviation is imputed to zero, leaving the target average
        assert!((predictions[&99] - target.avg_rating()).abs() < 1e-5);
    }

    #[test]
    fn test_weight_sum_derived_when_missing() {
        let others = vec![
            profile(1, &[(1, 5.0), (2, 3.0)]),
            profile(2, &[(1, 4.0), (2, 4.0)]),
        ];
        let target = profile(3, &[(2, 2.0)]);

        let (weights, weight_sum) =
            measure_similarity(&target, &others, Similarity::Pearson, true);
        let explicit =
            predict(&target, &others, &[1, 2], &weights, Some(weight_sum), true).unwrap();
        let derived = predict(&target, &others, &[1, 2], &weights, None, true).unwrap();

        for recipe_id in [1, 2] {
            assert!((explicit[&recipe_id] - derived[&recipe_id]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_neighborhood_is_fatal() {
        let target = profile(1, &[(1, 5.0)]);
        let result = predict(&target, &[], &[1], &WeightMap::default(), None, true);
        assert!(matches!(result, Err(Error::EmptyNeighborhood(1))));
    }

    #[test]
    fn test_rank_orders_descending_with_stable_ties() {
        let mut predictions = PredictionMap::default();
        predictions.insert(10, 3.0);
        predictions.insert(20, 4.5);
        predictions.insert(30, 3.0);
        predictions.insert(40, 1.0);

        let ranked = rank(&[10, 20, 30, 40], &predictions);
        let ids: Vec<u64> = ranked.iter().map(|(id, _)| *id).collect();
        // 10 and 30 tie at 3.0 and keep their candidate order
        assert_eq!(ids, vec![20, 10, 30, 40]);
    }
}
