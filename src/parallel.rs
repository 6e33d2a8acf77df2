use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::Result;
use crate::prediction::{self, PredictionMap, WeightMap};
use crate::profile::UserProfile;
use crate::similarity::Similarity;
use crate::RecipeId;

pub(crate) fn create_thread_pool(num_threads: usize) -> Result<ThreadPool> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(num_threads.max(1))
        .build()?;
    Ok(pool)
}

/// Contiguous chunk length for splitting `len` items across `workers`
/// workers. The trailing chunk comes up short when the division is uneven,
/// and workers beyond `len` simply receive no chunk.
fn chunk_len(len: usize, workers: usize) -> usize {
    len.div_ceil(workers.max(1)).max(1)
}

/// Similarity stage: fan the other-users list out in contiguous chunks, one
/// independent worker per chunk, each producing a partial weight map and
/// partial sum against the fixed target. After the join, the disjoint
/// partial maps are unioned and the partial sums added in chunk order, so
/// the merge is deterministic.
pub(crate) fn measure_similarity_chunked(
    pool: &ThreadPool,
    target: &UserProfile,
    others: &[UserProfile],
    measure: Similarity,
    impute_with_average: bool,
    workers: usize,
) -> (WeightMap, f32) {
    let start = Instant::now();
    let partials: Vec<(WeightMap, f32)> = pool.install(|| {
        others
            .par_chunks(chunk_len(others.len(), workers))
            .map(|chunk| prediction::measure_similarity(target, chunk, measure, impute_with_average))
            .collect()
    });

    let mut weights = WeightMap::default();
    let mut weight_sum = 0.0f32;
    for (partial_weights, partial_sum) in partials {
        weights.extend(partial_weights);
        weight_sum += partial_sum;
    }

    debug!(
        neighbors = weights.len(),
        elapsed = ?start.elapsed(),
        "similarity stage done"
    );
    (weights, weight_sum)
}

/// Prediction stage: fan the candidate list out in contiguous chunks. Every
/// worker reads the complete merged weight map from the similarity stage, so
/// this must not start before that stage's join. Partial prediction maps
/// have disjoint keys by construction and union cleanly.
#[allow(clippy::too_many_arguments)]
pub(crate) fn predict_chunked(
    pool: &ThreadPool,
    target: &UserProfile,
    others: &[UserProfile],
    candidates: &[RecipeId],
    weights: &WeightMap,
    weight_sum: f32,
    impute_with_average: bool,
    workers: usize,
) -> Result<PredictionMap> {
    let start = Instant::now();
    let partials: Vec<PredictionMap> = pool.install(|| {
        candidates
            .par_chunks(chunk_len(candidates.len(), workers))
            .map(|chunk| {
                prediction::predict(
                    target,
                    others,
                    chunk,
                    weights,
                    Some(weight_sum),
                    impute_with_average,
                )
            })
            .collect::<Result<_>>()
    })?;

    let mut predictions = PredictionMap::default();
    for partial in partials {
        predictions.extend(partial);
    }

    debug!(
        candidates = predictions.len(),
        elapsed = ?start.elapsed(),
        "prediction stage done"
    );
    Ok(predictions)
}
