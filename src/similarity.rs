use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::profile::UserProfile;
use crate::EPS;

/// Pairwise similarity measure between two users' rating histories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Similarity {
    /// Dot product of raw ratings over their norms.
    Cosine,
    /// Same shape over mean-centered ratings (Pearson correlation).
    Pearson,
}

impl Similarity {
    /// Similarity weight of `a` against `b` over the union of their rated
    /// recipes. When only one side rated a recipe, the other side is imputed
    /// with its own average rating if `impute_with_average` is set, EPS
    /// otherwise. Sign and magnitude both carry meaning; nothing is clamped.
    ///
    /// Pure function of the two profiles and the flag, safe to call from
    /// concurrent workers.
    pub fn weight(self, a: &UserProfile, b: &UserProfile, impute_with_average: bool) -> f32 {
        let placeholder_a = if impute_with_average { a.avg_rating() } else { EPS };
        let placeholder_b = if impute_with_average { b.avg_rating() } else { EPS };

        let mut sum_cross = 0.0f32;
        let mut sum_sq_a = 0.0f32;
        let mut sum_sq_b = 0.0f32;

        merge_walk(a, b, placeholder_a, placeholder_b, |rating_a, rating_b| {
            let (va, vb) = match self {
                Similarity::Cosine => (rating_a, rating_b),
                Similarity::Pearson => (rating_a - a.avg_rating(), rating_b - b.avg_rating()),
            };
            sum_cross += va * vb;
            sum_sq_a += va * va;
            sum_sq_b += vb * vb;
        });

        // additive EPS keeps the result defined and nonzero even when one
        // vector is degenerate
        (sum_cross + EPS) / (sum_sq_a * sum_sq_b + EPS).sqrt()
    }
}

/// Walk two sorted review lists in lockstep, yielding one aligned
/// `(rating_a, rating_b)` pair per recipe in the union of both lists in a
/// single O(|a| + |b|) pass. A recipe rated on only one side gets the other
/// side's placeholder; once one cursor exhausts, the rest of the longer list
/// drains the same way.
fn merge_walk(
    a: &UserProfile,
    b: &UserProfile,
    placeholder_a: f32,
    placeholder_b: f32,
    mut visit: impl FnMut(f32, f32),
) {
    let reviews_a = a.reviews();
    let reviews_b = b.reviews();
    let mut i = 0;
    let mut j = 0;

    while i < reviews_a.len() && j < reviews_b.len() {
        match reviews_a[i].recipe_id.cmp(&reviews_b[j].recipe_id) {
            Ordering::Less => {
                visit(reviews_a[i].rating, placeholder_b);
                i += 1;
            }
            Ordering::Greater => {
                visit(placeholder_a, reviews_b[j].rating);
                j += 1;
            }
            Ordering::Equal => {
                visit(reviews_a[i].rating, reviews_b[j].rating);
                i += 1;
                j += 1;
            }
        }
    }
    while i < reviews_a.len() {
        visit(reviews_a[i].rating, placeholder_b);
        i += 1;
    }
    while j < reviews_b.len() {
        visit(placeholder_a, reviews_b[j].rating);
        j += 1;
    }
}
