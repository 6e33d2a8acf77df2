use std::path::Path;

use fxhash::FxHashMap;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::profile::{Review, UserProfile};
use crate::UserId;

/// One row of the reviews CSV. Columns are matched by header name; extra
/// columns (`date` and anything the scraper tacks on) are ignored.
#[derive(Debug, Deserialize)]
struct RawReview {
    rating: f32,
    recipe_id: u64,
    user_id: u64,
    username: String,
}

/// Load review rows from `path` and group them into one profile per user,
/// sorted by user id. The last username seen for a user wins. Any row with
/// an unparsable `rating`, `recipe_id` or `user_id` aborts the load with the
/// offending position in the error.
pub fn load_profiles(path: impl AsRef<Path>) -> Result<Vec<UserProfile>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|source| Error::Csv {
        path: path.into(),
        source,
    })?;

    let mut reviews_by_user: FxHashMap<UserId, Vec<Review>> = FxHashMap::default();
    let mut usernames: FxHashMap<UserId, String> = FxHashMap::default();

    for row in reader.deserialize() {
        let row: RawReview = row.map_err(|source| Error::Csv {
            path: path.into(),
            source,
        })?;

        usernames.insert(row.user_id, row.username);
        reviews_by_user.entry(row.user_id).or_default().push(Review {
            recipe_id: row.recipe_id,
            rating: row.rating,
        });
    }

    let mut profiles: Vec<UserProfile> = reviews_by_user
        .into_iter()
        .map(|(user_id, reviews)| {
            let username = usernames.remove(&user_id).unwrap_or_default();
            UserProfile::new(user_id, username, reviews)
        })
        .collect();
    profiles.sort_by_key(|p| p.user_id);

    info!(
        users = profiles.len(),
        path = %path.display(),
        "loaded review profiles"
    );
    Ok(profiles)
}
