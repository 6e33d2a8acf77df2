use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};

/// Write `model` to `path` as gzip-compressed bincode.
pub fn save_model<T: Serialize>(model: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|source| Error::Io {
            path: path.into(),
            source,
        })?;

    let bytes = bincode::serialize(model).map_err(Error::Serialize)?;

    let mut encoder = GzEncoder::new(file, Compression::new(1));
    encoder.write_all(&bytes).map_err(|source| Error::Io {
        path: path.into(),
        source,
    })?;
    encoder.finish().map_err(|source| Error::Io {
        path: path.into(),
        source,
    })?;

    info!(path = %path.display(), "saved model");
    Ok(())
}

/// Read a model previously written by [`save_model`].
pub fn load_model<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::ModelNotFound(path.into()));
    }

    let file = File::open(path).map_err(|source| Error::Io {
        path: path.into(),
        source,
    })?;
    let mut decoder = GzDecoder::new(file);
    let mut bytes = Vec::new();
    decoder
        .read_to_end(&mut bytes)
        .map_err(|source| Error::Io {
            path: path.into(),
            source,
        })?;

    let model = bincode::deserialize(&bytes).map_err(Error::Deserialize)?;
    info!(path = %path.display(), "loaded model");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Review, UserProfile};
    use crate::user_cf::{QueryConfig, UserCf};

    fn profiles() -> Vec<UserProfile> {
        vec![
            UserProfile::new(
                1,
                "alice",
                vec![
                    Review { recipe_id: 1, rating: 5.0 },
                    Review { recipe_id: 2, rating: 3.0 },
                ],
            ),
            UserProfile::new(2, "bob", vec![Review { recipe_id: 1, rating: 4.0 }]),
        ]
    }

    #[test]
    fn test_model_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_cf.gz");

        let model = UserCf::new(profiles(), QueryConfig::default());
        let before = model.recommend(2, Some(vec![2])).unwrap();

        save_model(&model, &path).unwrap();
        let loaded: UserCf = load_model(&path).unwrap();
        let after = loaded.recommend(2, Some(vec![2])).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_profiles_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.gz");

        save_model(&profiles(), &path).unwrap();
        let loaded: Vec<UserProfile> = load_model(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].username, "alice");
        assert_eq!(loaded[0].lookup(2, false), 3.0);
    }

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<Vec<UserProfile>> = load_model(dir.path().join("absent.gz"));
        assert!(matches!(result, Err(Error::ModelNotFound(_))));
    }
}
