use std::path::PathBuf;

use thiserror::Error;

use crate::UserId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to access `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid reviews csv `{path}`: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Fewer than two users in the dataset: nobody to borrow ratings from.
    #[error("no neighbors available for user {0}; at least one other rated profile is required")]
    EmptyNeighborhood(UserId),

    #[error("failed to build worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to serialize model: {0}")]
    Serialize(#[source] bincode::Error),

    #[error("failed to deserialize model: {0}")]
    Deserialize(#[source] bincode::Error),

    #[error("model file not found: `{0}`")]
    ModelNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
