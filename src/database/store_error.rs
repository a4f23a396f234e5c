use std::path::PathBuf;

use thiserror::Error;

/// Failures of the in-memory store's write and load operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("collection {collection} only stores JSON objects")]
    NotAnObject { collection: String },

    #[error("document for {collection} has no '{key}' and ids are not generated")]
    MissingId { collection: String, key: String },

    #[error("expected a JSON array of documents")]
    NotAnArray,

    #[error("store lock poisoned")]
    LockPoisoned,
}
