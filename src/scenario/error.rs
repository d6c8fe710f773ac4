use std::path::PathBuf;

/// Errors from reading, writing or naming scenario artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("invalid scenario name `{0}`")]
    InvalidName(String),

    #[error("scenario `{0}` not found")]
    NotFound(String),

    #[error("scenario `{0}` already exists")]
    AlreadyExists(String),

    #[error("scenario file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scenario file is not a JSON array of objects: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ScenarioError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScenarioError::Io {
            path: path.into(),
            source,
        }
    }
}
