use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("data directory could not be determined: {0}")]
    DataDir(PathBuf),

    #[error("invalid source mapping '{0}', expected SRC=DEST")]
    InvalidMapping(String),

    #[error("server error: {0}")]
    Server(String),
}

impl Error {
    /// Build a `NotFound` error for a directory path.
    pub fn missing_dir(path: &std::path::Path) -> Self {
        Self::NotFound {
            kind: "directory",
            name: path.display().to_string(),
        }
    }
}
