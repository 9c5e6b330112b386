use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "DOCSIFT_DATA_DIR";

/// Root of the section tree: written by `make`, read by search.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Resolve the data directory from, in order of priority:
    /// 1. An explicit path (from --data-dir)
    /// 2. The DOCSIFT_DATA_DIR environment variable
    /// 3. The XDG data directory (~/.local/share/docsift/)
    ///
    /// The directory is not created here; searching a tree that was never
    /// built should fail loudly.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let env = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
        Self::resolve_with(explicit, env)
    }

    fn resolve_with(
        explicit: Option<&Path>,
        env: Option<PathBuf>,
    ) -> Result<Self> {
        let root = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Some(path) = env.filter(|p| !p.as_os_str().is_empty()) {
            path
        } else {
            xdg::BaseDirectories::with_prefix("docsift")
                .get_data_home()
                .ok_or_else(|| Error::DataDir(PathBuf::from("$XDG_DATA_HOME")))?
        };

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the section tree has been built.
    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }
}
