use std::{
    fs::ReadDir,
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::error::{Error, Result};

/// A discovered document file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path relative to the walked root directory.
    pub relative_path: PathBuf,
    /// Fully resolved absolute path.
    pub absolute_path: PathBuf,
}

impl DiscoveredFile {
    /// The relative path joined with `/`, regardless of platform.
    ///
    /// This is the identity a document carries through the corpus and into
    /// search results.
    pub fn identity(&self) -> String {
        self.relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Markdown is the only document format the pipelines understand.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md"];

/// Recursively walk a directory and discover files with one of the given
/// extensions.
///
/// Skips hidden files/directories (names starting with `.`). Results are
/// sorted by relative path so repeated walks over an unchanged tree yield
/// the same order. A missing or unlistable root is an error; entries below
/// the root that cannot be read are logged and skipped.
pub fn discover_files(
    root: &Path,
    extensions: &[&str],
) -> Result<Vec<DiscoveredFile>> {
    if !root.is_dir() {
        return Err(Error::missing_dir(root));
    }

    let canonical_root = root.canonicalize()?;
    let entries = std::fs::read_dir(&canonical_root)?;
    let mut results = Vec::new();
    walk_entries(&canonical_root, entries, extensions, &mut results);
    results.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(results)
}

fn walk_subdir(
    root: &Path,
    dir: &Path,
    extensions: &[&str],
    results: &mut Vec<DiscoveredFile>,
) {
    match std::fs::read_dir(dir) {
        Ok(entries) => walk_entries(root, entries, extensions, results),
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "skipping unreadable directory");
        }
    }
}

fn walk_entries(
    root: &Path,
    entries: ReadDir,
    extensions: &[&str],
    results: &mut Vec<DiscoveredFile>,
) {
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if name.starts_with('.') {
            continue;
        }

        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "skipping entry");
                continue;
            }
        };

        if file_type.is_dir() {
            walk_subdir(root, &entry.path(), extensions, results);
        } else if file_type.is_symlink() {
            let resolved = match entry.path().canonicalize() {
                Ok(p) => p,
                Err(_) => continue, // broken symlink
            };
            // Directory links back into the tree would loop forever.
            if resolved.starts_with(root) && resolved.is_dir() {
                continue;
            }
            if resolved.is_file() && has_extension(&resolved, extensions) {
                results.push(make_discovered(root, &entry.path(), &resolved));
            }
        } else if file_type.is_file()
            && has_extension(&entry.path(), extensions)
        {
            match entry.path().canonicalize() {
                Ok(abs) => {
                    results.push(make_discovered(root, &entry.path(), &abs));
                }
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "skipping file");
                }
            }
        }
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}

fn make_discovered(
    root: &Path,
    original_path: &Path,
    absolute_path: &Path,
) -> DiscoveredFile {
    let relative_path = original_path
        .strip_prefix(root)
        .unwrap_or(original_path)
        .to_path_buf();

    DiscoveredFile {
        relative_path,
        absolute_path: absolute_path.to_path_buf(),
    }
}
