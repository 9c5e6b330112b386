use std::{collections::HashMap, path::Path};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    error::Result,
    walker::{self, MARKDOWN_EXTENSIONS},
};

/// A loaded document and its identity within the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path relative to the corpus root, `/`-separated.
    pub identity: String,
    /// Trimmed file contents, never empty.
    pub text: String,
}

/// Every non-empty markdown document under one root directory.
///
/// Documents keep the order the walker produced (sorted by relative path),
/// so loading an unchanged tree twice yields the same corpus.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    /// Recursively load all markdown files under `root`.
    ///
    /// Files that cannot be read as UTF-8 text are logged and skipped; files
    /// whose trimmed content is empty are left out. A root that does not
    /// exist or cannot be listed is an error.
    pub fn load(root: &Path) -> Result<Self> {
        let files = walker::discover_files(root, MARKDOWN_EXTENSIONS)?;

        // Read files in parallel, then assemble in walk order.
        let loaded: Vec<Document> = files
            .par_iter()
            .filter_map(|file| {
                let content = match std::fs::read_to_string(&file.absolute_path)
                {
                    Ok(content) => content,
                    Err(e) => {
                        warn!(
                            path = %file.absolute_path.display(),
                            "skipping unreadable file: {e}"
                        );
                        return None;
                    }
                };
                let text = content.trim();
                if text.is_empty() {
                    debug!(path = %file.identity(), "skipping empty file");
                    return None;
                }
                Some(Document {
                    identity: file.identity(),
                    text: text.to_string(),
                })
            })
            .collect();

        let corpus = Self::from_documents(loaded);
        info!(
            documents = corpus.len(),
            root = %root.display(),
            "loaded markdown corpus"
        );
        Ok(corpus)
    }

    /// Build a corpus from documents already in memory.
    ///
    /// Empty texts are dropped. A repeated identity replaces the text of the
    /// earlier document in place.
    pub fn from_documents(
        documents: impl IntoIterator<Item = Document>,
    ) -> Self {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut kept: Vec<Document> = Vec::new();

        for doc in documents {
            if doc.text.trim().is_empty() {
                continue;
            }
            match positions.get(&doc.identity) {
                Some(&pos) => kept[pos] = doc,
                None => {
                    positions.insert(doc.identity.clone(), kept.len());
                    kept.push(doc);
                }
            }
        }

        Self { documents: kept }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
