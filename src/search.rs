//! Ranking of indexed sections against free-text queries.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::{corpus::Corpus, error::Result, index::TfidfIndex};

/// One ranked document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Path of the document relative to the corpus root.
    pub file: String,
    /// Full document text.
    pub content: String,
    /// Cosine similarity in `(0, 1]`.
    pub score: f64,
}

/// Rank indexed documents against a bag-of-words query.
///
/// Returns at most `limit` results ordered by descending score. Documents
/// with zero similarity are never returned. Exact ties put the document
/// that was loaded later first. With no index (empty corpus) or a
/// non-positive limit the result is empty.
pub fn search(
    index: Option<&TfidfIndex>,
    query: &str,
    limit: i64,
) -> Vec<SearchResult> {
    let Some(index) = index else {
        return Vec::new();
    };
    if limit <= 0 {
        return Vec::new();
    }

    let query_vector = index.transform(query);
    if query_vector.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<(usize, f64)> = index
        .similarities(&query_vector)
        .into_iter()
        .enumerate()
        .filter(|&(_, score)| score > 0.0)
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
    ranked.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

    ranked
        .into_iter()
        .map(|(pos, score)| {
            let doc = &index.documents()[pos];
            SearchResult {
                file: doc.identity.clone(),
                content: doc.text.clone(),
                score,
            }
        })
        .collect()
}

/// A corpus directory loaded and indexed once, then searched many times.
///
/// Immutable after [`DocCache::load`]; share it behind an `Arc` to serve
/// concurrent queries.
#[derive(Debug)]
pub struct DocCache {
    root: PathBuf,
    index: Option<TfidfIndex>,
}

impl DocCache {
    /// Load every markdown file under `root` and fit the index.
    pub fn load(root: &Path) -> Result<Self> {
        let corpus = Corpus::load(root)?;
        Ok(Self::from_corpus(root, corpus))
    }

    pub fn from_corpus(root: &Path, corpus: Corpus) -> Self {
        Self {
            root: root.to_path_buf(),
            index: TfidfIndex::fit(corpus),
        }
    }

    pub fn search(&self, query: &str, limit: i64) -> Vec<SearchResult> {
        let results = search(self.index.as_ref(), query, limit);
        info!("found {} results for query '{query}'", results.len());
        results
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> Option<&TfidfIndex> {
        self.index.as_ref()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.index.as_ref().map_or(0, TfidfIndex::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Format results for human-readable terminal output.
pub fn format_human(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found.\n".to_string();
    }

    let mut out = String::new();
    for (i, r) in results.iter().enumerate() {
        out.push_str(&format!("{:>3}. [{:.3}] {}\n", i + 1, r.score, r.file));
        if let Some(title) = r.content.lines().next() {
            out.push_str(&format!("     {title}\n"));
        }
    }
    out.push_str(&format!("\n{} result(s)\n", results.len()));
    out
}

#[derive(Serialize)]
struct JsonResponse<'a> {
    query: &'a str,
    result_count: usize,
    results: &'a [SearchResult],
}

/// Format results as a JSON document.
pub fn format_json(
    results: &[SearchResult],
    query: &str,
) -> serde_json::Result<String> {
    serde_json::to_string(&JsonResponse {
        query,
        result_count: results.len(),
        results,
    })
}
