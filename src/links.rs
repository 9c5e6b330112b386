//! Turning result identities into documentation URLs.
//!
//! A section file `guide/shapes/circle.md` was produced from the page
//! `guide/shapes.md`, so its public URL is the page URL with the section id
//! as fragment: `<base>guide/shapes#circle`.

use std::{collections::BTreeMap, str::FromStr};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::error::{Error, Result};

/// Characters escaped inside a single URL path segment or fragment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// Ensure `url` ends with exactly one `/`.
pub fn normalize_base_url(url: &str) -> String {
    format!("{}/", url.trim_end_matches('/'))
}

/// Build the public URL for a result file.
///
/// The `.md` suffix is removed and the last path segment is the section id.
/// An `index` page directory directly above the section is collapsed. With
/// `include_anchor` the section id becomes the URL fragment; without it the
/// URL points at the page.
///
/// ```
/// use docsift::links::build_docs_url;
///
/// let base = "https://docs.example.org/";
/// assert_eq!(
///     build_docs_url(base, "en-us/tutorial/shapes/circle.md", true),
///     "https://docs.example.org/en-us/tutorial/shapes#circle"
/// );
/// assert_eq!(
///     build_docs_url(base, "en-us/tutorial/index/welcome.md", false),
///     "https://docs.example.org/en-us/tutorial"
/// );
/// ```
pub fn build_docs_url(base_url: &str, file: &str, include_anchor: bool) -> String {
    let stem = file.strip_suffix(".md").unwrap_or(file);
    let mut path: Vec<&str> = stem.split('/').collect();
    if path.len() >= 2 && path[path.len() - 2] == "index" {
        path.remove(path.len() - 2);
    }

    let section = path.pop().unwrap_or_default();
    let page = path
        .iter()
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");

    if include_anchor {
        format!(
            "{base_url}{page}#{}",
            utf8_percent_encode(section, SEGMENT)
        )
    } else {
        format!("{base_url}{page}")
    }
}

/// Coarse relevance bucket for a similarity score.
///
/// The bucket names and thresholds match what the public search API has
/// always returned, including "High" ranking above "Very High".
pub fn relevance_label(score: f64) -> &'static str {
    if score >= 0.90 {
        "High"
    } else if score >= 0.75 {
        "Very High"
    } else if score >= 0.50 {
        "Moderate"
    } else if score >= 0.30 {
        "Weak"
    } else {
        "Low"
    }
}

/// A named documentation site that results link into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub label: String,
    pub base_url: String,
    /// Whether links carry the section id as a fragment.
    pub anchored: bool,
}

impl LinkTarget {
    pub fn new(label: &str, base_url: &str, anchored: bool) -> Self {
        Self {
            label: label.to_string(),
            base_url: normalize_base_url(base_url),
            anchored,
        }
    }

    pub fn url_for(&self, file: &str) -> String {
        build_docs_url(&self.base_url, file, self.anchored)
    }
}

/// `LABEL=URL` pair as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    pub label: String,
    pub base_url: String,
}

impl FromStr for LinkSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (label, url) = s.split_once('=').ok_or_else(|| {
            Error::Config(format!("invalid link '{s}', expected LABEL=URL"))
        })?;
        if label.is_empty() || url.is_empty() {
            return Err(Error::Config(format!(
                "invalid link '{s}', expected LABEL=URL"
            )));
        }
        Ok(Self {
            label: label.to_string(),
            base_url: url.to_string(),
        })
    }
}

/// All sites a search result links into.
#[derive(Debug, Clone, Default)]
pub struct LinkConfig {
    targets: Vec<LinkTarget>,
}

impl LinkConfig {
    pub fn new(anchored: &[LinkSpec], pages: &[LinkSpec]) -> Self {
        let targets = anchored
            .iter()
            .map(|l| LinkTarget::new(&l.label, &l.base_url, true))
            .chain(
                pages
                    .iter()
                    .map(|l| LinkTarget::new(&l.label, &l.base_url, false)),
            )
            .collect();
        Self { targets }
    }

    /// URLs for `file` keyed by target label.
    pub fn urls_for(&self, file: &str) -> BTreeMap<String, String> {
        self.targets
            .iter()
            .map(|t| (t.label.clone(), t.url_for(file)))
            .collect()
    }
}
