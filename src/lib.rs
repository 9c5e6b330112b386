//! docsift - split structured markdown into sections and search them.
//!
//! Two pipelines share a directory of markdown files:
//!
//! - [`dataset::make_data`] cuts every page of a source tree into sections
//!   at a heading depth (see [`sections::split_sections`]) and writes one
//!   file per section.
//! - [`DocCache::load`] reads that tree back, fits a TF-IDF index over it,
//!   and ranks sections against free-text queries by cosine similarity.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use docsift::{DocCache, dataset::{self, MakeOptions}};
//!
//! let out = Path::new("data");
//! dataset::make_data(Path::new("docs"), out, &MakeOptions::default()).unwrap();
//!
//! let cache = DocCache::load(out).unwrap();
//! for r in cache.search("draw a circle", 5) {
//!     println!("{} (score: {:.3})", r.file, r.score);
//! }
//! ```

pub mod corpus;
pub mod data_dir;
pub mod dataset;
pub mod error;
pub mod index;
pub mod links;
pub mod mcp;
pub mod search;
pub mod sections;
pub mod tokenizer;
pub mod walker;
pub mod web;

pub use corpus::{Corpus, Document};
pub use data_dir::DataDir;
pub use error::{Error, Result};
pub use index::TfidfIndex;
pub use search::{DocCache, SearchResult};
pub use sections::Section;
