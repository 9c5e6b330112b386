//! Offline segmentation of a markdown source tree into a section tree.
//!
//! For every `P/name.md` under a mapped source directory, the sections of
//! that page are written to `<out>/<dest>/P/name/<section-id>.md`. The
//! resulting directory is what [`crate::corpus::Corpus::load`] indexes.

use std::{
    collections::HashSet,
    path::{Component, Path, PathBuf},
    str::FromStr,
};

use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    sections::{self, DEFAULT_SPLIT_DEPTH},
    walker::{self, MARKDOWN_EXTENSIONS},
};

/// Maps a directory of the source tree to a directory of the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapping {
    pub source: PathBuf,
    pub dest: PathBuf,
}

impl SourceMapping {
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
        }
    }
}

impl Default for SourceMapping {
    /// The whole source tree into the output root.
    fn default() -> Self {
        Self::new(".", ".")
    }
}

impl FromStr for SourceMapping {
    type Err = Error;

    /// Parse `SRC=DEST`. Both sides must be relative paths that stay
    /// inside their tree (no `..`).
    fn from_str(s: &str) -> Result<Self> {
        let (source, dest) = s
            .split_once('=')
            .ok_or_else(|| Error::InvalidMapping(s.to_string()))?;
        let (source, dest) = (Path::new(source), Path::new(dest));
        if !is_contained(source) || !is_contained(dest) {
            return Err(Error::InvalidMapping(s.to_string()));
        }
        Ok(Self::new(source, dest))
    }
}

fn is_contained(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path.components().all(|c| {
            matches!(c, Component::Normal(_) | Component::CurDir)
        })
}

/// Settings for one segmentation run.
#[derive(Debug, Clone)]
pub struct MakeOptions {
    pub mappings: Vec<SourceMapping>,
    pub split_depth: usize,
    /// Append `-2`, `-3`, ... to section ids that would overwrite an
    /// earlier section of the same page instead of overwriting it.
    pub disambiguate: bool,
}

impl Default for MakeOptions {
    fn default() -> Self {
        Self {
            mappings: vec![SourceMapping::default()],
            split_depth: DEFAULT_SPLIT_DEPTH,
            disambiguate: false,
        }
    }
}

/// Counters describing one segmentation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MakeReport {
    /// Markdown files read from the source tree.
    pub files_read: usize,
    /// Files that produced at least one section.
    pub files_segmented: usize,
    /// Section files written.
    pub sections_written: usize,
    /// Section ids that repeated within one page.
    pub collisions: usize,
}

/// Remove the output tree recursively.
///
/// A missing output root is [`Error::NotFound`].
pub fn clear_data(out_root: &Path) -> Result<()> {
    if !out_root.exists() {
        return Err(Error::missing_dir(out_root));
    }
    std::fs::remove_dir_all(out_root)?;
    info!(root = %out_root.display(), "cleared section tree");
    Ok(())
}

/// Segment every mapped source directory into `out_root`.
///
/// An existing output tree is removed first, so the result reflects this
/// run only. Everything that can be checked up front is checked before the
/// old tree is touched: every mapped source directory must exist, and the
/// source and output trees must not contain one another. An unreadable
/// source file aborts the run.
pub fn make_data(
    source_root: &Path,
    out_root: &Path,
    options: &MakeOptions,
) -> Result<MakeReport> {
    if options.split_depth == 0 {
        return Err(Error::Config("split depth must be at least 1".into()));
    }
    if !source_root.is_dir() {
        return Err(Error::missing_dir(source_root));
    }
    for mapping in &options.mappings {
        let src_dir = source_root.join(&mapping.source);
        if !src_dir.is_dir() {
            return Err(Error::missing_dir(&src_dir));
        }
    }

    let source_abs = source_root.canonicalize()?;
    let out_abs = absolute_lenient(out_root)?;
    if source_abs.starts_with(&out_abs) || out_abs.starts_with(&source_abs) {
        return Err(Error::Config(format!(
            "output tree {} overlaps source tree {}",
            out_root.display(),
            source_root.display()
        )));
    }

    if out_root.exists() {
        clear_data(out_root)?;
    }
    std::fs::create_dir_all(out_root)?;

    let mut report = MakeReport::default();
    for mapping in &options.mappings {
        let src_dir = source_root.join(&mapping.source);
        let dest_dir = out_root.join(&mapping.dest);
        segment_dir(&src_dir, &dest_dir, options, &mut report)?;
    }

    info!(
        files = report.files_read,
        segmented = report.files_segmented,
        sections = report.sections_written,
        "built section tree"
    );
    Ok(report)
}

/// Absolute, symlink-resolved form of a path that may not exist yet: the
/// deepest existing ancestor is canonicalized and the rest appended.
fn absolute_lenient(path: &Path) -> Result<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = if existing.as_os_str().is_empty() {
        std::env::current_dir()?
    } else {
        existing.canonicalize()?
    };
    resolved.extend(missing.into_iter().rev());
    Ok(resolved)
}

fn segment_dir(
    src_dir: &Path,
    dest_dir: &Path,
    options: &MakeOptions,
    report: &mut MakeReport,
) -> Result<()> {
    for file in walker::discover_files(src_dir, MARKDOWN_EXTENSIONS)? {
        let stem = file.relative_path.with_extension("");
        let target_dir = dest_dir.join(stem);
        std::fs::create_dir_all(&target_dir)?;

        let content = std::fs::read_to_string(&file.absolute_path)?;
        report.files_read += 1;

        let sections = sections::split_sections(&content, options.split_depth);
        if sections.is_empty() {
            debug!(path = %file.identity(), "no sections");
            continue;
        }
        report.files_segmented += 1;

        let mut used: HashSet<String> = HashSet::new();
        for section in &sections {
            let mut id = section.id.clone();
            if !used.insert(id.clone()) {
                report.collisions += 1;
                if options.disambiguate {
                    id = next_free_id(&section.id, &used);
                    used.insert(id.clone());
                } else {
                    warn!(
                        page = %file.identity(),
                        section = %id,
                        heading = section.title(),
                        "section id repeats within page; earlier section overwritten"
                    );
                }
            }

            std::fs::write(target_dir.join(format!("{id}.md")), &section.content)?;
            report.sections_written += 1;
        }
        debug!(
            path = %file.identity(),
            sections = sections.len(),
            "segmented page"
        );
    }
    Ok(())
}

fn next_free_id(id: &str, used: &HashSet<String>) -> String {
    (2..)
        .map(|n| format!("{id}-{n}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn writes_one_file_per_section_in_a_mirrored_tree() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let out_root = out.path().join("data");
        write(
            &src.path().join("tutorial/shapes.md"),
            "# Shapes\nIntro\n## Circle\nRound\n## Rect\nSquare-ish\n",
        );

        let report =
            make_data(src.path(), &out_root, &MakeOptions::default()).unwrap();

        let page = out_root.join("tutorial/shapes");
        assert_eq!(read(&page.join("shapes.md")), "# Shapes\nIntro\n");
        assert_eq!(read(&page.join("circle.md")), "# Shapes\n## Circle\nRound\n");
        assert_eq!(
            read(&page.join("rect.md")),
            "# Shapes\n## Rect\nSquare-ish\n"
        );
        assert_eq!(
            report,
            MakeReport {
                files_read: 1,
                files_segmented: 1,
                sections_written: 3,
                collisions: 0,
            }
        );
    }

    #[test]
    fn unstructured_pages_get_an_empty_directory() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(&src.path().join("plain.md"), "No headings here.");
        write(&src.path().join("notes.txt"), "# Not markdown");

        let report =
            make_data(src.path(), out.path(), &MakeOptions::default()).unwrap();

        let page = out.path().join("plain");
        assert!(page.is_dir());
        assert_eq!(std::fs::read_dir(&page).unwrap().count(), 0);
        assert!(!out.path().join("notes").exists());
        assert_eq!(report.files_read, 1);
        assert_eq!(report.files_segmented, 0);
    }

    #[test]
    fn mappings_select_and_rename_subtrees() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(&src.path().join("en-us/docs/intro.md"), "# Intro\nHello\n");
        write(&src.path().join("ja-jp/docs/intro.md"), "# Intro\nKonnichiwa\n");

        let options = MakeOptions {
            mappings: vec!["en-us/docs=en-us".parse().unwrap()],
            ..MakeOptions::default()
        };
        make_data(src.path(), out.path(), &options).unwrap();

        assert!(out.path().join("en-us/intro/intro.md").is_file());
        assert!(!out.path().join("ja-jp").exists());
    }

    #[test]
    fn previous_output_is_cleared() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let stale = out.path().join("stale/old.md");
        write(&stale, "# Old\nGone\n");
        write(&src.path().join("new.md"), "# New\nHere\n");

        make_data(src.path(), out.path(), &MakeOptions::default()).unwrap();

        assert!(!stale.exists());
        assert!(out.path().join("new/new.md").is_file());
    }

    #[test]
    fn colliding_ids_overwrite_by_default() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(
            &src.path().join("page.md"),
            "# A\n## Setup\nfirst\n# B\n## Setup\nsecond\n",
        );

        let report =
            make_data(src.path(), out.path(), &MakeOptions::default()).unwrap();

        assert_eq!(report.collisions, 1);
        assert_eq!(
            read(&out.path().join("page/setup.md")),
            "# B\n## Setup\nsecond\n"
        );
    }

    #[test]
    fn colliding_ids_can_be_disambiguated() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(
            &src.path().join("page.md"),
            "# A\n## Setup\nfirst\n# B\n## Setup\nsecond\n",
        );

        let options = MakeOptions {
            disambiguate: true,
            ..MakeOptions::default()
        };
        let report = make_data(src.path(), out.path(), &options).unwrap();

        assert_eq!(report.collisions, 1);
        assert_eq!(report.sections_written, 2);
        assert_eq!(
            read(&out.path().join("page/setup.md")),
            "# A\n## Setup\nfirst\n"
        );
        assert_eq!(
            read(&out.path().join("page/setup-2.md")),
            "# B\n## Setup\nsecond\n"
        );
    }

    #[test]
    fn missing_source_is_an_error() {
        let out = tempfile::tempdir().unwrap();
        let err = make_data(
            &out.path().join("missing"),
            &out.path().join("data"),
            &MakeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn zero_split_depth_is_rejected() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let options = MakeOptions {
            split_depth: 0,
            ..MakeOptions::default()
        };
        assert!(matches!(
            make_data(src.path(), out.path(), &options),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn clear_removes_the_tree() {
        let out = tempfile::tempdir().unwrap();
        let root = out.path().join("data");
        write(&root.join("a/b.md"), "x");

        clear_data(&root).unwrap();
        assert!(!root.exists());
        assert!(matches!(clear_data(&root), Err(Error::NotFound { .. })));
    }

    #[test]
    fn parses_source_mappings() {
        assert_eq!(
            "en-us/docs=en-us".parse::<SourceMapping>().unwrap(),
            SourceMapping::new("en-us/docs", "en-us")
        );
        assert!("no-equals".parse::<SourceMapping>().is_err());
        assert!("=dest".parse::<SourceMapping>().is_err());
        assert!("/abs=dest".parse::<SourceMapping>().is_err());
        assert!("docs=../outside".parse::<SourceMapping>().is_err());
        assert!("../sibling=dest".parse::<SourceMapping>().is_err());
        assert!("a/../../b=dest".parse::<SourceMapping>().is_err());
        assert!("./docs=./out".parse::<SourceMapping>().is_ok());
    }

    #[test]
    fn source_inside_output_is_rejected_before_clearing() {
        let tmp = tempfile::tempdir().unwrap();
        let out_root = tmp.path().join("site");
        let page = out_root.join("docs/page.md");
        write(&page, "# Page\nBody\n");

        let err = make_data(
            &out_root.join("docs"),
            &out_root,
            &MakeOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert_eq!(read(&page), "# Page\nBody\n");
    }

    #[test]
    fn source_equal_to_output_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let page = tmp.path().join("page.md");
        write(&page, "# Page\nBody\n");

        let err = make_data(tmp.path(), tmp.path(), &MakeOptions::default())
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(page.is_file());
    }

    #[test]
    fn output_inside_source_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write(&tmp.path().join("page.md"), "# Page\nBody\n");

        let err = make_data(
            tmp.path(),
            &tmp.path().join("not-yet/data"),
            &MakeOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(!tmp.path().join("not-yet").exists());
    }

    #[test]
    fn missing_mapped_source_keeps_previous_output() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let previous = out.path().join("en-us/intro/intro.md");
        write(&previous, "# Intro\nHello\n");
        write(&src.path().join("en-us/docs/intro.md"), "# Intro\nHello\n");

        let options = MakeOptions {
            mappings: vec![
                SourceMapping::new("en-us/docs", "en-us"),
                SourceMapping::new("ja-jp/docs", "ja-jp"),
            ],
            ..MakeOptions::default()
        };
        let err = make_data(src.path(), out.path(), &options).unwrap_err();

        assert!(matches!(err, Error::NotFound { kind: "directory", .. }));
        assert!(previous.is_file());
    }
}
