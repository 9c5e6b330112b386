//! Hierarchical splitting of markdown documents into addressable sections.
//!
//! A document is cut at every ATX heading whose level is at or above the
//! configured split depth. Each resulting [`Section`] starts with a
//! breadcrumb that reconstructs its enclosing headings, so a section read
//! on its own still says where it came from. Deeper headings stay inline
//! as ordinary content.

/// Character that marks a heading line.
pub const HEADING_MARKER: char = '#';

/// Default heading level at which documents are split (`##`).
pub const DEFAULT_SPLIT_DEPTH: usize = 2;

/// Characters removed from heading text when deriving a section identifier.
///
/// `]` is absent from this set, so it survives into identifiers.
const ID_STRIPPED_SYMBOLS: &str = r#"`~!@#$%^&*()_-+={[}|\:;"'<,>.?/"#;

/// A contiguous slice of one source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// File-name safe identifier derived from the section's own heading.
    pub id: String,
    /// Nearest enclosing heading per level, from level 1 down to this
    /// section's level. Levels never set are empty strings.
    pub headings: Vec<String>,
    /// Breadcrumb heading lines followed by the body, verbatim.
    pub content: String,
    /// True until a non-blank line has been appended below the breadcrumb.
    pub is_empty: bool,
}

impl Section {
    fn blank() -> Self {
        Self {
            id: String::new(),
            headings: Vec::new(),
            content: String::new(),
            is_empty: true,
        }
    }

    /// Heading level of this section (1 for `#`).
    pub fn level(&self) -> usize {
        self.headings.len()
    }

    /// The heading text that opened this section.
    pub fn title(&self) -> &str {
        self.headings.last().map(String::as_str).unwrap_or_default()
    }

    fn push_line(&mut self, line: &str) {
        self.content.push_str(line);
        self.content.push('\n');
        if !line.trim().is_empty() {
            self.is_empty = false;
        }
    }
}

/// Parse a heading line, returning its level and trimmed text.
///
/// A heading is one or more `#` followed by a space; the level is the
/// number of markers.
///
/// ```
/// use docsift::sections::parse_heading;
///
/// assert_eq!(parse_heading("## Usage "), Some((2, "Usage")));
/// assert_eq!(parse_heading("#hashtag"), None);
/// assert_eq!(parse_heading("plain text"), None);
/// ```
pub fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|&c| c == HEADING_MARKER).count();
    if level == 0 {
        return None;
    }
    let rest = line[level..].strip_prefix(' ')?;
    Some((level, rest.trim()))
}

/// Derive a section identifier from heading text.
///
/// Lowercases, strips ASCII punctuation, and joins space-separated tokens
/// with `-`. Consecutive spaces produce consecutive hyphens. Identifiers are
/// not guaranteed unique; callers scope them by directory.
///
/// ```
/// use docsift::sections::generate_section_id;
///
/// assert_eq!(generate_section_id("Getting Started"), "getting-started");
/// assert_eq!(generate_section_id("Array<T>::push_back()"), "arraytpushback");
/// ```
pub fn generate_section_id(heading: &str) -> String {
    heading
        .to_lowercase()
        .chars()
        .filter(|c| !ID_STRIPPED_SYMBOLS.contains(*c))
        .collect::<String>()
        .split(' ')
        .collect::<Vec<_>>()
        .join("-")
}

/// Split a markdown document into sections at headings of level
/// `split_depth` or shallower.
///
/// Returns an empty list when the (trimmed) text does not start with a
/// heading marker. Lines that appear before the first qualifying heading
/// have no section to belong to and are dropped. Sections that never
/// receive a non-blank body line are reused by the next heading, or
/// discarded at end of input.
///
/// ```
/// use docsift::sections::split_sections;
///
/// let text = "# Title\nIntro text\n## A\nContent A\n## B\nContent B\n";
/// let sections = split_sections(text, 2);
/// let ids: Vec<_> = sections.iter().map(|s| s.id.as_str()).collect();
/// assert_eq!(ids, ["title", "a", "b"]);
/// assert_eq!(sections[1].content, "# Title\n## A\nContent A\n");
/// ```
pub fn split_sections(text: &str, split_depth: usize) -> Vec<Section> {
    let text = text.trim();
    if !text.starts_with(HEADING_MARKER) {
        return Vec::new();
    }

    let mut headings: Vec<String> = Vec::new();
    let mut sections: Vec<Section> = Vec::new();

    for line in text.lines() {
        match parse_heading(line) {
            Some((level, heading)) if level <= split_depth => {
                headings.truncate(level - 1);
                headings.resize(level, String::new());
                headings[level - 1] = heading.to_string();

                if sections.last().is_none_or(|s| !s.is_empty) {
                    sections.push(Section::blank());
                }
                let current = sections.len() - 1;
                let section = &mut sections[current];
                section.id = generate_section_id(heading);
                section.headings = headings.clone();
                section.content = breadcrumb(&headings);
            }
            _ => {
                if let Some(section) = sections.last_mut() {
                    section.push_line(line);
                }
            }
        }
    }

    if sections.last().is_some_and(|s| s.is_empty) {
        sections.pop();
    }

    sections
}

/// One heading line per level, markers repeated to match the level.
fn breadcrumb(headings: &[String]) -> String {
    let mut content = String::new();
    for (i, heading) in headings.iter().enumerate() {
        for _ in 0..=i {
            content.push(HEADING_MARKER);
        }
        content.push(' ');
        content.push_str(heading);
        content.push('\n');
    }
    content
}
