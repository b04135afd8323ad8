//! Source positions attached to composed nodes.

use std::fmt;
use std::rc::Rc;

use saphyr_parser::Span as ParserSpan;

/// Name used when a document has no source name.
pub const UNKNOWN_SOURCE: &str = "<unknown>";

/// Position of a node within its source document.
///
/// Lines and columns are 1-indexed. `0` in both means the position is unknown,
/// which is the case for nodes built programmatically rather than composed from text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mark {
    pub(crate) source: Rc<str>,
    pub(crate) line: u32,
    pub(crate) column: u32,
}

impl Mark {
    /// Create a mark for the given source name and 1-indexed coordinates.
    pub fn new(source: impl Into<Rc<str>>, line: usize, column: usize) -> Self {
        // Error reporting only, documents with more than 4G lines are not a concern.
        Self {
            source: source.into(),
            line: line as u32,
            column: column as u32,
        }
    }

    /// Mark with no source and no coordinates.
    pub fn unknown() -> Self {
        Self {
            source: Rc::from(UNKNOWN_SOURCE),
            line: 0,
            column: 0,
        }
    }

    /// Name of the document this mark points into (a file path, `<string>`, ...).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line(&self) -> u64 {
        self.line as u64
    }

    pub fn column(&self) -> u64 {
        self.column as u64
    }

    /// True if line and column are known.
    pub fn is_known(&self) -> bool {
        self.line != 0 && self.column != 0
    }
}

impl Default for Mark {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}

/// Convert a `saphyr_parser::Span` into a [`Mark`] in the named source.
///
/// Parser lines are already 1-based, columns are 0-based.
pub(crate) fn mark_from_span(source: &Rc<str>, span: &ParserSpan) -> Mark {
    let start = &span.start;
    Mark {
        source: source.clone(),
        line: start.line() as u32,
        column: (start.col() + 1) as u32,
    }
}
