//! Rustc-like source excerpts around an error position, drawn with `annotate-snippets`.

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet, renderer::DecorStyle};

use crate::error::{Error, Reported};
use crate::location::Mark;

/// Lines shown above and below the error line.
const CONTEXT_LINES: usize = 2;

/// Render `msg` as a snippet of `text` pointing at `mark`.
///
/// Falls back to `"<mark> : <msg>"` when the position is unknown or outside `text`.
pub(crate) fn render_snippet(text: &str, mark: &Mark, msg: &str) -> String {
    render_window(text, mark, msg).unwrap_or_else(|| format!("{mark} : {msg}"))
}

fn render_window(text: &str, mark: &Mark, msg: &str) -> Option<String> {
    if !mark.is_known() {
        return None;
    }
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let starts = line_starts(text);
    let row = mark.line() as usize;
    let col = mark.column() as usize;
    let start = offset_in(text, &starts, row, col)?;
    let end = text[start..]
        .chars()
        .next()
        .filter(|c| *c != '\n' && *c != '\r')
        .map_or(start, |c| start + c.len_utf8());

    let first_row = row.saturating_sub(CONTEXT_LINES).max(1);
    let last_row = (row + CONTEXT_LINES).min(starts.len());
    let window_start = starts[first_row - 1];
    let window_end = starts.get(last_row).copied().unwrap_or(text.len());
    let window = &text[window_start..window_end];

    let report = &[Level::ERROR
        .primary_title(format!("line {row} column {col}: {msg}"))
        .element(
            Snippet::source(window)
                .line_start(first_row)
                .path(mark.source())
                .fold(false)
                .annotation(
                    AnnotationKind::Primary
                        .span(start - window_start..end - window_start)
                        .label(msg),
                ),
        )];
    let renderer = Renderer::plain().decor_style(DecorStyle::Ascii);
    Some(renderer.render(report).to_string())
}

/// Byte offset of `mark` in `text`, if it points inside it.
pub(crate) fn mark_offset(text: &str, mark: &Mark) -> Option<usize> {
    let bom = if text.starts_with('\u{FEFF}') { '\u{FEFF}'.len_utf8() } else { 0 };
    let text = &text[bom..];
    let starts = line_starts(text);
    offset_in(text, &starts, mark.line() as usize, mark.column() as usize).map(|offset| offset + bom)
}

fn offset_in(text: &str, starts: &[usize], row: usize, col: usize) -> Option<usize> {
    if row == 0 || row > starts.len() {
        return None;
    }
    let line_end = starts.get(row).map_or(text.len(), |next| next - 1);
    let line = text[starts[row - 1]..line_end].trim_end_matches(['\n', '\r']);
    Some(starts[row - 1] + col_to_byte_offset(line, col)?)
}

fn line_starts(text: &str) -> Vec<usize> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut starts = vec![0];
    starts.extend(
        text.bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i + 1)
            .filter(|start| *start < text.len()),
    );
    starts
}

/// Byte offset of the 1-based character column `col`; one past the end is allowed.
fn col_to_byte_offset(line: &str, col: usize) -> Option<usize> {
    let index = col.checked_sub(1)?;
    match line.char_indices().nth(index) {
        Some((offset, _)) => Some(offset),
        None if index == line.chars().count() => Some(line.len()),
        None => None,
    }
}

impl Error {
    /// Render this error against the YAML text it was produced from.
    ///
    /// Errors without a position (IO errors) render as their `Display`.
    pub fn render_snippet(&self, source: &str) -> String {
        match self.mark() {
            Some(mark) => render_snippet(source, mark, &self.message()),
            None => self.to_string(),
        }
    }
}

impl Reported {
    /// Render this error against the YAML text it was reported on.
    pub fn render_snippet(&self, source: &str) -> String {
        render_snippet(source, &self.mark, &self.message)
    }
}
