//! `miette` integration.
//!
//! This module is feature-gated behind the `miette` feature.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};

use crate::error::{Error, Reported};
use crate::location::Mark;
use crate::snippet::mark_offset;

/// Convert a load [`Error`] into a `miette::Report`.
///
/// ```rust,no_run
/// use saphyr_marshal::{load, IntField, LoadOptions};
///
/// let yaml = "definitely\n";
/// let err = load(yaml, &IntField::new(), LoadOptions::default()).expect_err("not an int");
/// let report = saphyr_marshal::miette::to_miette_report(&err, yaml, "config.yaml");
/// eprintln!("{report:?}");
/// ```
///
/// Errors without a position (IO errors) produce a report without labels.
pub fn to_miette_report(err: &Error, source: &str, file: &str) -> miette::Report {
    let src = Arc::new(NamedSource::new(file, source.to_owned()));
    let labels = err
        .mark()
        .and_then(|mark| label(source, mark, &err.message()))
        .into_iter()
        .collect();
    miette::Report::new(ErrorDiagnostic {
        message: err.to_string(),
        code: err.code().map(|code| code.to_string()),
        src,
        labels,
        related: Vec::new(),
    })
}

/// One report for every error collected in handler mode.
pub fn collected_to_miette_report(errors: &[Reported], source: &str, file: &str) -> miette::Report {
    let src = Arc::new(NamedSource::new(file, source.to_owned()));
    let related = errors
        .iter()
        .map(|reported| ErrorDiagnostic {
            message: reported.to_string(),
            code: Some(reported.code.to_string()),
            src: Arc::clone(&src),
            labels: label(source, &reported.mark, &reported.message)
                .into_iter()
                .collect(),
            related: Vec::new(),
        })
        .collect();
    miette::Report::new(ErrorDiagnostic {
        message: format!("{} error(s) while loading {file}", errors.len()),
        code: None,
        src,
        labels: Vec::new(),
        related,
    })
}

fn label(source: &str, mark: &Mark, message: &str) -> Option<LabeledSpan> {
    let offset = mark_offset(source, mark)?;
    let len = source[offset..]
        .chars()
        .next()
        .filter(|c| *c != '\n')
        .map_or(0, char::len_utf8);
    Some(LabeledSpan::new_with_span(
        Some(message.to_owned()),
        SourceSpan::new(offset.into(), len),
    ))
}

#[derive(Clone, Debug)]
struct ErrorDiagnostic {
    message: String,
    code: Option<String>,
    src: Arc<NamedSource<String>>,
    labels: Vec<LabeledSpan>,
    related: Vec<ErrorDiagnostic>,
}

impl fmt::Display for ErrorDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorDiagnostic {}

impl Diagnostic for ErrorDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.code
            .as_ref()
            .map(|code| Box::new(code) as Box<dyn fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.labels.is_empty() {
            None
        } else {
            Some(Box::new(self.labels.clone().into_iter()))
        }
    }

    fn related(&self) -> Option<Box<dyn Iterator<Item = &dyn Diagnostic> + '_>> {
        if self.related.is_empty() {
            return None;
        }
        Some(Box::new(self.related.iter().map(|d| d as &dyn Diagnostic)))
    }
}
