//! Error codes, the error type and error handlers.
use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use saphyr_parser::ScanError;
use serde::{Deserialize, Serialize};

use crate::location::Mark;
use crate::node::Node;

/// Classification of every error the loading engine can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// A `!type` tag isn't correctly formed.
    BadTypeTagFormat,
    /// A mapping key has no matching field in the object schema.
    FieldNotDeclared,
    /// A required field isn't set in the document.
    MissingRequiredField,
    /// The node kind isn't the one expected by the field or handler.
    UnexpectedNodeType,
    /// An `!import` target can't be found in any search root.
    ImportNotFound,
    /// A `!type` tag doesn't resolve to a registered type.
    TypeResolveError,
    /// A value can't be parsed or converted.
    ValueError,
    /// Generic validation failure.
    ValidationError,
    /// Several tag handlers match the same tag.
    MultipleMatchingHandlers,
    /// An object schema is incorrect: no declared fields, or a declared field
    /// whose loaded value doesn't fit the Rust member it is assigned to. The
    /// object is discarded in both cases.
    SchemaError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadTypeTagFormat => "BAD_TYPE_TAG_FORMAT",
            ErrorCode::FieldNotDeclared => "FIELD_NOT_DECLARED",
            ErrorCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorCode::UnexpectedNodeType => "UNEXPECTED_NODE_TYPE",
            ErrorCode::ImportNotFound => "IMPORT_NOT_FOUND",
            ErrorCode::TypeResolveError => "TYPE_RESOLVE_ERROR",
            ErrorCode::ValueError => "VALUE_ERROR",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::MultipleMatchingHandlers => "MULTIPLE_MATCHING_HANDLERS",
            ErrorCode::SchemaError => "SCHEMA_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by the `load*` functions.
#[derive(Debug)]
pub enum Error {
    /// Error reported by the loading engine on a node, in raise mode.
    Load {
        code: ErrorCode,
        message: String,
        mark: Mark,
    },
    /// The YAML text could not be composed into a node tree (syntax error or budget breach).
    Parse {
        msg: String,
        mark: Mark,
    },
    /// An input file could not be read.
    IOError {
        path: Option<PathBuf>,
        cause: std::io::Error,
    },
}

impl Error {
    pub(crate) fn load(code: ErrorCode, message: String, node: &Node) -> Self {
        Error::Load {
            code,
            message,
            mark: node.mark().clone(),
        }
    }

    pub(crate) fn parse<S: Into<String>>(msg: S, mark: Mark) -> Self {
        Error::Parse {
            msg: msg.into(),
            mark,
        }
    }

    /// Map a `saphyr_parser::ScanError` into a parse error located in `source`.
    pub(crate) fn from_scan_error(source: &Rc<str>, err: ScanError) -> Self {
        let marker = err.marker();
        Error::Parse {
            msg: err.info().to_owned(),
            mark: Mark {
                source: source.clone(),
                line: marker.line() as u32,
                column: (marker.col() + 1) as u32,
            },
        }
    }

    /// The engine error code, if this error was reported by the loading engine.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Load { code, .. } => Some(*code),
            Error::Parse { .. } | Error::IOError { .. } => None,
        }
    }

    /// Position of the node (or parse event) the error refers to, when known.
    pub fn mark(&self) -> Option<&Mark> {
        match self {
            Error::Load { mark, .. } | Error::Parse { mark, .. } => Some(mark),
            Error::IOError { .. } => None,
        }
    }

    /// The bare message, without position.
    pub fn message(&self) -> String {
        match self {
            Error::Load { message, .. } => message.clone(),
            Error::Parse { msg, .. } => msg.clone(),
            Error::IOError { cause, .. } => cause.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Load { message, mark, .. } => write!(f, "{mark} : {message}"),
            Error::Parse { msg, mark } => write!(f, "{mark} : {msg}"),
            Error::IOError {
                path: Some(path),
                cause,
            } => write!(f, "IO error reading {}: {cause}", path.display()),
            Error::IOError { path: None, cause } => write!(f, "IO error: {cause}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Callback receiving every error of a load in handler mode.
///
/// When a handler is installed, errors are reported to it and loading continues,
/// so one pass can surface every problem of a document.
pub type ErrorHandler = Rc<RefCell<dyn FnMut(&Node, ErrorCode, &str)>>;

/// One error delivered to an [`ErrorCollector`].
#[derive(Clone, Debug, PartialEq)]
pub struct Reported {
    pub code: ErrorCode,
    pub message: String,
    pub mark: Mark,
}

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.mark, self.message)
    }
}

/// Error handler recording everything it receives.
///
/// ```rust
/// use saphyr_marshal::{ErrorCollector, LoadOptions, StringField, load};
///
/// let errors = ErrorCollector::new();
/// let options = LoadOptions::default().with_error_handler(errors.handler());
/// let loaded = load("[not, a, scalar]", &StringField::new(), options).unwrap();
/// assert!(loaded.is_none());
/// assert_eq!(errors.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct ErrorCollector {
    errors: Rc<RefCell<Vec<Reported>>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler appending to this collector. Every handler shares the same storage.
    pub fn handler(&self) -> ErrorHandler {
        let errors = self.errors.clone();
        Rc::new(RefCell::new(
            move |node: &Node, code: ErrorCode, message: &str| {
                errors.borrow_mut().push(Reported {
                    code,
                    message: message.to_owned(),
                    mark: node.mark().clone(),
                });
            },
        ))
    }

    pub fn errors(&self) -> Vec<Reported> {
        self.errors.borrow().clone()
    }

    pub fn codes(&self) -> Vec<ErrorCode> {
        self.errors.borrow().iter().map(|e| e.code).collect()
    }

    pub fn len(&self) -> usize {
        self.errors.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.borrow().is_empty()
    }
}

impl fmt::Debug for ErrorCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorCollector")
            .field("errors", &self.errors.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_display_prefixes_position() {
        let node = Node::scalar("x").at(Mark::new("file.yaml", 4, 2));
        let err = Error::load(ErrorCode::ValueError, "bad value".to_owned(), &node);
        assert_eq!(err.to_string(), "file.yaml:4:2 : bad value");
        assert_eq!(err.code(), Some(ErrorCode::ValueError));
        assert_eq!(err.message(), "bad value");
    }

    #[test]
    fn error_codes_display_as_constants() {
        assert_eq!(ErrorCode::MultipleMatchingHandlers.to_string(), "MULTIPLE_MATCHING_HANDLERS");
        assert_eq!(ErrorCode::SchemaError.to_string(), "SCHEMA_ERROR");
    }

    #[test]
    fn collector_records_reported_errors() {
        let collector = ErrorCollector::new();
        let handler = collector.handler();
        let node = Node::scalar("x").at(Mark::new("doc", 1, 1));
        (*handler.borrow_mut())(&node, ErrorCode::ImportNotFound, "missing");
        (*handler.borrow_mut())(&node, ErrorCode::ValueError, "bad");

        assert_eq!(collector.len(), 2);
        assert_eq!(
            collector.codes(),
            vec![ErrorCode::ImportNotFound, ErrorCode::ValueError]
        );
        assert_eq!(collector.errors()[0].to_string(), "doc:1:1 : missing");
    }
}
