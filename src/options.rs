use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use crate::budget::Budget;
use crate::context::DEFAULT_MAX_DEPTH;
use crate::error::{ErrorHandler, ErrorCode};
use crate::location::UNKNOWN_SOURCE;
use crate::node::Node;
use crate::tag_handlers::TagHandler;

/// Options of one `load` call.
///
/// Built-in tag handlers are always installed; `tag_handlers` adds to them.
/// Config objects ([`crate::PathConfig`], [`crate::FlagsConfig`], ...) are looked up
/// by type, the first one of each type wins. Missing configs are defaulted.
///
/// ```rust
/// use saphyr_marshal::{load, FlagsConfig, LoadOptions, StringField, Value};
///
/// let options = saphyr_marshal::options! {
///     source_name: "inline.yaml".to_string(),
///     max_depth: 64,
/// };
/// let options = options.with_config(FlagsConfig::new(["release"]));
///
/// let value = load("!if(release) on", &StringField::new(), options).unwrap();
/// assert_eq!(value, Some(Value::String("on".into())));
/// ```
pub struct LoadOptions {
    /// Handlers tried after the built-in ones.
    pub tag_handlers: Vec<Box<dyn TagHandler>>,
    /// Handler mode when set, raise mode otherwise.
    pub error_handler: Option<ErrorHandler>,
    pub configs: Vec<Rc<dyn Any>>,
    /// Nested loads allowed before the node is reported and skipped.
    pub max_depth: usize,
    /// Applied to every composed document, imported files included.
    pub budget: Option<Budget>,
    /// Name of the document in error positions.
    pub source_name: String,
    /// File the document comes from, base of relative path resolution.
    pub location: Option<PathBuf>,
}

impl LoadOptions {
    /// Report errors to `handler` and keep loading, instead of returning the first one.
    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Handler mode with a closure.
    pub fn on_error<F>(self, callback: F) -> Self
    where
        F: FnMut(&Node, ErrorCode, &str) + 'static,
    {
        self.with_error_handler(Rc::new(RefCell::new(callback)))
    }

    pub fn with_config<T: Any>(mut self, config: T) -> Self {
        self.configs.push(Rc::new(config));
        self
    }

    pub fn with_tag_handler(mut self, handler: impl TagHandler + 'static) -> Self {
        self.tag_handlers.push(Box::new(handler));
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_budget(mut self, budget: Option<Budget>) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            tag_handlers: Vec::new(),
            error_handler: None,
            configs: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            budget: Some(Budget::default()),
            source_name: UNKNOWN_SOURCE.to_string(),
            location: None,
        }
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("tag_handlers", &self.tag_handlers.len())
            .field(
                "error_handler",
                &if self.error_handler.is_some() { "set" } else { "none" },
            )
            .field("configs", &self.configs.len())
            .field("max_depth", &self.max_depth)
            .field("budget", &self.budget)
            .field("source_name", &self.source_name)
            .field("location", &self.location)
            .finish()
    }
}
