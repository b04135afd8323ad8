//! The loading engine: node stack, tag-handler dispatch, error routing and
//! the call-scoped configuration registry.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{trace, warn};
use smallvec::SmallVec;

use crate::budget::Budget;
use crate::compose::compose;
use crate::error::{Error, ErrorCode, ErrorHandler};
use crate::fields::Field;
use crate::node::{Node, NodeKind};
use crate::tag_handlers::TagHandler;
use crate::tags::TAG_SIGIL;
use crate::validation::ValidationContext;
use crate::value::Value;

/// Outcome of loading one node.
///
/// `Ok(None)` is the undefined result: this (sub)load failed and nothing must be
/// stored in the parent. `Err` only happens in raise mode (no error handler).
pub type LoadResult = Result<Option<Value>, Error>;

/// Default limit on nested loads, see [`crate::LoadOptions::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 512;

struct Frame {
    node: Rc<Node>,
    location: Option<PathBuf>,
}

/// Per-call state of one `load` invocation.
///
/// Not thread-safe and not reusable: every top-level load builds its own.
pub struct LoadingContext<'a> {
    handlers: &'a [Box<dyn TagHandler>],
    error_handler: Option<ErrorHandler>,
    configs: Vec<Rc<dyn Any>>,
    stack: SmallVec<[Frame; 16]>,
    max_depth: usize,
    budget: Option<Budget>,
}

impl<'a> LoadingContext<'a> {
    pub fn new(handlers: &'a [Box<dyn TagHandler>], error_handler: Option<ErrorHandler>) -> Self {
        Self {
            handlers,
            error_handler,
            configs: Vec::new(),
            stack: SmallVec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            budget: None,
        }
    }

    pub(crate) fn with_configs(mut self, configs: Vec<Rc<dyn Any>>) -> Self {
        self.configs = configs;
        self
    }

    pub(crate) fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub(crate) fn with_budget(mut self, budget: Option<Budget>) -> Self {
        self.budget = budget;
        self
    }

    /// Load `node` through `field`, honoring tag handlers.
    ///
    /// `location` is the file the node comes from, if it differs from its parent's.
    ///
    /// # Panics
    ///
    /// If `node` is the node currently being loaded. A tag handler handing its own
    /// input back to the context would otherwise recurse forever.
    pub fn load(
        &mut self,
        field: &dyn Field,
        node: Rc<Node>,
        location: Option<PathBuf>,
    ) -> LoadResult {
        if let Some(top) = self.stack.last() {
            assert!(
                !Rc::ptr_eq(&top.node, &node),
                "node at {} is already being loaded",
                node.mark()
            );
        }
        self.with_frame(Frame { node, location }, |ctx| ctx.dispatch(field))
    }

    fn with_frame<R>(&mut self, frame: Frame, f: impl FnOnce(&mut Self) -> R) -> R {
        trace!("push {} {:?}", frame.node.mark(), frame.node.tag());
        self.stack.push(frame);
        let result = f(self);
        self.stack.pop();
        result
    }

    fn dispatch(&mut self, field: &dyn Field) -> LoadResult {
        if self.stack.len() > self.max_depth {
            self.error(
                ErrorCode::ValueError,
                format!("Maximum nesting depth of {} exceeded.", self.max_depth),
            )?;
            return Ok(None);
        }

        let Some(node) = self.current_node().cloned() else {
            return Ok(None);
        };
        match self.find_handler(node.tag())? {
            Some(handler) => {
                trace!("tag {} handled at {}", node.tag(), node.mark());
                handler.load(self, field)
            }
            None => self.load_field(field),
        }
    }

    fn find_handler(&mut self, tag: &str) -> Result<Option<&'a dyn TagHandler>, Error> {
        let Some(name) = tag.strip_prefix(TAG_SIGIL) else {
            return Ok(None);
        };

        let handlers = self.handlers;
        let mut matching = handlers.iter().filter(|h| h.matches(name));
        let first = matching.next();
        if first.is_some() && matching.next().is_some() {
            warn!("several tag handlers match {tag}, using the first one");
            self.error(
                ErrorCode::MultipleMatchingHandlers,
                format!("Got multiple matching handlers for tag {tag}."),
            )?;
        }
        Ok(first.map(|handler| handler.as_ref()))
    }

    /// Field dispatch with the shared validate wrapper.
    fn load_field(&mut self, field: &dyn Field) -> LoadResult {
        let Some(value) = field.load(self)? else {
            return Ok(None);
        };

        let Some(validate) = field.options().validate.clone() else {
            return Ok(Some(value));
        };
        let mut validation = ValidationContext::new(self);
        validate(&mut validation, &value)?;
        if validation.has_error() {
            return Ok(None);
        }
        Ok(Some(value))
    }

    /// Node being loaded, `None` outside of a [`LoadingContext::load`] call.
    pub fn current_node(&self) -> Option<&Rc<Node>> {
        self.stack.last().map(|frame| &frame.node)
    }

    /// Innermost file location set on the stack.
    pub fn current_location(&self) -> Option<&Path> {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| frame.location.as_deref())
    }

    /// Registered configuration of type `T`, registering a default one if there is none.
    pub fn get_config<T: Any + Default>(&mut self) -> Rc<T> {
        if let Some(config) = self
            .configs
            .iter()
            .find_map(|config| Rc::clone(config).downcast::<T>().ok())
        {
            return config;
        }
        let config = Rc::new(T::default());
        self.configs.push(config.clone());
        config
    }

    pub fn expect_scalar(&mut self) -> Result<bool, Error> {
        self.expect_kind(NodeKind::Scalar)
    }

    pub fn expect_sequence(&mut self) -> Result<bool, Error> {
        self.expect_kind(NodeKind::Sequence)
    }

    pub fn expect_mapping(&mut self) -> Result<bool, Error> {
        self.expect_kind(NodeKind::Mapping)
    }

    fn expect_kind(&mut self, kind: NodeKind) -> Result<bool, Error> {
        let actual = self.current_node().map(|node| node.kind());
        if actual == Some(kind) {
            return Ok(true);
        }
        self.error(
            ErrorCode::UnexpectedNodeType,
            format!("Expected a {} value.", kind.describe()),
        )?;
        Ok(false)
    }

    /// Report an error on the current node.
    ///
    /// With an error handler installed the handler is called and `Ok(())` is returned,
    /// so loading goes on. Without one, the error is returned and must be propagated.
    pub fn error(&mut self, code: ErrorCode, message: impl Into<String>) -> Result<(), Error> {
        let message = message.into();
        let node = match self.current_node() {
            Some(node) => node.clone(),
            None => Rc::new(Node::scalar("")),
        };
        match &self.error_handler {
            Some(handler) => {
                (*handler.borrow_mut())(&node, code, &message);
                Ok(())
            }
            None => Err(Error::load(code, message, &node)),
        }
    }

    /// Compose YAML text read by a tag handler, with this load's budget.
    pub(crate) fn compose(&self, source: &str, name: &str) -> Result<Rc<Node>, Error> {
        compose(source, name, self.budget.clone())
    }
}
