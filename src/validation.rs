use std::rc::Rc;

use crate::context::LoadingContext;
use crate::error::{Error, ErrorCode};
use crate::node::Node;
use crate::value::Value;

/// Field-level validation callback, see [`crate::FieldOptions::validate`].
pub type ValidateCallback = Rc<dyn Fn(&mut ValidationContext<'_, '_>, &Value) -> Result<(), Error>>;

/// Wrapper around the loading context handed to validation callbacks and
/// [`crate::Schema::validate`] hooks.
///
/// Any call to [`ValidationContext::error`] marks the validated value as invalid.
pub struct ValidationContext<'c, 'a> {
    context: &'c mut LoadingContext<'a>,
    has_error: bool,
}

impl<'c, 'a> ValidationContext<'c, 'a> {
    pub(crate) fn new(context: &'c mut LoadingContext<'a>) -> Self {
        Self {
            context,
            has_error: false,
        }
    }

    /// Report a `VALIDATION_ERROR` on the node being validated.
    pub fn error(&mut self, message: impl Into<String>) -> Result<(), Error> {
        self.has_error = true;
        self.context.error(ErrorCode::ValidationError, message)
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn current_node(&self) -> Option<&Rc<Node>> {
        self.context.current_node()
    }

    pub fn context(&mut self) -> &mut LoadingContext<'a> {
        &mut *self.context
    }
}
