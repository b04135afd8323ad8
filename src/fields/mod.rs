//! Fields: the unit of loading logic for one shape of value.
//!
//! A field receives the [`LoadingContext`] positioned on its node and returns a
//! [`crate::Value`], or `None` when the node can't be loaded. Tag handlers run
//! before the field sees a node, and the `validate` callback runs after it, both
//! driven by [`LoadingContext::load`].

use std::rc::Rc;

use crate::context::{LoadResult, LoadingContext};
use crate::error::Error;
use crate::validation::ValidateCallback;

mod any;
mod containers;
mod object;
mod path;
mod scalars;

pub use any::AnyField;
pub use containers::{DictField, ListField};
pub use object::ObjectField;
pub use path::PathField;
pub use scalars::{BoolField, EnumField, FloatField, IntField, StringField};

/// Settings shared by every field.
#[derive(Clone, Default)]
pub struct FieldOptions {
    /// Report `MISSING_REQUIRED_FIELD` when an object doesn't set this field.
    pub required: bool,
    /// Called with every successfully loaded value.
    pub validate: Option<ValidateCallback>,
}

impl std::fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldOptions")
            .field("required", &self.required)
            .field("validate", &self.validate.as_ref().map(|_| "set"))
            .finish()
    }
}

pub trait Field {
    fn options(&self) -> &FieldOptions;

    /// Shape-specific loading of the current node.
    ///
    /// Called by [`LoadingContext::load`], never directly: the context applies tag
    /// handlers before and validation after.
    fn load(&self, ctx: &mut LoadingContext<'_>) -> LoadResult;
}

impl<F: Field + ?Sized> Field for Box<F> {
    fn options(&self) -> &FieldOptions {
        (**self).options()
    }

    fn load(&self, ctx: &mut LoadingContext<'_>) -> LoadResult {
        (**self).load(ctx)
    }
}

impl<F: Field + ?Sized> Field for Rc<F> {
    fn options(&self) -> &FieldOptions {
        (**self).options()
    }

    fn load(&self, ctx: &mut LoadingContext<'_>) -> LoadResult {
        (**self).load(ctx)
    }
}

/// Adds the `required()` and `with_validate()` builders to a field holding an
/// `options: FieldOptions` member.
macro_rules! impl_field_options {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $ty {
                /// Mark the field as required in its object.
                pub fn required(mut self) -> Self {
                    self.options.required = true;
                    self
                }

                /// Validate loaded values with `validate`. Values reported invalid become undefined.
                pub fn with_validate<F>(mut self, validate: F) -> Self
                where
                    F: Fn(&mut $crate::ValidationContext<'_, '_>, &$crate::Value) -> Result<(), $crate::Error>
                        + 'static,
                {
                    self.options.validate = Some(std::rc::Rc::new(validate));
                    self
                }
            }
        )*
    };
}

impl_field_options!(
    AnyField,
    BoolField,
    DictField,
    EnumField,
    FloatField,
    IntField,
    ListField,
    ObjectField,
    PathField,
    StringField,
);

/// Text of the current node if it is a scalar, `None` after reporting otherwise.
pub(crate) fn scalar_text(ctx: &mut LoadingContext<'_>) -> Result<Option<String>, Error> {
    if !ctx.expect_scalar()? {
        return Ok(None);
    }
    Ok(ctx
        .current_node()
        .and_then(|node| node.as_scalar())
        .map(str::to_owned))
}

