use std::path::PathBuf;

use crate::context::{LoadResult, LoadingContext};
use crate::error::ErrorCode;
use crate::fields::{Field, FieldOptions, scalar_text};
use crate::value::Value;

/// Filesystem path.
///
/// A relative path that doesn't exist as written is taken relative to the
/// directory of the file being loaded.
#[derive(Clone, Debug)]
pub struct PathField {
    pub(crate) options: FieldOptions,
    must_exist: bool,
}

impl Default for PathField {
    fn default() -> Self {
        Self {
            options: FieldOptions::default(),
            must_exist: true,
        }
    }
}

impl PathField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a `VALIDATION_ERROR` if the resolved path doesn't exist. Default: true.
    pub fn with_must_exist(mut self, must_exist: bool) -> Self {
        self.must_exist = must_exist;
        self
    }
}

impl Field for PathField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn load(&self, ctx: &mut LoadingContext<'_>) -> LoadResult {
        let Some(text) = scalar_text(ctx)? else {
            return Ok(None);
        };

        let mut path = PathBuf::from(text);
        if !path.is_absolute() && !path.exists() {
            if let Some(parent) = ctx.current_location().and_then(|location| location.parent()) {
                path = parent.join(path);
            }
        }

        if self.must_exist && !path.exists() {
            ctx.error(
                ErrorCode::ValidationError,
                format!("Cannot find path {}.", path.display()),
            )?;
            return Ok(None);
        }
        Ok(Some(Value::Path(path)))
    }
}
