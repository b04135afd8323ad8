use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::context::{LoadResult, LoadingContext};
use crate::fields::Field;
use crate::node::{Node, NodeValue};
use crate::tag_handlers::TagHandler;

/// Variable lookup used by `!env`.
///
/// Reads the process environment by default.
#[derive(Clone)]
pub struct EnvConfig {
    lookup: Rc<dyn Fn(&str) -> Option<String>>,
}

impl EnvConfig {
    pub fn from_fn(lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        Self {
            lookup: Rc::new(lookup),
        }
    }

    /// Look variables up in `vars` instead of the process environment.
    pub fn from_map(vars: HashMap<String, String>) -> Self {
        Self::from_fn(move |name| vars.get(name).cloned())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::from_fn(|name| std::env::var(name).ok())
    }
}

impl fmt::Debug for EnvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvConfig").finish_non_exhaustive()
    }
}

/// `!env NAME`: the value of an environment variable, loaded through the field.
///
/// Unset variables load as nothing, without error.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvHandler;

impl TagHandler for EnvHandler {
    fn matches(&self, tag: &str) -> bool {
        tag == "env"
    }

    fn load(&self, ctx: &mut LoadingContext<'_>, field: &dyn Field) -> LoadResult {
        if !ctx.expect_scalar()? {
            return Ok(None);
        }
        let Some(node) = ctx.current_node().cloned() else {
            return Ok(None);
        };
        let name = node.as_scalar().unwrap_or_default();
        let Some(value) = ctx.get_config::<EnvConfig>().get(name) else {
            return Ok(None);
        };

        let value_node = Node::new("", NodeValue::Scalar(value), node.mark().clone());
        ctx.load(field, Rc::new(value_node), None)
    }
}
