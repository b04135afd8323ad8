use std::collections::BTreeSet;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::context::{LoadResult, LoadingContext};
use crate::fields::Field;
use crate::tag_handlers::TagHandler;

/// Flags defined for a load, tested by `!if(FLAG)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagsConfig {
    pub flags: BTreeSet<String>,
}

impl FlagsConfig {
    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: flags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_defined(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }
}

/// `!if(FLAG) value`: loads the untagged value when `FLAG` is defined in
/// [`FlagsConfig`], and nothing otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct IfHandler;

fn flag_of(tag: &str) -> Option<&str> {
    let flag = tag.strip_prefix("if(")?.strip_suffix(')')?;
    flag.chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '|')
        .then_some(flag)
}

impl TagHandler for IfHandler {
    fn matches(&self, tag: &str) -> bool {
        flag_of(tag).is_some()
    }

    fn load(&self, ctx: &mut LoadingContext<'_>, field: &dyn Field) -> LoadResult {
        let Some(node) = ctx.current_node().cloned() else {
            return Ok(None);
        };
        let defined = node
            .tag()
            .strip_prefix(crate::tags::TAG_SIGIL)
            .and_then(flag_of)
            .is_some_and(|flag| ctx.get_config::<FlagsConfig>().is_defined(flag));
        if !defined {
            return Ok(None);
        }
        ctx.load(field, Rc::new(node.retagged("")), None)
    }
}
