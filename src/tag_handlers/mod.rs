//! Tag handlers: interceptors for tagged nodes.
//!
//! When a node carries a `!tag`, the loading context looks for the handler
//! matching the tag name (sigil stripped) and hands it the node and the field
//! instead of loading the field directly. A handler may produce the value itself,
//! or rewrite the node and hand it back to [`LoadingContext::load`].

use crate::context::{LoadResult, LoadingContext};
use crate::fields::Field;

mod conditional;
mod env;
mod first_of;
mod merge;
mod paths;

pub use conditional::{FlagsConfig, IfHandler};
pub use env::{EnvConfig, EnvHandler};
pub use first_of::FirstOfHandler;
pub use merge::MergeHandler;
pub use paths::{GlobHandler, ImportHandler, PathConfig};

pub trait TagHandler {
    /// Whether this handler applies to `tag`, given without its leading `!`.
    fn matches(&self, tag: &str) -> bool;

    /// Load the current node through `field`.
    fn load(&self, ctx: &mut LoadingContext<'_>, field: &dyn Field) -> LoadResult;
}

/// The handlers every `load` call starts with: `!import`, `!try-import`, `!glob`,
/// `!env`, `!if(FLAG)`, `!first-of` and `!merge`.
pub fn builtin_handlers() -> Vec<Box<dyn TagHandler>> {
    vec![
        Box::new(ImportHandler),
        Box::new(GlobHandler),
        Box::new(EnvHandler),
        Box::new(IfHandler),
        Box::new(FirstOfHandler),
        Box::new(MergeHandler),
    ]
}
