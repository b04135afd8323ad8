//! Schema-driven YAML object loading.
//!
//! A document is composed into a tree of [`Node`]s, then loaded through a root
//! [`Field`] describing the expected shape. Tagged nodes (`!import`, `!glob`,
//! `!env`, `!if(FLAG)`, `!first-of`, `!merge` and custom ones) are intercepted by
//! [`TagHandler`]s before fields see them. Objects are declared with the
//! [`Schema`] trait and may extend one another.
//!
//! Errors either stop the load (raise mode, the default) or go to an
//! [`ErrorHandler`] while loading continues, in which case whatever failed
//! is left out of the result.

pub mod budget;
mod compose;
mod context;
mod error;
pub mod fields;
mod loader;
mod location;
mod macros;
#[cfg(feature = "miette")]
pub mod miette;
mod node;
mod options;
mod parse_scalars;
pub mod schema;
mod snippet;
pub mod tag_handlers;
mod tags;
mod validation;
mod value;

pub use budget::{Budget, BudgetBreach};
pub use compose::compose;
pub use context::{DEFAULT_MAX_DEPTH, LoadResult, LoadingContext};
pub use error::{Error, ErrorCode, ErrorCollector, ErrorHandler, Reported};
pub use fields::{
    AnyField, BoolField, DictField, EnumField, Field, FieldOptions, FloatField, IntField, ListField,
    ObjectField, PathField, StringField,
};
pub use loader::{RootField, load, load_as, load_file, load_object, load_reader};
pub use location::Mark;
pub use node::{Node, NodeKind, NodeValue};
pub use options::LoadOptions;
pub use schema::{
    Extends, FieldTypeMismatch, Fields, ObjectConfig, ObjectType, Schema, TypeRegistry, TypeResolver,
    assign,
};
pub use tag_handlers::{
    EnvConfig, EnvHandler, FirstOfHandler, FlagsConfig, GlobHandler, IfHandler, ImportHandler,
    MergeHandler, PathConfig, TagHandler,
};
pub use validation::{ValidateCallback, ValidationContext};
pub use value::{FromValue, Instance, Value};
