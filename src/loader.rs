//! Entry points: compose a document, then load it through a root field.

use std::io::Read;
use std::path::Path;

use encoding_rs_io::DecodeReaderBytes;
use indexmap::IndexMap;
use log::debug;

use crate::compose::compose;
use crate::context::{LoadingContext, LoadResult};
use crate::error::{Error, ErrorCode};
use crate::fields::{BoolField, DictField, Field, FloatField, IntField, ListField, ObjectField, StringField};
use crate::location::Mark;
use crate::options::LoadOptions;
use crate::schema::Schema;
use crate::tag_handlers::builtin_handlers;
use crate::value::FromValue;

/// Load YAML text through `field`.
///
/// Returns `Ok(None)` when the document (or its root) failed to load in handler mode.
/// In raise mode the first error is returned.
///
/// ```rust
/// use saphyr_marshal::{load, IntField, ListField, LoadOptions, Value};
///
/// let field = ListField::new(IntField::new());
/// let value = load("[1, 0x10]", &field, LoadOptions::default()).unwrap();
/// assert_eq!(value, Some(Value::List(vec![Value::Int(1), Value::Int(16)])));
/// ```
pub fn load(source: &str, field: &dyn Field, options: LoadOptions) -> LoadResult {
    let LoadOptions {
        tag_handlers,
        error_handler,
        configs,
        max_depth,
        budget,
        source_name,
        location,
    } = options;

    let root = compose(source, &source_name, budget.clone())?;
    debug!("loading {source_name}");

    let mut handlers = builtin_handlers();
    handlers.extend(tag_handlers);

    let mut ctx = LoadingContext::new(&handlers, error_handler)
        .with_configs(configs)
        .with_max_depth(max_depth)
        .with_budget(budget);
    ctx.load(field, root, location)
}

/// Load an object of schema `T` from the document root.
///
/// ```rust
/// use saphyr_marshal::{Fields, IntField, Schema, Value, FieldTypeMismatch, assign};
///
/// #[derive(Default)]
/// struct Limits {
///     max: i64,
/// }
///
/// impl Schema for Limits {
///     const TYPE_NAME: &'static str = "app.Limits";
///
///     fn fields() -> Fields {
///         Fields::new().with("max", IntField::new())
///     }
///
///     fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldTypeMismatch> {
///         match name {
///             "max" => assign(&mut self.max, value),
///             _ => Ok(()),
///         }
///     }
/// }
///
/// let limits: Limits = saphyr_marshal::load_object("max: 8", Default::default())
///     .unwrap()
///     .unwrap();
/// assert_eq!(limits.max, 8);
/// ```
pub fn load_object<T: Schema>(source: &str, options: LoadOptions) -> Result<Option<T>, Error> {
    let source_name = options.source_name.clone();
    let Some(value) = load(source, &ObjectField::of::<T>(), options)? else {
        return Ok(None);
    };
    let found = value
        .as_object()
        .map(|instance| instance.type_name().to_owned())
        .unwrap_or_else(|| value.kind_name().to_owned());
    match value.into_object::<T>() {
        Some(object) => Ok(Some(object)),
        None => Err(Error::Load {
            code: ErrorCode::TypeResolveError,
            message: format!("Loaded object is {found}, not {}.", T::TYPE_NAME),
            mark: Mark::new(source_name, 1, 1),
        }),
    }
}

/// Rust types with a natural root field.
pub trait RootField: FromValue {
    fn root_field() -> Box<dyn Field>;
}

impl RootField for bool {
    fn root_field() -> Box<dyn Field> {
        Box::new(BoolField::new())
    }
}

impl RootField for i64 {
    fn root_field() -> Box<dyn Field> {
        Box::new(IntField::new())
    }
}

impl RootField for f64 {
    fn root_field() -> Box<dyn Field> {
        Box::new(FloatField::new())
    }
}

impl RootField for String {
    fn root_field() -> Box<dyn Field> {
        Box::new(StringField::new())
    }
}

impl<T: RootField> RootField for Vec<T> {
    fn root_field() -> Box<dyn Field> {
        Box::new(ListField::new(T::root_field()))
    }
}

impl<T: RootField> RootField for IndexMap<String, T> {
    fn root_field() -> Box<dyn Field> {
        Box::new(DictField::new(T::root_field()))
    }
}

/// Load a document whose root field follows from `T`.
///
/// ```rust
/// use saphyr_marshal::{load_as, LoadOptions};
///
/// let names: Vec<String> = load_as("[a, b]", LoadOptions::default()).unwrap().unwrap();
/// assert_eq!(names, ["a", "b"]);
/// ```
pub fn load_as<T: RootField>(source: &str, options: LoadOptions) -> Result<Option<T>, Error> {
    let field = T::root_field();
    Ok(load(source, &field, options)?.and_then(T::from_value))
}

/// Load a file. The document is named after `path`, which is also the base of
/// relative imports.
pub fn load_file(path: impl AsRef<Path>, field: &dyn Field, options: LoadOptions) -> LoadResult {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|cause| Error::IOError {
        path: Some(path.to_path_buf()),
        cause,
    })?;
    let text = decode(file).map_err(|cause| Error::IOError {
        path: Some(path.to_path_buf()),
        cause,
    })?;
    let options = options
        .with_source_name(path.display().to_string())
        .with_location(path);
    load(&text, field, options)
}

/// Load from a reader in any Unicode encoding (UTF-8 by default, UTF-16 with a BOM).
pub fn load_reader(reader: impl Read, field: &dyn Field, options: LoadOptions) -> LoadResult {
    let text = decode(reader).map_err(|cause| Error::IOError { path: None, cause })?;
    load(&text, field, options)
}

fn decode(reader: impl Read) -> std::io::Result<String> {
    let mut text = String::new();
    DecodeReaderBytes::new(reader).read_to_string(&mut text)?;
    Ok(text)
}
