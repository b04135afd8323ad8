//! Object schemas.
//!
//! A type becomes loadable by implementing [`Schema`]: it declares its own fields,
//! receives loaded values through [`Schema::set_field`] and may hook validation and
//! post-load processing. Inheritance is expressed by composition: a type embedding
//! its parent implements [`Extends`] and builds its [`ObjectType`] with
//! [`ObjectType::derived`], which chains the parent's fields and hooks before its own.
//!
//! ```rust
//! use saphyr_marshal::{
//!     Extends, FieldTypeMismatch, Fields, IntField, ObjectType, Schema, StringField, Value,
//!     assign,
//! };
//!
//! #[derive(Default)]
//! struct Base {
//!     name: String,
//! }
//!
//! impl Schema for Base {
//!     const TYPE_NAME: &'static str = "shapes.Base";
//!
//!     fn fields() -> Fields {
//!         Fields::new().with("name", StringField::new().required())
//!     }
//!
//!     fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldTypeMismatch> {
//!         match name {
//!             "name" => assign(&mut self.name, value),
//!             _ => Ok(()),
//!         }
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Square {
//!     base: Base,
//!     side: i64,
//! }
//!
//! impl Schema for Square {
//!     const TYPE_NAME: &'static str = "shapes.Square";
//!
//!     fn fields() -> Fields {
//!         Fields::new().with("side", IntField::new())
//!     }
//!
//!     fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldTypeMismatch> {
//!         match name {
//!             "side" => assign(&mut self.side, value),
//!             _ => Ok(()),
//!         }
//!     }
//!
//!     fn object_type() -> ObjectType {
//!         ObjectType::derived::<Self, Base>()
//!     }
//! }
//!
//! impl Extends<Base> for Square {
//!     fn base(&self) -> &Base {
//!         &self.base
//!     }
//!
//!     fn base_mut(&mut self) -> &mut Base {
//!         &mut self.base
//!     }
//! }
//!
//! let square: Square = saphyr_marshal::load_object("{name: sq, side: 3}", Default::default())
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(square.base.name, "sq");
//! assert_eq!(square.side, 3);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::Error;
use crate::fields::Field;
use crate::tags::DEFAULT_TYPE_TAG;
use crate::validation::ValidationContext;
use crate::value::{FromValue, Value};

/// A type that can be loaded from a mapping node.
pub trait Schema: Any + Default {
    /// Fully qualified name, as used by `!type:` tags (`package.module.Type`).
    const TYPE_NAME: &'static str;

    /// Fields declared by this type itself, not by its parents.
    fn fields() -> Fields;

    /// Store a loaded value. Only called for fields declared by this type.
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldTypeMismatch>;

    /// Object-level validation, run after every field is set.
    fn validate(&self, _ctx: &mut ValidationContext<'_, '_>) -> Result<(), Error> {
        Ok(())
    }

    /// Run on valid objects before they are returned.
    fn post_load(&mut self) {}

    /// Loading descriptor. Override with [`ObjectType::derived`] for types extending another.
    fn object_type() -> ObjectType {
        ObjectType::of::<Self>()
    }
}

/// Composition-based inheritance: `Self` embeds a `P`.
pub trait Extends<P: Schema>: Schema {
    fn base(&self) -> &P;
    fn base_mut(&mut self) -> &mut P;
}

/// Ordered field declarations of one type.
#[derive(Clone, Default)]
pub struct Fields {
    entries: Vec<(String, Rc<dyn Field>)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, field: impl Field + 'static) -> Self {
        self.entries.push((name.into(), Rc::new(field)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<dyn Field>)> {
        self.entries.iter().map(|(name, field)| (name.as_str(), field))
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(name, _)| name))
            .finish()
    }
}

/// A loaded value couldn't be stored in the Rust field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldTypeMismatch {
    pub found: &'static str,
}

impl fmt::Display for FieldTypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "can't store a {} value in this field", self.found)
    }
}

impl std::error::Error for FieldTypeMismatch {}

/// Convert `value` and store it in `slot`.
pub fn assign<T: FromValue>(slot: &mut T, value: Value) -> Result<(), FieldTypeMismatch> {
    let found = value.kind_name();
    *slot = T::from_value(value).ok_or(FieldTypeMismatch { found })?;
    Ok(())
}

/// Implements [`FromValue`] for schema types, so they can be extracted from
/// object values (`Option<T>`, `Vec<T>`, ...).
#[macro_export]
macro_rules! object_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::FromValue for $ty {
                fn from_value(value: $crate::Value) -> Option<Self> {
                    value.into_object::<$ty>()
                }
            }
        )*
    };
}

type Erased = dyn Any;

#[derive(Clone, Copy)]
struct Upcast {
    get: fn(&Erased) -> Option<&Erased>,
    get_mut: fn(&mut Erased) -> Option<&mut Erased>,
}

impl Upcast {
    fn of<T: Extends<P>, P: Schema>() -> Self {
        Self {
            get: |obj| obj.downcast_ref::<T>().map(|t| t.base() as &Erased),
            get_mut: |obj| obj.downcast_mut::<T>().map(|t| t.base_mut() as &mut Erased),
        }
    }
}

/// Hooks and fields of one type of an inheritance chain.
#[derive(Clone)]
struct Level {
    name: &'static str,
    /// Steps from the most derived object down to this level's type.
    path: Vec<Upcast>,
    fields: fn() -> Fields,
    set_field: fn(&mut Erased, &str, Value) -> Result<(), FieldTypeMismatch>,
    validate: fn(&Erased, &mut ValidationContext<'_, '_>) -> Result<(), Error>,
    post_load: fn(&mut Erased),
}

impl Level {
    fn of<T: Schema>() -> Self {
        Self {
            name: T::TYPE_NAME,
            path: Vec::new(),
            fields: T::fields,
            set_field: |obj, name, value| match obj.downcast_mut::<T>() {
                Some(obj) => obj.set_field(name, value),
                None => Ok(()),
            },
            validate: |obj, ctx| match obj.downcast_ref::<T>() {
                Some(obj) => obj.validate(ctx),
                None => Ok(()),
            },
            post_load: |obj| {
                if let Some(obj) = obj.downcast_mut::<T>() {
                    obj.post_load();
                }
            },
        }
    }

    fn reach<'o>(&self, mut obj: &'o Erased) -> Option<&'o Erased> {
        for step in &self.path {
            obj = (step.get)(obj)?;
        }
        Some(obj)
    }

    fn reach_mut<'o>(&self, mut obj: &'o mut Erased) -> Option<&'o mut Erased> {
        for step in &self.path {
            obj = (step.get_mut)(obj)?;
        }
        Some(obj)
    }
}

/// Loading descriptor of a schema type: how to create it and its inheritance chain.
#[derive(Clone)]
pub struct ObjectType {
    name: &'static str,
    create: fn() -> Box<Erased>,
    /// Base first, `name` last.
    levels: Vec<Level>,
}

impl ObjectType {
    /// Descriptor of a type without parent.
    pub fn of<T: Schema>() -> Self {
        Self {
            name: T::TYPE_NAME,
            create: || Box::new(T::default()) as Box<Erased>,
            levels: vec![Level::of::<T>()],
        }
    }

    /// Descriptor of `T`, extending `P` (and transitively `P`'s parents).
    pub fn derived<T: Extends<P>, P: Schema>() -> Self {
        let upcast = Upcast::of::<T, P>();
        let mut levels: Vec<Level> = P::object_type()
            .levels
            .into_iter()
            .map(|mut level| {
                level.path.insert(0, upcast);
                level
            })
            .collect();
        levels.push(Level::of::<T>());
        Self {
            name: T::TYPE_NAME,
            create: || Box::new(T::default()) as Box<Erased>,
            levels,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type names of the chain, base first.
    pub fn chain(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.levels.iter().map(|level| level.name)
    }

    pub(crate) fn create(&self) -> Box<Erased> {
        (self.create)()
    }

    pub(crate) fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Own fields of the level at `index`.
    pub(crate) fn level_fields(&self, index: usize) -> Fields {
        self.levels
            .get(index)
            .map(|level| (level.fields)())
            .unwrap_or_default()
    }

    pub(crate) fn set_field(
        &self,
        obj: &mut Erased,
        level: usize,
        name: &str,
        value: Value,
    ) -> Result<(), FieldTypeMismatch> {
        let Some(level) = self.levels.get(level) else {
            return Ok(());
        };
        match level.reach_mut(obj) {
            Some(target) => (level.set_field)(target, name, value),
            None => Ok(()),
        }
    }

    /// Run every level's `validate` hook, base first.
    pub(crate) fn validate(
        &self,
        obj: &Erased,
        ctx: &mut ValidationContext<'_, '_>,
    ) -> Result<(), Error> {
        for level in &self.levels {
            if let Some(target) = level.reach(obj) {
                (level.validate)(target, ctx)?;
            }
        }
        Ok(())
    }

    /// Run every level's `post_load` hook, base first.
    pub(crate) fn post_load(&self, obj: &mut Erased) {
        for level in &self.levels {
            if let Some(target) = level.reach_mut(obj) {
                (level.post_load)(target);
            }
        }
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType")
            .field("name", &self.name)
            .field("chain", &self.chain().collect::<Vec<_>>())
            .finish()
    }
}

/// A declared field and the index of the chain level that owns it.
#[derive(Clone)]
pub struct FieldSlot {
    pub field: Rc<dyn Field>,
    pub level: usize,
}

/// Field map of a type, in declaration order.
pub type FieldMap = IndexMap<String, FieldSlot>;

/// Computes the field map of an object type.
pub trait FieldsResolver {
    fn resolve(&self, object_type: &ObjectType) -> FieldMap;
}

/// Default resolver: parent fields first, then each derived level's own fields.
/// A derived level redeclaring a name takes it over.
#[derive(Clone, Copy, Debug, Default)]
pub struct InheritedFields;

impl FieldsResolver for InheritedFields {
    fn resolve(&self, object_type: &ObjectType) -> FieldMap {
        let mut map = FieldMap::new();
        for level in 0..object_type.level_count() {
            for (name, field) in object_type.level_fields(level).iter() {
                map.insert(
                    name.to_owned(),
                    FieldSlot {
                        field: field.clone(),
                        level,
                    },
                );
            }
        }
        map
    }
}

/// Why a type name couldn't be resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeResolveFailure {
    ModuleNotFound(String),
    SymbolNotFound { module: String, symbol: String },
    NotAType(String),
}

impl fmt::Display for TypeResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeResolveFailure::ModuleNotFound(module) => write!(f, "Can't find module {module}."),
            TypeResolveFailure::SymbolNotFound { module, symbol } => {
                write!(f, "Can't find symbol {symbol} in module {module}.")
            }
            TypeResolveFailure::NotAType(name) => write!(f, "{name} is not a type."),
        }
    }
}

/// Resolves the fully qualified names of `!type:` tags.
pub trait TypeResolver {
    fn resolve(&self, name: &str) -> Result<ObjectType, TypeResolveFailure>;
}

/// Registry of schema types by fully qualified name.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, ObjectType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Schema>(&mut self) -> &mut Self {
        let object_type = T::object_type();
        self.types.insert(object_type.name().to_owned(), object_type);
        self
    }

    pub fn with<T: Schema>(mut self) -> Self {
        self.register::<T>();
        self
    }

    pub fn get(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name)
    }

    fn has_module(&self, module: &str) -> bool {
        self.types.keys().any(|name| {
            name.strip_prefix(module)
                .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve(&self, name: &str) -> Result<ObjectType, TypeResolveFailure> {
        if let Some(object_type) = self.types.get(name) {
            return Ok(object_type.clone());
        }
        if self.has_module(name) {
            return Err(TypeResolveFailure::NotAType(name.to_owned()));
        }
        let (module, symbol) = name.rsplit_once('.').unwrap_or(("", name));
        if self.has_module(module) {
            Err(TypeResolveFailure::SymbolNotFound {
                module: module.to_owned(),
                symbol: symbol.to_owned(),
            })
        } else {
            Err(TypeResolveFailure::ModuleNotFound(module.to_owned()))
        }
    }
}

/// Configuration of object loading, read through the loading context's config registry.
#[derive(Clone)]
pub struct ObjectConfig {
    pub type_resolver: Rc<dyn TypeResolver>,
    pub fields_resolver: Rc<dyn FieldsResolver>,
    pub type_tag: String,
}

impl ObjectConfig {
    pub fn with_types(mut self, registry: TypeRegistry) -> Self {
        self.type_resolver = Rc::new(registry);
        self
    }
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            type_resolver: Rc::new(TypeRegistry::default()),
            fields_resolver: Rc::new(InheritedFields),
            type_tag: DEFAULT_TYPE_TAG.to_owned(),
        }
    }
}

impl fmt::Debug for ObjectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectConfig")
            .field("type_tag", &self.type_tag)
            .finish_non_exhaustive()
    }
}
