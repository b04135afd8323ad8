//! Values produced by fields.
//!
//! Loading is dynamic: every field yields a [`Value`], and typed objects receive
//! their field values through [`crate::Schema::set_field`], where [`FromValue`]
//! turns them back into Rust types.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;

/// A successfully loaded value. A failed load is represented by `None`
/// in [`crate::LoadResult`], never by a `Value`.
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Path(PathBuf),
    List(Vec<Value>),
    Dict(IndexMap<String, Value>),
    Object(Instance),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Path(_) => "path",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Dict(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Convert into a Rust type, `None` if the shapes don't match.
    pub fn extract<T: FromValue>(self) -> Option<T> {
        T::from_value(self)
    }

    /// Take the loaded object out as a `T`.
    pub fn into_object<T: Any>(self) -> Option<T> {
        match self {
            Value::Object(obj) => obj.downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Dict(map) => f.debug_tuple("Dict").field(map).finish(),
            Value::Object(obj) => f.debug_tuple("Object").field(obj).finish(),
        }
    }
}

/// Objects never compare equal: they carry no structural equality.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Path(a), Value::Path(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            _ => false,
        }
    }
}

/// Flow-style rendering, used by the command line tool.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Path(p) => write!(f, "{}", p.display()),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Dict(map) => {
                f.write_str("{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }
            Value::Object(obj) => write!(f, "!type:{} {{..}}", obj.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<PathBuf> for Value {
    fn from(v: PathBuf) -> Self {
        Value::Path(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// A loaded object of a schema type, type-erased.
pub struct Instance {
    type_name: String,
    inner: Box<dyn Any>,
}

impl Instance {
    pub(crate) fn new(type_name: impl Into<String>, inner: Box<dyn Any>) -> Self {
        Self {
            type_name: type_name.into(),
            inner,
        }
    }

    /// Fully qualified schema name of the concrete type (`pkg.module.Type`).
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.inner.downcast_mut::<T>()
    }

    /// Take the object out, or give the instance back if it isn't a `T`.
    pub fn downcast<T: Any>(self) -> Result<T, Instance> {
        let type_name = self.type_name;
        match self.inner.downcast::<T>() {
            Ok(obj) => Ok(*obj),
            Err(inner) => Err(Instance { type_name, inner }),
        }
    }

    pub(crate) fn as_any(&self) -> &dyn Any {
        &*self.inner
    }

    pub(crate) fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut *self.inner
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Conversion from a loaded [`Value`] into a Rust type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

macro_rules! from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl FromValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(x) => Some(x),
            Value::Int(i) => Some(i as f64),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Option<Self> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for PathBuf {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Path(p) => Some(p),
            Value::String(s) => Some(PathBuf::from(s)),
            _ => None,
        }
    }
}

impl FromValue for Instance {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Option<Self> {
        T::from_value(value).map(Some)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Dict(map) => map
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Dict(map) => map
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Dict(map) => map
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i64,
    }

    #[test]
    fn extract_nested_containers() {
        let mut map = IndexMap::new();
        map.insert("a".to_owned(), Value::from(vec![1i64, 2]));
        let value = Value::Dict(map);

        let got: BTreeMap<String, Vec<i32>> = value.extract().expect("convertible");
        assert_eq!(got.get("a"), Some(&vec![1, 2]));
    }

    #[test]
    fn extract_rejects_mismatched_shapes() {
        assert_eq!(Value::from("x").extract::<i64>(), None);
        assert_eq!(Value::Int(300).extract::<u8>(), None);
        assert_eq!(Value::from(vec!["a"]).extract::<Vec<bool>>(), None);
    }

    #[test]
    fn object_downcast_roundtrip() {
        let value = Value::Object(Instance::new("geo.Point", Box::new(Point { x: 3 })));
        assert_eq!(value.as_object().map(Instance::type_name), Some("geo.Point"));
        assert_eq!(value.into_object::<Point>(), Some(Point { x: 3 }));
    }

    #[test]
    fn objects_never_compare_equal() {
        let a = Value::Object(Instance::new("geo.Point", Box::new(Point { x: 1 })));
        let b = Value::Object(Instance::new("geo.Point", Box::new(Point { x: 1 })));
        assert_ne!(a, b);
    }

    #[test]
    fn display_renders_flow_style() {
        let mut map = IndexMap::new();
        map.insert("k".to_owned(), Value::from(vec!["a", "b"]));
        map.insert("n".to_owned(), Value::Int(2));
        assert_eq!(Value::Dict(map).to_string(), "{k: [a, b], n: 2}");
    }
}
