use indexmap::IndexMap;

use crate::context::{LoadResult, LoadingContext};
use crate::fields::{Field, FieldOptions, StringField};
use crate::node::NodeValue;
use crate::value::Value;

/// Untyped loading: scalars become strings, sequences lists and mappings dicts.
///
/// Tags are honored at every level, so documents using `!import` or `!merge` can
/// be resolved without a schema.
#[derive(Clone, Debug, Default)]
pub struct AnyField {
    pub(crate) options: FieldOptions,
}

impl AnyField {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for AnyField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn load(&self, ctx: &mut LoadingContext<'_>) -> LoadResult {
        let Some(node) = ctx.current_node().cloned() else {
            return Ok(None);
        };
        // Children don't inherit this field's validate callback.
        let item = AnyField::new();
        match node.value() {
            NodeValue::Scalar(text) => Ok(Some(Value::String(text.clone()))),
            NodeValue::Sequence(items) => {
                let mut values = Vec::with_capacity(items.len());
                for child in items {
                    if let Some(value) = ctx.load(&item, child.clone(), None)? {
                        values.push(value);
                    }
                }
                Ok(Some(Value::List(values)))
            }
            NodeValue::Mapping(pairs) => {
                let key_field = StringField::new();
                let mut values = IndexMap::with_capacity(pairs.len());
                for (key_node, value_node) in pairs {
                    let Some(Value::String(key)) = ctx.load(&key_field, key_node.clone(), None)?
                    else {
                        continue;
                    };
                    if let Some(value) = ctx.load(&item, value_node.clone(), None)? {
                        values.insert(key, value);
                    }
                }
                Ok(Some(Value::Dict(values)))
            }
        }
    }
}
