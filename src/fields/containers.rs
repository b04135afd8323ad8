use std::rc::Rc;

use indexmap::IndexMap;

use crate::context::{LoadResult, LoadingContext};
use crate::fields::{Field, FieldOptions, StringField};
use crate::value::Value;

/// Sequence of items loaded through one item field.
///
/// Items that fail to load are left out: a partial list is a valid result.
#[derive(Clone)]
pub struct ListField {
    pub(crate) options: FieldOptions,
    item: Rc<dyn Field>,
}

impl ListField {
    pub fn new(item: impl Field + 'static) -> Self {
        Self {
            options: FieldOptions::default(),
            item: Rc::new(item),
        }
    }
}

impl Field for ListField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn load(&self, ctx: &mut LoadingContext<'_>) -> LoadResult {
        if !ctx.expect_sequence()? {
            return Ok(None);
        }
        let items: Vec<_> = ctx
            .current_node()
            .and_then(|node| node.as_sequence())
            .map(<[_]>::to_vec)
            .unwrap_or_default();

        let mut values = Vec::with_capacity(items.len());
        for item in items {
            if let Some(value) = ctx.load(&*self.item, item, None)? {
                values.push(value);
            }
        }
        Ok(Some(Value::List(values)))
    }
}

/// Mapping of string keys to values loaded through one item field.
///
/// Pairs whose key or value fail to load are left out. On duplicate keys the last one wins.
#[derive(Clone)]
pub struct DictField {
    pub(crate) options: FieldOptions,
    item: Rc<dyn Field>,
}

impl DictField {
    pub fn new(item: impl Field + 'static) -> Self {
        Self {
            options: FieldOptions::default(),
            item: Rc::new(item),
        }
    }
}

impl Field for DictField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn load(&self, ctx: &mut LoadingContext<'_>) -> LoadResult {
        if !ctx.expect_mapping()? {
            return Ok(None);
        }
        let pairs: Vec<_> = ctx
            .current_node()
            .and_then(|node| node.as_mapping())
            .map(<[_]>::to_vec)
            .unwrap_or_default();

        let key_field = StringField::new();
        let mut values = IndexMap::with_capacity(pairs.len());
        for (key_node, value_node) in pairs {
            let Some(Value::String(key)) = ctx.load(&key_field, key_node, None)? else {
                continue;
            };
            if let Some(value) = ctx.load(&*self.item, value_node, None)? {
                values.insert(key, value);
            }
        }
        Ok(Some(Value::Dict(values)))
    }
}
