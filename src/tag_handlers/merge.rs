use crate::context::{LoadResult, LoadingContext};
use crate::error::ErrorCode;
use crate::fields::Field;
use crate::tag_handlers::TagHandler;
use crate::value::Value;

/// `!merge [a, b, ...]`: loads every item through the field and merges the results.
///
/// Dicts are united, later keys overwriting earlier ones. Lists are concatenated.
#[derive(Clone, Copy, Debug, Default)]
pub struct MergeHandler;

impl TagHandler for MergeHandler {
    fn matches(&self, tag: &str) -> bool {
        tag == "merge"
    }

    fn load(&self, ctx: &mut LoadingContext<'_>, field: &dyn Field) -> LoadResult {
        if !ctx.expect_sequence()? {
            return Ok(None);
        }
        let items: Vec<_> = ctx
            .current_node()
            .and_then(|node| node.as_sequence())
            .map(<[_]>::to_vec)
            .unwrap_or_default();

        let mut merged: Option<Value> = None;
        for item in items {
            let Some(value) = ctx.load(field, item, None)? else {
                continue;
            };
            merged = match (merged.take(), value) {
                (None, value @ (Value::Dict(_) | Value::List(_))) => Some(value),
                (Some(Value::Dict(mut into)), Value::Dict(from)) => {
                    into.extend(from);
                    Some(Value::Dict(into))
                }
                (Some(Value::List(mut into)), Value::List(from)) => {
                    into.extend(from);
                    Some(Value::List(into))
                }
                (merged, value) => {
                    let expected = merged.as_ref().map_or("dict or list", Value::kind_name);
                    ctx.error(
                        ErrorCode::ValueError,
                        format!("Can't merge a {}, expected a {expected}.", value.kind_name()),
                    )?;
                    merged
                }
            };
        }
        Ok(merged)
    }
}
