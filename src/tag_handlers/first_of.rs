use crate::context::{LoadResult, LoadingContext};
use crate::fields::Field;
use crate::tag_handlers::TagHandler;

/// `!first-of [a, b, ...]`: the first item that loads successfully.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstOfHandler;

impl TagHandler for FirstOfHandler {
    fn matches(&self, tag: &str) -> bool {
        tag == "first-of"
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

        for item in items {
            if let Some(value) = ctx.load(field, item, None)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}
