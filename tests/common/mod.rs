#![allow(dead_code)]

use saphyr_marshal::{
    ErrorCollector, ErrorCode, Field, LoadOptions, LoadResult, LoadingContext, TagHandler, Value,
    load,
};

/// `!fail`: never loads anything.
pub struct FailHandler;

impl TagHandler for FailHandler {
    fn matches(&self, tag: &str) -> bool {
        tag == "fail"
    }

    fn load(&self, _ctx: &mut LoadingContext<'_>, _field: &dyn Field) -> LoadResult {
        Ok(None)
    }
}

/// Load in handler mode with `!fail` installed, returning the value and every error.
pub fn check_load(yaml: &str, field: &dyn Field, options: LoadOptions) -> (Option<Value>, ErrorCollector) {
    let errors = ErrorCollector::new();
    let options = options
        .with_tag_handler(FailHandler)
        .with_error_handler(errors.handler());
    let value = load(yaml, field, options).expect("handler mode doesn't raise");
    (value, errors)
}

/// Load expecting success without any reported error.
pub fn load_ok(yaml: &str, field: &dyn Field, options: LoadOptions) -> Value {
    let (value, errors) = check_load(yaml, field, options);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    value.expect("value is defined")
}

/// Load expecting `code` to be reported (once) and the result to be undefined.
pub fn load_err(yaml: &str, field: &dyn Field, options: LoadOptions, code: ErrorCode) {
    let (value, errors) = check_load(yaml, field, options);
    assert_eq!(errors.codes(), vec![code], "{errors:?}");
    assert_eq!(value, None);
}
