use regex::Regex;

use crate::context::{LoadResult, LoadingContext};
use crate::error::ErrorCode;
use crate::fields::{Field, FieldOptions, scalar_text};
use crate::parse_scalars::{FALSE_TOKENS, TRUE_TOKENS, parse_bool, parse_float, parse_int};
use crate::value::Value;

/// Boolean from a fixed, case-sensitive token set (`yes`, `On`, `FALSE`, ...).
#[derive(Clone, Debug, Default)]
pub struct BoolField {
    pub(crate) options: FieldOptions,
}

impl BoolField {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for BoolField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn load(&self, ctx: &mut LoadingContext<'_>) -> LoadResult {
        let Some(text) = scalar_text(ctx)? else {
            return Ok(None);
        };
        if let Some(value) = parse_bool(&text) {
            return Ok(Some(Value::Bool(value)));
        }
        let accepted: Vec<&str> = TRUE_TOKENS.iter().chain(FALSE_TOKENS).copied().collect();
        ctx.error(
            ErrorCode::ValueError,
            format!("Boolean value should be one of {}.", accepted.join(", ")),
        )?;
        Ok(None)
    }
}

/// Integer with an optional radix and bounds.
#[derive(Clone, Debug, Default)]
pub struct IntField {
    pub(crate) options: FieldOptions,
    base: u32,
    minimum: Option<i64>,
    maximum: Option<i64>,
}

impl IntField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Radix of the digits, `0` (the default) detects it from a `0x`, `0o` or `0b` prefix.
    pub fn with_base(mut self, base: u32) -> Self {
        self.base = base;
        self
    }

    pub fn with_minimum(mut self, minimum: i64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn with_maximum(mut self, maximum: i64) -> Self {
        self.maximum = Some(maximum);
        self
    }
}

impl Field for IntField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn load(&self, ctx: &mut LoadingContext<'_>) -> LoadResult {
        let Some(text) = scalar_text(ctx)? else {
            return Ok(None);
        };
        let Some(value) = parse_int(&text, self.base) else {
            ctx.error(
                ErrorCode::ValueError,
                format!("Can't convert \"{text}\" to an integer."),
            )?;
            return Ok(None);
        };
        if !check_bounds(ctx, value, self.minimum, self.maximum)? {
            return Ok(None);
        }
        Ok(Some(Value::Int(value)))
    }
}

/// Float with optional bounds. Accepts `.inf`, `-.inf` and `.nan`.
#[derive(Clone, Debug, Default)]
pub struct FloatField {
    pub(crate) options: FieldOptions,
    minimum: Option<f64>,
    maximum: Option<f64>,
}

impl FloatField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn with_maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }
}

impl Field for FloatField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn load(&self, ctx: &mut LoadingContext<'_>) -> LoadResult {
        let Some(text) = scalar_text(ctx)? else {
            return Ok(None);
        };
        let Some(value) = parse_float(&text) else {
            ctx.error(
                ErrorCode::ValueError,
                format!("Can't convert \"{text}\" to a float."),
            )?;
            return Ok(None);
        };
        if !check_bounds(ctx, value, self.minimum, self.maximum)? {
            return Ok(None);
        }
        Ok(Some(Value::Float(value)))
    }
}

fn check_bounds<T: PartialOrd + std::fmt::Display>(
    ctx: &mut LoadingContext<'_>,
    value: T,
    minimum: Option<T>,
    maximum: Option<T>,
) -> Result<bool, crate::Error> {
    if let Some(minimum) = minimum {
        if value < minimum {
            ctx.error(
                ErrorCode::ValidationError,
                format!("Value is too small (minimum : {minimum})."),
            )?;
            return Ok(false);
        }
    }
    if let Some(maximum) = maximum {
        if value > maximum {
            ctx.error(
                ErrorCode::ValidationError,
                format!("Value is too big (maximum : {maximum})."),
            )?;
            return Ok(false);
        }
    }
    Ok(true)
}

/// String, optionally constrained by a regular expression.
#[derive(Clone, Debug, Default)]
pub struct StringField {
    pub(crate) options: FieldOptions,
    pattern: Option<Regex>,
}

impl StringField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept values matching `pattern` from their first character.
    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }
}

impl Field for StringField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn load(&self, ctx: &mut LoadingContext<'_>) -> LoadResult {
        let Some(text) = scalar_text(ctx)? else {
            return Ok(None);
        };
        if let Some(pattern) = &self.pattern {
            // Must match at the start, not necessarily up to the end.
            if !pattern.find(&text).is_some_and(|m| m.start() == 0) {
                ctx.error(
                    ErrorCode::ValidationError,
                    format!("Value \"{text}\" doesn't match pattern {}.", pattern.as_str()),
                )?;
                return Ok(None);
            }
        }
        Ok(Some(Value::String(text)))
    }
}

/// One of a fixed set of member names. Loads as the member name.
#[derive(Clone, Debug)]
pub struct EnumField {
    pub(crate) options: FieldOptions,
    type_name: String,
    members: Vec<String>,
}

impl EnumField {
    pub fn new<I, S>(type_name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: FieldOptions::default(),
            type_name: type_name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

impl Field for EnumField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn load(&self, ctx: &mut LoadingContext<'_>) -> LoadResult {
        let Some(text) = scalar_text(ctx)? else {
            return Ok(None);
        };
        if self.members.contains(&text) {
            return Ok(Some(Value::String(text)));
        }
        ctx.error(
            ErrorCode::ValidationError,
            format!("Unknown value {text} for enum {}.", self.type_name),
        )?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::error::ErrorCollector;
    use crate::node::Node;

    fn load_scalar(field: &dyn Field, text: &str) -> (Option<Value>, Vec<ErrorCode>) {
        let errors = ErrorCollector::new();
        let mut ctx = LoadingContext::new(&[], Some(errors.handler()));
        let value = ctx.load(field, Rc::new(Node::scalar(text)), None).unwrap();
        (value, errors.codes())
    }

    #[test]
    fn bool_field_round_trips_tokens() {
        let field = BoolField::new();
        assert_eq!(load_scalar(&field, "true").0, Some(Value::Bool(true)));
        assert_eq!(load_scalar(&field, "ON").0, Some(Value::Bool(true)));
        assert_eq!(load_scalar(&field, "off").0, Some(Value::Bool(false)));
        assert_eq!(load_scalar(&field, "oFF"), (None, vec![ErrorCode::ValueError]));
    }

    #[test]
    fn int_field_bounds() {
        let field = IntField::new().with_minimum(10).with_maximum(20);
        assert_eq!(load_scalar(&field, "15"), (Some(Value::Int(15)), vec![]));
        assert_eq!(load_scalar(&field, "0"), (None, vec![ErrorCode::ValidationError]));
        assert_eq!(load_scalar(&field, "100"), (None, vec![ErrorCode::ValidationError]));
        assert_eq!(load_scalar(&field, "bad_value"), (None, vec![ErrorCode::ValueError]));
    }

    #[test]
    fn int_field_hex_base() {
        let field = IntField::new().with_base(16);
        assert_eq!(load_scalar(&field, "F00D").0, Some(Value::Int(0xF00D)));
    }

    #[test]
    fn float_field_bounds() {
        let field = FloatField::new().with_minimum(10.0).with_maximum(20.0);
        assert_eq!(load_scalar(&field, "17.2").0, Some(Value::Float(17.2)));
        assert_eq!(load_scalar(&field, "0.0"), (None, vec![ErrorCode::ValidationError]));
        assert_eq!(load_scalar(&field, "x"), (None, vec![ErrorCode::ValueError]));
    }

    #[test]
    fn string_field_pattern() {
        let field = StringField::new().with_pattern(Regex::new("^matching$").unwrap());
        assert_eq!(load_scalar(&field, "matching").0, Some(Value::from("matching")));
        assert_eq!(
            load_scalar(&field, "not_matching"),
            (None, vec![ErrorCode::ValidationError])
        );
    }

    #[test]
    fn enum_field_members() {
        let field = EnumField::new("Color", ["Red", "Green"]);
        assert_eq!(load_scalar(&field, "Green").0, Some(Value::from("Green")));
        assert_eq!(load_scalar(&field, "Blue"), (None, vec![ErrorCode::ValidationError]));
    }

    #[test]
    fn scalar_fields_reject_collections() {
        let errors = ErrorCollector::new();
        let mut ctx = LoadingContext::new(&[], Some(errors.handler()));
        let node = Rc::new(Node::sequence(vec![Rc::new(Node::scalar("a"))]));
        assert_eq!(ctx.load(&StringField::new(), node, None).unwrap(), None);
        assert_eq!(errors.codes(), vec![ErrorCode::UnexpectedNodeType]);
    }
}
