mod common;

use std::cell::RefCell;

use indoc::indoc;
use saphyr_marshal::{
    ErrorCode, Extends, Field, FieldTypeMismatch, Fields, IntField, ListField, LoadOptions,
    ObjectConfig, ObjectField, ObjectType, Schema, StringField, TypeRegistry, ValidationContext,
    Value, assign, load_object, object_from_value,
};

use common::{check_load, load_err};

thread_local! {
    static HOOKS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn record(event: &str) {
    HOOKS.with(|hooks| hooks.borrow_mut().push(event.to_owned()));
}

fn take_hooks() -> Vec<String> {
    HOOKS.with(|hooks| std::mem::take(&mut *hooks.borrow_mut()))
}

#[derive(Debug, Default)]
struct Shape {
    name: String,
    layer: i64,
}

impl Schema for Shape {
    const TYPE_NAME: &'static str = "shapes.base.Shape";

    fn fields() -> Fields {
        Fields::new()
            .with("name", StringField::new().required())
            .with("layer", IntField::new())
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldTypeMismatch> {
        match name {
            "name" => assign(&mut self.name, value),
            "layer" => assign(&mut self.layer, value),
            _ => Ok(()),
        }
    }

    fn validate(&self, ctx: &mut ValidationContext<'_, '_>) -> Result<(), saphyr_marshal::Error> {
        record("shape validate");
        if self.layer < 0 {
            ctx.error("Layer can't be negative.")?;
        }
        Ok(())
    }

    fn post_load(&mut self) {
        record("shape post_load");
    }
}

#[derive(Debug, Default)]
struct Circle {
    shape: Shape,
    radius: i64,
}

impl Schema for Circle {
    const TYPE_NAME: &'static str = "shapes.round.Circle";

    fn fields() -> Fields {
        Fields::new().with("radius", IntField::new().with_minimum(1))
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldTypeMismatch> {
        match name {
            "radius" => assign(&mut self.radius, value),
            _ => Ok(()),
        }
    }

    fn validate(&self, _ctx: &mut ValidationContext<'_, '_>) -> Result<(), saphyr_marshal::Error> {
        record("circle validate");
        Ok(())
    }

    fn post_load(&mut self) {
        record("circle post_load");
    }

    fn object_type() -> ObjectType {
        ObjectType::derived::<Self, Shape>()
    }
}

impl Extends<Shape> for Circle {
    fn base(&self) -> &Shape {
        &self.shape
    }

    fn base_mut(&mut self) -> &mut Shape {
        &mut self.shape
    }
}

#[derive(Debug, Default)]
struct Nothing;

impl Schema for Nothing {
    const TYPE_NAME: &'static str = "shapes.base.Nothing";

    fn fields() -> Fields {
        Fields::new()
    }

    fn set_field(&mut self, _name: &str, _value: Value) -> Result<(), FieldTypeMismatch> {
        Ok(())
    }
}

/// Declares `count` as a string but stores it in an integer.
#[derive(Debug, Default)]
struct Miswired {
    count: i64,
}

impl Schema for Miswired {
    const TYPE_NAME: &'static str = "shapes.base.Miswired";

    fn fields() -> Fields {
        Fields::new().with("count", StringField::new())
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldTypeMismatch> {
        match name {
            "count" => assign(&mut self.count, value),
            _ => Ok(()),
        }
    }
}

object_from_value!(Shape, Circle);

fn registry_options() -> LoadOptions {
    let registry = TypeRegistry::new().with::<Shape>().with::<Circle>();
    LoadOptions::default().with_config(ObjectConfig::default().with_types(registry))
}

#[test]
fn derived_object_runs_hooks_base_first() {
    take_hooks();
    let yaml = indoc! {"
        name: wheel
        layer: 2
        radius: 5
    "};
    let circle: Circle = load_object(yaml, LoadOptions::default())
        .expect("loads")
        .expect("defined");
    assert_eq!(circle.shape.name, "wheel");
    assert_eq!(circle.shape.layer, 2);
    assert_eq!(circle.radius, 5);
    assert_eq!(
        take_hooks(),
        ["shape validate", "circle validate", "shape post_load", "circle post_load"]
    );
}

#[test]
fn missing_required_field_discards_object() {
    take_hooks();
    let (value, errors) = check_load("{radius: 3}", &ObjectField::of::<Circle>(), LoadOptions::default());
    assert_eq!(value, None);
    assert_eq!(errors.codes(), vec![ErrorCode::MissingRequiredField]);
    assert_eq!(errors.errors()[0].message, "Missing required field name.");
    // post_load only runs on valid objects.
    assert_eq!(take_hooks(), ["shape validate", "circle validate"]);
}

#[test]
fn failed_field_is_left_unset() {
    let (value, errors) = check_load(
        "{name: disc, radius: 0, layer: 1}",
        &ObjectField::of::<Circle>(),
        LoadOptions::default(),
    );
    assert_eq!(errors.codes(), vec![ErrorCode::ValidationError]);
    let circle = value.and_then(|v| v.into_object::<Circle>()).expect("object loads");
    assert_eq!(circle.radius, 0);
    assert_eq!(circle.shape.layer, 1);
}

#[test]
fn object_validation_failure_discards_object() {
    load_err(
        "{name: disc, layer: -1}",
        &ObjectField::of::<Shape>(),
        LoadOptions::default(),
        ErrorCode::ValidationError,
    );
}

#[test]
fn undeclared_field_is_reported() {
    let (value, errors) = check_load(
        "{name: disc, colour: red}",
        &ObjectField::of::<Shape>(),
        LoadOptions::default(),
    );
    assert_eq!(errors.codes(), vec![ErrorCode::FieldNotDeclared]);
    let shape = value.and_then(|v| v.into_object::<Shape>()).expect("object loads");
    assert_eq!(shape.name, "disc");
}

#[test]
fn list_of_objects_keeps_valid_ones() {
    let yaml = indoc! {"
        - name: a
        - layer: 3
        - name: c
    "};
    let (value, errors) = check_load(yaml, &ListField::new(ObjectField::of::<Shape>()), LoadOptions::default());
    let shapes: Vec<Shape> = value.and_then(|v| v.extract()).expect("list");
    assert_eq!(shapes.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), ["a", "c"]);
    assert_eq!(errors.codes(), vec![ErrorCode::MissingRequiredField]);
}

#[test]
fn type_tag_loads_registered_subtype() {
    let yaml = "!type:shapes.round.Circle {name: ring, radius: 2}";
    let (value, errors) = check_load(yaml, &ObjectField::of::<Shape>(), registry_options());
    assert!(errors.is_empty(), "{errors:?}");
    let value = value.expect("defined");
    assert_eq!(value.as_object().map(|o| o.type_name()), Some("shapes.round.Circle"));
    let circle = value.into_object::<Circle>().expect("a circle");
    assert_eq!(circle.radius, 2);
    assert_eq!(circle.shape.name, "ring");
}

#[test]
fn type_tag_errors() {
    let field = ObjectField::of::<Shape>();
    load_err("!type:Circle {name: x}", &field, registry_options(), ErrorCode::BadTypeTagFormat);
    load_err(
        "!type:shapes:round.Circle {name: x}",
        &field,
        registry_options(),
        ErrorCode::BadTypeTagFormat,
    );
    load_err(
        "!type:shapes.round.Square {name: x}",
        &field,
        registry_options(),
        ErrorCode::TypeResolveError,
    );
    load_err(
        "!type:shapes.round {name: x}",
        &field,
        registry_options(),
        ErrorCode::TypeResolveError,
    );
}

#[test]
fn schema_without_fields_is_an_error() {
    load_err("{a: 1}", &ObjectField::of::<Nothing>(), LoadOptions::default(), ErrorCode::SchemaError);
}

#[test]
fn scalar_is_not_an_object() {
    load_err("plain", &ObjectField::of::<Shape>(), LoadOptions::default(), ErrorCode::UnexpectedNodeType);
}

#[test]
fn load_object_rejects_unrelated_type() {
    let err = load_object::<Circle>("!type:shapes.base.Shape {name: x}", registry_options())
        .expect_err("a shape is not a circle");
    assert_eq!(err.code(), Some(ErrorCode::TypeResolveError));
}

#[test]
fn mistyped_member_discards_object() {
    let (value, errors) = check_load("{count: many}", &ObjectField::of::<Miswired>(), LoadOptions::default());
    assert!(value.is_none());
    assert_eq!(errors.codes(), vec![ErrorCode::SchemaError]);
    assert_eq!(
        errors.errors()[0].message,
        "Field count: can't store a string value in this field."
    );
}

#[test]
fn object_field_builders() {
    let field = ObjectField::of::<Shape>()
        .required()
        .with_validate(|ctx, _value| ctx.error("Shapes are disabled."));
    assert!(field.options().required);
    load_err("{name: disc}", &field, LoadOptions::default(), ErrorCode::ValidationError);
}
