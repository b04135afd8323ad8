use ahash::AHashSet;

use crate::context::{LoadResult, LoadingContext};
use crate::error::ErrorCode;
use crate::fields::{Field, FieldOptions, StringField};
use crate::schema::{ObjectConfig, ObjectType, Schema};
use crate::tags::{TypeTagError, parse_type_tag};
use crate::validation::ValidationContext;
use crate::value::{Instance, Value};

/// Object of a [`Schema`] type, loaded from a mapping.
///
/// A `!type:package.module.Type` tag on the mapping loads another registered type
/// instead of the declared one (see [`ObjectConfig`]). An object that misses a
/// required field or fails validation is discarded as a whole, while individual
/// fields that fail to load are simply left unset.
#[derive(Clone, Debug)]
pub struct ObjectField {
    pub(crate) options: FieldOptions,
    object_type: ObjectType,
}

impl ObjectField {
    pub fn of<T: Schema>() -> Self {
        Self::new(T::object_type())
    }

    pub fn new(object_type: ObjectType) -> Self {
        Self {
            options: FieldOptions::default(),
            object_type,
        }
    }

    pub fn object_type(&self) -> &ObjectType {
        &self.object_type
    }

    fn resolve_type(
        &self,
        ctx: &mut LoadingContext<'_>,
        config: &ObjectConfig,
    ) -> Result<Option<ObjectType>, crate::Error> {
        let tag = match ctx.current_node() {
            Some(node) => node.tag().to_owned(),
            None => return Ok(None),
        };
        let name = match parse_type_tag(&tag, &config.type_tag) {
            None => return Ok(Some(self.object_type.clone())),
            Some(Ok(name)) => name,
            Some(Err(TypeTagError::Separator)) => {
                ctx.error(
                    ErrorCode::BadTypeTagFormat,
                    format!("Bad type tag format {tag}: expected !{}:<module>.<Type>.", config.type_tag),
                )?;
                return Ok(None);
            }
            Some(Err(TypeTagError::Unqualified)) => {
                ctx.error(
                    ErrorCode::BadTypeTagFormat,
                    format!("Bad type tag format {tag}: the type name must be fully qualified."),
                )?;
                return Ok(None);
            }
        };

        match config.type_resolver.resolve(name) {
            Ok(object_type) => Ok(Some(object_type)),
            Err(failure) => {
                ctx.error(ErrorCode::TypeResolveError, failure.to_string())?;
                Ok(None)
            }
        }
    }
}

impl Field for ObjectField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn load(&self, ctx: &mut LoadingContext<'_>) -> LoadResult {
        if !ctx.expect_mapping()? {
            return Ok(None);
        }

        let config = ctx.get_config::<ObjectConfig>();
        let Some(object_type) = self.resolve_type(ctx, &config)? else {
            return Ok(None);
        };

        let field_map = config.fields_resolver.resolve(&object_type);
        if field_map.is_empty() {
            ctx.error(
                ErrorCode::SchemaError,
                format!("No fields declared for type {}.", object_type.name()),
            )?;
            return Ok(None);
        }

        let mut obj = object_type.create();
        let pairs: Vec<_> = ctx
            .current_node()
            .and_then(|node| node.as_mapping())
            .map(<[_]>::to_vec)
            .unwrap_or_default();

        let key_field = StringField::new();
        let mut valid = true;
        let mut seen = AHashSet::with_capacity(pairs.len());
        for (key_node, value_node) in pairs {
            let Some(Value::String(key)) = ctx.load(&key_field, key_node, None)? else {
                continue;
            };
            seen.insert(key.clone());

            let Some(slot) = field_map.get(&key) else {
                ctx.error(
                    ErrorCode::FieldNotDeclared,
                    format!("Field {key} is not declared."),
                )?;
                continue;
            };
            let Some(value) = ctx.load(&*slot.field, value_node, None)? else {
                continue;
            };
            if let Err(mismatch) = object_type.set_field(&mut *obj, slot.level, &key, value) {
                ctx.error(ErrorCode::SchemaError, format!("Field {key}: {mismatch}."))?;
                valid = false;
            }
        }

        for (name, slot) in &field_map {
            if slot.field.options().required && !seen.contains(name) {
                ctx.error(
                    ErrorCode::MissingRequiredField,
                    format!("Missing required field {name}."),
                )?;
                valid = false;
            }
        }

        let mut validation = ValidationContext::new(ctx);
        object_type.validate(&*obj, &mut validation)?;
        if !valid || validation.has_error() {
            return Ok(None);
        }

        object_type.post_load(&mut *obj);
        Ok(Some(Value::Object(Instance::new(object_type.name(), obj))))
    }
}
