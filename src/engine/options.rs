//! engine::options
//!
//! Option transformation pipeline.
//!
//! # Design
//!
//! Raw options arrive as untyped JSON. An engine runs them through an
//! ordered list of [`OptionTransform`]s; each receives the previous result.
//! The bundled transforms, in their default order:
//!
//! 1. [`ObjectOptions`] - `null` becomes `{}`, anything but an object fails
//! 2. [`ConfigDefaults`] - fills keys from configured `collection:schematic` defaults
//! 3. [`SchemaOptions`] - fills schema defaults, coerces values, checks `required`
//!
//! Values supplied by the caller always win over any default.
//!
//! # Example
//!
//! ```
//! use schematics::core::description::{CollectionDescription, SchematicDescription};
//! use schematics::engine::options::{ObjectOptions, OptionTransform};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let description = SchematicDescription::new(
//!     "component",
//!     CollectionDescription::new("kit").unwrap(),
//! );
//! let options = ObjectOptions.transform(&description, json!(null)).await.unwrap();
//! assert_eq!(options, json!({}));
//! # });
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::EngineError;
use crate::core::config::Config;
use crate::core::description::{PropertyKind, SchematicDescription};

/// Untyped options as supplied by a caller.
pub type Options = Value;

/// A single step of option transformation.
#[async_trait]
pub trait OptionTransform: Send + Sync {
    /// Short identifier, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Transform `options` for the schematic described by `schematic`.
    async fn transform(
        &self,
        schematic: &SchematicDescription,
        options: Options,
    ) -> Result<Options, EngineError>;
}

/// Run `options` through every transform in order.
pub async fn run_transforms(
    transforms: &[Arc<dyn OptionTransform>],
    schematic: &SchematicDescription,
    mut options: Options,
) -> Result<Options, EngineError> {
    for transform in transforms {
        tracing::trace!(
            schematic = %schematic.qualified_name(),
            transform = transform.name(),
            "applying options transform"
        );
        options = transform.transform(schematic, options).await?;
    }
    Ok(options)
}

/// Name of a JSON value's type, for error messages.
fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fill keys missing from `target` with values from `defaults`.
fn fill_missing(target: &mut Map<String, Value>, defaults: &Map<String, Value>) {
    for (key, value) in defaults {
        if target.get(key).map_or(true, Value::is_null) {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Requires options to be a JSON object; `null` is treated as `{}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectOptions;

#[async_trait]
impl OptionTransform for ObjectOptions {
    fn name(&self) -> &'static str {
        "object"
    }

    async fn transform(
        &self,
        schematic: &SchematicDescription,
        options: Options,
    ) -> Result<Options, EngineError> {
        match options {
            Value::Null => Ok(Value::Object(Map::new())),
            Value::Object(_) => Ok(options),
            other => Err(EngineError::InvalidOptions {
                schematic: schematic.qualified_name(),
                found: json_type(&other).to_string(),
            }),
        }
    }
}

/// Applies option defaults from configuration.
#[derive(Debug, Clone)]
pub struct ConfigDefaults {
    config: Config,
}

impl ConfigDefaults {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl OptionTransform for ConfigDefaults {
    fn name(&self) -> &'static str {
        "config-defaults"
    }

    async fn transform(
        &self,
        schematic: &SchematicDescription,
        options: Options,
    ) -> Result<Options, EngineError> {
        let mut map = match options {
            Value::Object(map) => map,
            other => return Ok(other),
        };
        if let Some(defaults) = self.config.defaults_for(&schematic.qualified_name()) {
            fill_missing(&mut map, &defaults);
        }
        Ok(Value::Object(map))
    }
}

/// Applies the schematic's declared [`OptionsSchema`](crate::core::description::OptionsSchema).
///
/// Schematics without a schema pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaOptions;

#[async_trait]
impl OptionTransform for SchemaOptions {
    fn name(&self) -> &'static str {
        "schema"
    }

    async fn transform(
        &self,
        schematic: &SchematicDescription,
        options: Options,
    ) -> Result<Options, EngineError> {
        let Some(schema) = &schematic.schema else {
            return Ok(options);
        };
        let mut map = match options {
            Value::Object(map) => map,
            other => return Ok(other),
        };

        for (option, property) in &schema.properties {
            match map.get(option) {
                None | Some(Value::Null) => {
                    if let Some(default) = &property.default {
                        map.insert(option.clone(), default.clone());
                    } else {
                        map.remove(option);
                    }
                }
                Some(value) => {
                    if let Some(kind) = property.kind {
                        let coerced = coerce(value, kind).ok_or_else(|| {
                            EngineError::TypeMismatch {
                                schematic: schematic.qualified_name(),
                                option: option.clone(),
                                expected: kind,
                                value: value.clone(),
                            }
                        })?;
                        map.insert(option.clone(), coerced);
                    }
                }
            }
        }

        for option in &schema.required {
            if !map.contains_key(option) {
                return Err(EngineError::MissingOption {
                    schematic: schematic.qualified_name(),
                    option: option.clone(),
                });
            }
        }

        Ok(Value::Object(map))
    }
}

/// Coerce a value to a declared type, or `None` if it cannot be.
fn coerce(value: &Value, kind: PropertyKind) -> Option<Value> {
    match (kind, value) {
        (PropertyKind::String, Value::String(_)) => Some(value.clone()),
        (PropertyKind::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (PropertyKind::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

        (PropertyKind::Number, Value::Number(_)) => Some(value.clone()),
        (PropertyKind::Number, Value::String(s)) => parse_number(s.trim()),

        (PropertyKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {
            Some(value.clone())
        }
        (PropertyKind::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

        (PropertyKind::Boolean, Value::Bool(_)) => Some(value.clone()),
        (PropertyKind::Boolean, Value::String(s)) => match s.trim() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },

        (PropertyKind::Array, Value::Array(_)) => Some(value.clone()),
        (PropertyKind::Object, Value::Object(_)) => Some(value.clone()),
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<Value> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    s.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{GlobalConfig, ProjectConfig};
    use crate::core::description::{CollectionDescription, OptionsSchema};
    use serde_json::json;

    fn description() -> SchematicDescription {
        SchematicDescription::new("component", CollectionDescription::new("kit").unwrap())
    }

    fn with_schema(schema: Value) -> SchematicDescription {
        let schema: OptionsSchema = serde_json::from_value(schema).unwrap();
        description().with_schema(schema)
    }

    mod object_options {
        use super::*;

        #[tokio::test]
        async fn null_becomes_empty_object() {
            let out = ObjectOptions.transform(&description(), Value::Null).await;
            assert_eq!(out, Ok(json!({})));
        }

        #[tokio::test]
        async fn non_object_rejected() {
            let err = ObjectOptions
                .transform(&description(), json!([1, 2]))
                .await
                .unwrap_err();
            assert_eq!(
                err,
                EngineError::InvalidOptions {
                    schematic: "kit:component".into(),
                    found: "array".into(),
                }
            );
        }
    }

    mod config_defaults {
        use super::*;

        fn config() -> Config {
            let global: GlobalConfig = toml::from_str(
                r#"
                [defaults."kit:component"]
                style = "scss"
                flat = true
                "#,
            )
            .unwrap();
            let project: ProjectConfig = toml::from_str(
                r#"
                [defaults."kit:component"]
                style = "css"
                "#,
            )
            .unwrap();
            Config::new(global, Some(project))
        }

        #[tokio::test]
        async fn fills_missing_keys_only() {
            let transform = ConfigDefaults::new(config());
            let out = transform
                .transform(&description(), json!({ "flat": false }))
                .await
                .unwrap();
            assert_eq!(out, json!({ "style": "css", "flat": false }));
        }

        #[tokio::test]
        async fn other_schematics_untouched() {
            let transform = ConfigDefaults::new(config());
            let other = SchematicDescription::new(
                "service",
                CollectionDescription::new("kit").unwrap(),
            );
            let out = transform.transform(&other, json!({})).await.unwrap();
            assert_eq!(out, json!({}));
        }
    }

    mod schema_options {
        use super::*;

        #[tokio::test]
        async fn applies_property_defaults() {
            let description = with_schema(json!({
                "properties": {
                    "x": { "type": "integer" },
                    "y": { "type": "string", "default": "default" }
                }
            }));
            let out = SchemaOptions
                .transform(&description, json!({ "x": 1 }))
                .await
                .unwrap();
            assert_eq!(out, json!({ "x": 1, "y": "default" }));
        }

        #[tokio::test]
        async fn explicit_values_win_over_defaults() {
            let description = with_schema(json!({
                "properties": { "y": { "default": "default" } }
            }));
            let out = SchemaOptions
                .transform(&description, json!({ "y": "mine" }))
                .await
                .unwrap();
            assert_eq!(out, json!({ "y": "mine" }));
        }

        #[tokio::test]
        async fn coerces_strings() {
            let description = with_schema(json!({
                "properties": {
                    "count": { "type": "integer" },
                    "ratio": { "type": "number" },
                    "flat": { "type": "boolean" },
                    "label": { "type": "string" }
                }
            }));
            let out = SchemaOptions
                .transform(
                    &description,
                    json!({ "count": "3", "ratio": "0.5", "flat": "true", "label": 7 }),
                )
                .await
                .unwrap();
            assert_eq!(
                out,
                json!({ "count": 3, "ratio": 0.5, "flat": true, "label": "7" })
            );
        }

        #[tokio::test]
        async fn unconvertible_value_rejected() {
            let description = with_schema(json!({
                "properties": { "flat": { "type": "boolean" } }
            }));
            let err = SchemaOptions
                .transform(&description, json!({ "flat": "maybe" }))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                EngineError::TypeMismatch { ref option, expected: PropertyKind::Boolean, .. }
                    if option == "flat"
            ));
        }

        #[tokio::test]
        async fn missing_required_rejected() {
            let description = with_schema(json!({
                "properties": { "name": { "type": "string" } },
                "required": ["name"]
            }));
            let err = SchemaOptions
                .transform(&description, json!({}))
                .await
                .unwrap_err();
            assert_eq!(
                err,
                EngineError::MissingOption {
                    schematic: "kit:component".into(),
                    option: "name".into(),
                }
            );
        }

        #[tokio::test]
        async fn required_satisfied_by_default() {
            let description = with_schema(json!({
                "properties": { "name": { "default": "app" } },
                "required": ["name"]
            }));
            let out = SchemaOptions
                .transform(&description, json!({}))
                .await
                .unwrap();
            assert_eq!(out, json!({ "name": "app" }));
        }

        #[tokio::test]
        async fn unknown_options_pass_through() {
            let description = with_schema(json!({ "properties": {} }));
            let out = SchemaOptions
                .transform(&description, json!({ "extra": [1] }))
                .await
                .unwrap();
            assert_eq!(out, json!({ "extra": [1] }));
        }

        #[tokio::test]
        async fn no_schema_passes_through() {
            let out = SchemaOptions
                .transform(&description(), json!({ "count": "3" }))
                .await
                .unwrap();
            assert_eq!(out, json!({ "count": "3" }));
        }
    }

    mod pipeline {
        use super::*;

        struct Fails;

        #[async_trait]
        impl OptionTransform for Fails {
            fn name(&self) -> &'static str {
                "fails"
            }

            async fn transform(
                &self,
                _schematic: &SchematicDescription,
                _options: Options,
            ) -> Result<Options, EngineError> {
                Err(EngineError::Transform {
                    transform: self.name().into(),
                    message: "nope".into(),
                })
            }
        }

        #[tokio::test]
        async fn runs_in_order_and_stops_on_error() {
            let transforms: Vec<Arc<dyn OptionTransform>> =
                vec![Arc::new(ObjectOptions), Arc::new(Fails), Arc::new(SchemaOptions)];
            let err = run_transforms(&transforms, &description(), Value::Null)
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::Transform { .. }));
        }

        #[tokio::test]
        async fn empty_pipeline_is_identity() {
            let out = run_transforms(&[], &description(), json!(5)).await;
            assert_eq!(out, Ok(json!(5)));
        }
    }
}
