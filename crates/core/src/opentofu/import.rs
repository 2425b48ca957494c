//! Module variables → Schema.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use super::module::{Module, Variable, load_module};
use super::typeexpr::TypeConstraint;
use crate::error::{Error, Result};
use crate::result::{Diagnostics, SchemaResult, codes};
use crate::schema::{ANY_KEY_PATTERN, AdditionalProperties, Schema, SchemaType};

/// Import the variables of the module in `module_dir`.
pub fn opentofu_to_schema(module_dir: &Path) -> SchemaResult {
    match load_module(module_dir) {
        Ok(module) => module_to_schema(&module),
        Err(err) => SchemaResult::from_error(&err),
    }
}

/// Convert already-loaded module variables.
pub fn module_to_schema(module: &Module) -> SchemaResult {
    let mut diags = Diagnostics::default();
    match convert_module(module, &mut diags) {
        Ok(schema) => SchemaResult {
            schema,
            diags: diags.into_vec(),
        },
        Err(err) => SchemaResult::from_error(&err),
    }
}

fn convert_module(module: &Module, diags: &mut Diagnostics) -> Result<Schema> {
    debug!(variables = module.variables.len(), "importing module variables");
    let mut root = Schema::of_type(SchemaType::Object);
    for variable in &module.variables {
        let property = variable_to_schema(variable, diags)
            .map_err(|message| Error::Unsupported(format!("variable \"{}\": {message}", variable.name)))?;
        root.properties.insert(variable.name.clone(), property);
        root.required.insert(variable.name.clone());
    }
    Ok(root)
}

fn variable_to_schema(variable: &Variable, diags: &mut Diagnostics) -> std::result::Result<Schema, String> {
    let ty = variable
        .type_constraint
        .as_ref()
        .ok_or_else(|| "type cannot be empty".to_string())?;
    if *ty == TypeConstraint::Any {
        return Err("type 'any' cannot be converted to a JSON schema type".to_string());
    }

    let mut schema = type_to_schema(ty, &variable.name, &variable.name, diags)?;
    schema.description.clone_from(&variable.description);
    schema.default = match &variable.default {
        Some(value) => Some(strip_absent(ty, value.clone())),
        None if *ty == TypeConstraint::Bool => Some(Value::Bool(false)),
        None => None,
    };
    Ok(schema)
}

/// `path` names the nearest named ancestor and is only used for diagnostics.
fn type_to_schema(
    ty: &TypeConstraint,
    title: &str,
    path: &str,
    diags: &mut Diagnostics,
) -> std::result::Result<Schema, String> {
    let mut schema = Schema {
        title: title.to_string(),
        ..Schema::default()
    };
    match ty {
        TypeConstraint::Any => {
            return Err("dynamic types are not supported (are you using type 'any'?)".to_string());
        }
        TypeConstraint::String => schema.schema_type = Some(SchemaType::String),
        TypeConstraint::Number => schema.schema_type = Some(SchemaType::Number),
        TypeConstraint::Bool => schema.schema_type = Some(SchemaType::Boolean),
        TypeConstraint::List(element) | TypeConstraint::Set(element) => {
            schema.schema_type = Some(SchemaType::Array);
            schema.items = Some(Box::new(type_to_schema(element, "", path, diags)?));
            schema.unique_items = matches!(ty, TypeConstraint::Set(_));
        }
        TypeConstraint::Map(element) => {
            schema.schema_type = Some(SchemaType::Object);
            schema.property_names = Some(Box::new(Schema {
                pattern: ANY_KEY_PATTERN.to_string(),
                ..Schema::default()
            }));
            schema.additional_properties = Some(AdditionalProperties::Schema(Box::new(
                type_to_schema(element, "", path, diags)?,
            )));
        }
        TypeConstraint::Tuple(elements) => {
            // Element schemas are discarded, but a nested `any` still fails.
            let mut scratch = Diagnostics::default();
            for element in elements {
                type_to_schema(element, "", path, &mut scratch)?;
            }
            schema.schema_type = Some(SchemaType::Array);
            schema.comment = "schemaport warning: tuple converted to an array of any element type".to_string();
            diags.warn(
                path,
                codes::UNSUPPORTED_TYPE,
                format!("tuple type of {path} has no JSON schema equivalent; converted to an array"),
            );
        }
        TypeConstraint::Object(attributes) => {
            schema.schema_type = Some(SchemaType::Object);
            for attr in attributes {
                let mut property = type_to_schema(&attr.type_constraint, &attr.name, &attr.name, diags)?;
                property.default = attr
                    .default
                    .clone()
                    .map(|value| strip_absent(&attr.type_constraint, value));
                property.title.clone_from(&attr.name);
                schema.properties.insert(attr.name.clone(), property);
                if !attr.optional {
                    schema.required.insert(attr.name.clone());
                }
            }
        }
    }
    Ok(schema)
}

/// Remove `null` entries standing in for omitted optional object attributes,
/// following the type tree alongside the value.
fn strip_absent(ty: &TypeConstraint, value: Value) -> Value {
    match (ty, value) {
        (TypeConstraint::Object(attributes), Value::Object(fields)) => Value::Object(
            fields
                .into_iter()
                .filter_map(|(key, field)| match attributes.iter().find(|a| a.name == key) {
                    Some(attr) if attr.optional && field.is_null() => None,
                    Some(attr) => Some((key, strip_absent(&attr.type_constraint, field))),
                    None => Some((key, field)),
                })
                .collect(),
        ),
        (TypeConstraint::List(element) | TypeConstraint::Set(element), Value::Array(items)) => {
            Value::Array(items.into_iter().map(|item| strip_absent(element, item)).collect())
        }
        (TypeConstraint::Map(element), Value::Object(fields)) => Value::Object(
            fields
                .into_iter()
                .map(|(key, field)| (key, strip_absent(element, field)))
                .collect(),
        ),
        (_, value) => value,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::opentofu::module::parse_variables;
    use serde_json::json;

    fn import(source: &str) -> SchemaResult {
        let mut module = Module::default();
        parse_variables(Path::new("variables.tf"), source, &mut module).unwrap();
        module_to_schema(&module)
    }

    #[test]
    fn test_primitives_and_required() {
        let result = import(
            r#"
variable "name" {
  type        = string
  description = "The name"
  default     = "web"
}
variable "count" {
  type = number
}
variable "enabled" {
  type = bool
}
"#,
        );
        assert!(result.diags.is_empty());
        let encoded = serde_json::to_value(&result.schema).unwrap();
        assert_eq!(
            encoded,
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "title": "name", "description": "The name", "default": "web"},
                    "count": {"type": "number", "title": "count"},
                    "enabled": {"type": "boolean", "title": "enabled", "default": false}
                },
                "required": ["count", "enabled", "name"]
            })
        );
    }

    #[test]
    fn test_map_type() {
        let result = import("variable \"labels\" {\n  type = map(string)\n}\n");
        let encoded = serde_json::to_value(&result.schema.properties["labels"]).unwrap();
        assert_eq!(
            encoded,
            json!({
                "type": "object",
                "title": "labels",
                "propertyNames": {"pattern": "^.*$"},
                "additionalProperties": {"type": "string"}
            })
        );
    }

    #[test]
    fn test_list_and_set() {
        let result = import(
            "variable \"a\" {\n  type = list(number)\n}\nvariable \"b\" {\n  type = set(string)\n}\n",
        );
        let a = &result.schema.properties["a"];
        assert!(a.is_type(&SchemaType::Array));
        assert!(!a.unique_items);
        assert!(a.items.as_ref().unwrap().is_type(&SchemaType::Number));
        let b = &result.schema.properties["b"];
        assert!(b.unique_items);
        assert!(b.items.as_ref().unwrap().is_type(&SchemaType::String));
    }

    #[test]
    fn test_object_with_nested_defaults() {
        let result = import(
            r#"
variable "db" {
  type = object({
    engine   = string
    size     = optional(number, 20)
    settings = optional(object({
      backups = optional(bool, true)
      window  = optional(string)
    }), {})
  })
}
"#,
        );
        let db = &result.schema.properties["db"];
        let required: Vec<&str> = db.required.iter().map(String::as_str).collect();
        assert_eq!(required, ["engine"]);
        assert_eq!(db.properties["size"].default, Some(json!(20)));
        assert_eq!(db.properties["engine"].default, None);
        let settings = &db.properties["settings"];
        assert_eq!(settings.default, Some(json!({})));
        assert_eq!(settings.properties["backups"].default, Some(json!(true)));
        assert!(settings.required.is_empty());
    }

    #[test]
    fn test_absent_optional_attributes_are_stripped() {
        let result = import(
            r#"
variable "svc" {
  type = object({
    name = string
    port = optional(number)
  })
  default = {
    name = "api"
    port = null
  }
}
"#,
        );
        assert_eq!(result.schema.properties["svc"].default, Some(json!({"name": "api"})));
    }

    #[test]
    fn test_top_level_any_is_fatal() {
        let result = import("variable \"x\" {\n  type = any\n}\n");
        assert_eq!(result.schema, Schema::default());
        assert_eq!(result.diags.len(), 1);
        assert!(result.diags[0].message.contains("type 'any' cannot be converted to a JSON schema type"));
    }

    #[test]
    fn test_nested_any_is_fatal() {
        let result = import("variable \"x\" {\n  type = map(any)\n}\n");
        assert!(result.has_errors());
        assert!(
            result.diags[0]
                .message
                .contains("dynamic types are not supported (are you using type 'any'?)")
        );
    }

    #[test]
    fn test_any_inside_tuple_is_fatal() {
        for ty in ["tuple([any, string])", "tuple([string, list(any)])", "list(tuple([any]))"] {
            let result = import(&format!("variable \"t\" {{\n  type = {ty}\n}}\n"));
            assert_eq!(result.schema, Schema::default(), "{ty}");
            assert_eq!(result.diags.len(), 1, "{ty}");
            assert!(result.diags[0].message.contains("dynamic types are not supported"), "{ty}");
        }
    }

    #[test]
    fn test_missing_type_is_fatal() {
        let result = import("variable \"x\" {}\n");
        assert!(result.diags[0].message.contains("type cannot be empty"));
    }

    #[test]
    fn test_tuple_degrades_with_warning() {
        let result = import("variable \"pair\" {\n  type = tuple([string, number])\n}\n");
        let pair = &result.schema.properties["pair"];
        assert!(pair.is_type(&SchemaType::Array));
        assert!(!pair.comment.is_empty());
        assert_eq!(result.diags[0].code, codes::UNSUPPORTED_TYPE);
        assert!(!result.has_errors());
    }
}
