//! Template parameters → Schema.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use super::template::{ParameterType, Template, TemplateParameter};
use crate::result::{Diagnostics, SchemaResult, codes};
use crate::schema::{Decimal, PASSWORD_FORMAT, Schema, SchemaType};

/// Import the parameters of a Bicep file or ARM template.
pub fn bicep_to_schema(path: &Path) -> SchemaResult {
    match Template::load(path) {
        Ok(template) => template_to_schema(&template),
        Err(err) => SchemaResult::from_error(&err),
    }
}

/// Convert already-loaded template parameters.
pub fn template_to_schema(template: &Template) -> SchemaResult {
    debug!(parameters = template.parameters.len(), "importing template parameters");
    let mut diags = Diagnostics::default();
    let mut root = Schema::of_type(SchemaType::Object);

    for (name, param) in &template.parameters {
        let Some(kind) = ParameterType::parse(&param.type_name) else {
            diags.error(
                name,
                codes::UNSUPPORTED_TYPE,
                format!("parameter {name} has unsupported type '{}'", param.type_name),
            );
            continue;
        };
        let property = parameter_to_schema(name, kind, param, &mut diags);
        root.properties.insert(name.clone(), property);
        root.required.insert(name.clone());
    }

    SchemaResult {
        schema: root,
        diags: diags.into_vec(),
    }
}

fn parameter_to_schema(
    name: &str,
    kind: ParameterType,
    param: &TemplateParameter,
    diags: &mut Diagnostics,
) -> Schema {
    let mut schema = Schema {
        title: name.to_string(),
        description: param.metadata.description.clone().unwrap_or_default(),
        ..Schema::default()
    };
    if kind.is_secure() {
        schema.format = PASSWORD_FORMAT.to_string();
    }

    match kind {
        ParameterType::Int => {
            schema.schema_type = Some(SchemaType::Integer);
            schema.minimum = param.min_value.map(Decimal::from);
            schema.maximum = param.max_value.map(Decimal::from);
        }
        ParameterType::Bool => schema.schema_type = Some(SchemaType::Boolean),
        ParameterType::String | ParameterType::SecureString => {
            schema.schema_type = Some(SchemaType::String);
            schema.min_length = param.min_length;
            schema.max_length = param.max_length;
        }
        ParameterType::Array => {
            schema.schema_type = Some(SchemaType::Array);
            schema.min_items = param.min_length;
            schema.max_items = param.max_length;
            if let Some(Value::Array(values)) = &param.default_value
                && !values.is_empty()
            {
                schema.items = Some(Box::new(infer_items(name, values, diags)));
            }
        }
        ParameterType::Object | ParameterType::SecureObject => {
            schema.schema_type = Some(SchemaType::Object);
            if let Some(Value::Object(fields)) = &param.default_value {
                for (key, value) in fields {
                    if let Some(property) = infer_property(key, value, diags) {
                        schema.properties.insert(key.clone(), property);
                        schema.required.insert(key.clone());
                    }
                }
            }
        }
    }

    schema.enum_values = allowed_values(name, kind, param.allowed_values.as_deref(), diags);
    schema.default.clone_from(&param.default_value);
    schema
}

/// A single array-valued entry is the wrapped form of the list itself. For
/// array parameters that form is indistinguishable from one allowed array.
fn allowed_values(
    name: &str,
    kind: ParameterType,
    allowed: Option<&[Value]>,
    diags: &mut Diagnostics,
) -> Vec<Value> {
    match allowed {
        None => Vec::new(),
        Some([Value::Array(inner)]) if kind != ParameterType::Array => inner.clone(),
        Some(values @ [Value::Array(_)]) => {
            diags.warn(
                name,
                codes::AMBIGUOUS_ALLOWED_VALUES,
                format!(
                    "allowed values of array parameter {name} hold a single array; kept as one allowed value"
                ),
            );
            values.to_vec()
        }
        Some(values) => values.to_vec(),
    }
}

/// Infer a property schema from a literal. `None` means the value carries no
/// type (null) and the property is skipped.
fn infer_property(name: &str, value: &Value, diags: &mut Diagnostics) -> Option<Schema> {
    let mut schema = Schema {
        title: name.to_string(),
        ..Schema::default()
    };
    match value {
        Value::Null => {
            diags.warn(
                name,
                codes::UNKNOWN_TYPE,
                format!("type of field {name} is indeterminate (null)"),
            );
            return None;
        }
        Value::Object(fields) => {
            schema.schema_type = Some(SchemaType::Object);
            for (key, field) in fields {
                if let Some(property) = infer_property(key, field, diags) {
                    schema.properties.insert(key.clone(), property);
                    schema.required.insert(key.clone());
                }
            }
        }
        Value::Array(values) => {
            schema.schema_type = Some(SchemaType::Array);
            schema.items = Some(Box::new(infer_items(name, values, diags)));
            schema.default = Some(value.clone());
        }
        scalar => {
            schema.schema_type = Some(scalar_type(scalar));
            schema.default = Some(scalar.clone());
        }
    }
    Some(schema)
}

/// Element schema from the first element; it never carries a default.
fn infer_items(name: &str, values: &[Value], diags: &mut Diagnostics) -> Schema {
    let Some(first) = values.first() else {
        diags.warn(
            name,
            codes::UNKNOWN_TYPE,
            format!("array {name} is empty so its element type is unknown"),
        );
        return Schema {
            comment: "schemaport warning: unknown type from empty array".to_string(),
            ..Schema::default()
        };
    };
    match infer_property("", first, diags) {
        Some(mut items) => {
            items.default = None;
            items
        }
        None => Schema {
            comment: "schemaport warning: unknown type from null array element".to_string(),
            ..Schema::default()
        },
    }
}

/// Bicep has a single numeric type, so every number literal is an integer.
fn scalar_type(value: &Value) -> SchemaType {
    match value {
        Value::Bool(_) => SchemaType::Boolean,
        Value::String(_) => SchemaType::String,
        _ => SchemaType::Integer,
    }
}
