//! Schema → Bicep parameter declarations.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::emit::Emit;
use crate::error::{Error, Result};
use crate::result::{CodeResult, Diagnostics, codes};
use crate::schema::{Decimal, Schema, SchemaType, expand_properties};
use crate::utils::{
    LITERAL_KEYWORDS, bicep_key, claim_identifier, escape_bicep_string, is_identifier,
    sanitize_identifier,
};

const INDENT: &str = "  ";

/// Parameter types Bicep can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BicepType {
    String,
    Int,
    Bool,
    Object,
    Array,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decorator {
    Description(String),
    Allowed(Vec<Value>),
    MinValue(Decimal),
    MaxValue(Decimal),
    MinLength(u64),
    MaxLength(u64),
    Secure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BicepParam {
    pub name: String,
    pub param_type: BicepType,
    pub decorators: Vec<Decorator>,
    pub default: Option<Value>,
}

/// Render every expanded property of `schema` as a `param` declaration.
///
/// A property whose `type` Bicep cannot express is an error.
pub fn schema_to_bicep(schema: &Schema) -> Result<CodeResult> {
    let mut diags = Diagnostics::default();
    let properties = expand_properties(schema);
    debug!(parameters = properties.len(), "exporting bicep parameters");

    let mut params = Vec::with_capacity(properties.len());
    let mut taken = HashSet::new();
    for (name, prop) in properties {
        params.push(build_param(name, prop, &mut taken, &mut diags)?);
    }

    let code = params
        .iter()
        .map(Emit::emit)
        .collect::<Vec<_>>()
        .join("\n");
    Ok(CodeResult {
        code,
        diags: diags.into_vec(),
    })
}

fn bicep_type(schema_type: Option<&SchemaType>) -> Result<BicepType> {
    match schema_type {
        Some(SchemaType::String) => Ok(BicepType::String),
        Some(SchemaType::Integer | SchemaType::Number) => Ok(BicepType::Int),
        Some(SchemaType::Boolean) => Ok(BicepType::Bool),
        Some(SchemaType::Object) | None => Ok(BicepType::Object),
        Some(SchemaType::Array) => Ok(BicepType::Array),
        Some(SchemaType::Other(name)) => Err(Error::UnknownType(name.clone())),
    }
}

fn build_param(
    name: &str,
    prop: &Schema,
    taken: &mut HashSet<String>,
    diags: &mut Diagnostics,
) -> Result<BicepParam> {
    let param_type = bicep_type(prop.schema_type.as_ref())?;

    let valid = is_identifier(name, false) && !LITERAL_KEYWORDS.contains(name);
    let base = if valid {
        name.to_string()
    } else {
        sanitize_identifier(name, false)
    };
    let ident = claim_identifier(base.clone(), taken);
    if !valid {
        diags.warn(
            name,
            codes::INVALID_NAME,
            format!("{name} is not a valid parameter name, renamed to {ident}"),
        );
    } else if ident != base {
        diags.warn(
            name,
            codes::INVALID_NAME,
            format!("{name} clashes with an earlier parameter, renamed to {ident}"),
        );
    }

    let mut decorators = Vec::new();
    if !prop.description.is_empty() {
        decorators.push(Decorator::Description(prop.description.clone()));
    }
    if !prop.enum_values.is_empty() {
        decorators.push(Decorator::Allowed(prop.enum_values.clone()));
    }
    if param_type == BicepType::Int {
        if let Some(min) = integer_bound(name, prop.minimum.as_ref(), diags) {
            decorators.push(Decorator::MinValue(min));
        }
        if let Some(max) = integer_bound(name, prop.maximum.as_ref(), diags) {
            decorators.push(Decorator::MaxValue(max));
        }
    }
    let (min, max) = match param_type {
        BicepType::String => (prop.min_length, prop.max_length),
        BicepType::Array => (prop.min_items, prop.max_items),
        _ => (None, None),
    };
    decorators.extend(min.map(Decorator::MinLength));
    decorators.extend(max.map(Decorator::MaxLength));
    if matches!(param_type, BicepType::String | BicepType::Object) && prop.is_password() {
        decorators.push(Decorator::Secure);
    }

    let default = match &prop.default {
        Some(Value::Number(n)) if param_type == BicepType::Int && !(n.is_i64() || n.is_u64()) => {
            diags.warn(
                name,
                codes::INVALID_DEFAULT,
                format!("default {n} of {name} is not an integer and was dropped"),
            );
            None
        }
        default => default.clone(),
    };

    Ok(BicepParam {
        name: ident,
        param_type,
        decorators,
        default,
    })
}

fn integer_bound(name: &str, bound: Option<&Decimal>, diags: &mut Diagnostics) -> Option<Decimal> {
    let bound = bound?;
    if bound.is_integer() {
        return Some(bound.clone());
    }
    diags.warn(
        name,
        codes::UNSUPPORTED_BOUND,
        format!("bound {bound} of {name} is not an integer and was dropped"),
    );
    None
}

/// Render a literal with nested indentation below `prefix`.
pub fn render_value(value: &Value, prefix: &str) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", escape_bicep_string(s)),
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) => {
            let inner = format!("{prefix}{INDENT}");
            let mut out = String::from("[\n");
            for item in items {
                out.push_str(&format!("{inner}{}\n", render_value(item, &inner)));
            }
            out.push_str(prefix);
            out.push(']');
            out
        }
        Value::Object(fields) if fields.is_empty() => "{}".to_string(),
        Value::Object(fields) => {
            let inner = format!("{prefix}{INDENT}");
            let mut out = String::from("{\n");
            for (key, field) in fields {
                out.push_str(&format!(
                    "{inner}{}: {}\n",
                    bicep_key(key),
                    render_value(field, &inner)
                ));
            }
            out.push_str(prefix);
            out.push('}');
            out
        }
    }
}

impl Emit for BicepType {
    fn emit(&self) -> String {
        match self {
            BicepType::String => "string".to_string(),
            BicepType::Int => "int".to_string(),
            BicepType::Bool => "bool".to_string(),
            BicepType::Object => "object".to_string(),
            BicepType::Array => "array".to_string(),
        }
    }
}

impl Emit for Decorator {
    fn emit(&self) -> String {
        match self {
            // `sys.` avoids clashing with a parameter named `description`.
            Decorator::Description(text) => {
                format!("@sys.description('{}')", escape_bicep_string(text))
            }
            Decorator::Allowed(values) => {
                format!("@allowed({})", render_value(&Value::Array(values.clone()), ""))
            }
            Decorator::MinValue(n) => format!("@minValue({n})"),
            Decorator::MaxValue(n) => format!("@maxValue({n})"),
            Decorator::MinLength(n) => format!("@minLength({n})"),
            Decorator::MaxLength(n) => format!("@maxLength({n})"),
            Decorator::Secure => "@secure()".to_string(),
        }
    }
}

impl Emit for BicepParam {
    fn emit(&self) -> String {
        let mut out = String::new();
        for decorator in &self.decorators {
            out.push_str(&decorator.emit());
            out.push('\n');
        }
        out.push_str(&format!("param {} {}", self.name, self.param_type.emit()));
        if let Some(default) = &self.default {
            out.push_str(" = ");
            out.push_str(&render_value(default, ""));
        }
        out.push('\n');
        out
    }
}
