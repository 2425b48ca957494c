//! Schema → `variable` blocks.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::emit::Emit;
use crate::error::Result;
use crate::result::{CodeResult, Diagnostics, codes};
use crate::schema::{AdditionalProperties, Schema, SchemaType, expand_properties, required_properties};
use crate::utils::{
    LITERAL_KEYWORDS, RESERVED_VARIABLE_NAMES, claim_identifier, escape_hcl_string, hcl_key,
    is_identifier, sanitize_identifier,
};

const INDENT: &str = "  ";

/// A type constraint as it is written back out.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    String,
    Number,
    Bool,
    Any,
    List(Box<TypeExpr>),
    Set(Box<TypeExpr>),
    Map(Box<TypeExpr>),
    Object(Vec<ObjectAttr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectAttr {
    pub name: String,
    pub ty: TypeExpr,
    pub optional: bool,
    /// Only rendered for optional attributes.
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableBlock {
    pub name: String,
    pub ty: TypeExpr,
    pub description: String,
    /// `Some(Value::Null)` renders `default = null`.
    pub default: Option<Value>,
}

/// Render every expanded property of `schema` as a `variable` block.
///
/// Constructs the type system cannot express fall back to `any` with a
/// `degraded_type` warning, so this never fails on a well-formed schema.
pub fn schema_to_opentofu(schema: &Schema) -> Result<CodeResult> {
    let mut diags = Diagnostics::default();
    let properties = expand_properties(schema);
    let required = required_properties(schema);
    debug!(variables = properties.len(), "exporting opentofu variables");

    let mut blocks = Vec::with_capacity(properties.len());
    let mut taken = HashSet::new();
    for (name, prop) in properties {
        blocks.push(VariableBlock {
            name: variable_name(name, &mut taken, &mut diags),
            ty: type_expr(prop, name, &mut diags),
            description: prop.description.clone(),
            default: prop
                .default
                .clone()
                .or_else(|| (!required.contains(name)).then_some(Value::Null)),
        });
    }

    let code = blocks
        .iter()
        .map(Emit::emit)
        .collect::<Vec<_>>()
        .join("\n");
    Ok(CodeResult {
        code,
        diags: diags.into_vec(),
    })
}

fn variable_name(name: &str, taken: &mut HashSet<String>, diags: &mut Diagnostics) -> String {
    let reserved = |ident: &str| LITERAL_KEYWORDS.contains(ident) || RESERVED_VARIABLE_NAMES.contains(ident);
    let valid = is_identifier(name, true) && !reserved(name);
    let base = if valid {
        name.to_string()
    } else {
        let sanitized = sanitize_identifier(name, true);
        if reserved(&sanitized) {
            format!("_{sanitized}")
        } else {
            sanitized
        }
    };
    let ident = claim_identifier(base.clone(), taken);
    if !valid {
        diags.warn(
            name,
            codes::INVALID_NAME,
            format!("{name} is not a valid variable name, renamed to {ident}"),
        );
    } else if ident != base {
        diags.warn(
            name,
            codes::INVALID_NAME,
            format!("{name} clashes with an earlier variable, renamed to {ident}"),
        );
    }
    ident
}

fn type_expr(node: &Schema, path: &str, diags: &mut Diagnostics) -> TypeExpr {
    match &node.schema_type {
        Some(SchemaType::String) => TypeExpr::String,
        Some(SchemaType::Integer | SchemaType::Number) => TypeExpr::Number,
        Some(SchemaType::Boolean) => TypeExpr::Bool,
        Some(SchemaType::Array) => {
            let element = match &node.items {
                Some(items) => type_expr(items, path, diags),
                None => degrade(path, format!("array {path} has no items schema"), diags),
            };
            if node.unique_items {
                TypeExpr::Set(Box::new(element))
            } else {
                TypeExpr::List(Box::new(element))
            }
        }
        Some(SchemaType::Object) => object_expr(node, path, diags),
        None if !expand_properties(node).is_empty() => object_expr(node, path, diags),
        None => degrade(path, format!("{path} has no type"), diags),
        Some(SchemaType::Other(name)) => degrade(path, format!("{path} has unsupported type {name}"), diags),
    }
}

fn degrade(path: &str, reason: String, diags: &mut Diagnostics) -> TypeExpr {
    diags.warn(path, codes::DEGRADED_TYPE, format!("{reason}, using type any"));
    TypeExpr::Any
}

/// Fixed properties always make a structural object; only a node without
/// them can become a map.
fn object_expr(node: &Schema, path: &str, diags: &mut Diagnostics) -> TypeExpr {
    let properties = expand_properties(node);
    let open = matches!(
        node.additional_properties,
        Some(AdditionalProperties::Schema(_) | AdditionalProperties::Bool(true))
    );
    if properties.is_empty() && (open || !node.pattern_properties.is_empty()) {
        return map_expr(node, path, diags);
    }

    let required = required_properties(node);
    let attrs = properties
        .into_iter()
        .map(|(name, prop)| {
            let optional = !required.contains(name);
            ObjectAttr {
                name: name.to_string(),
                ty: type_expr(prop, name, diags),
                optional,
                default: prop.default.clone().filter(|_| optional),
            }
        })
        .collect();
    TypeExpr::Object(attrs)
}

/// Map values must share one type, so only a few open-ended shapes qualify.
fn map_expr(node: &Schema, path: &str, diags: &mut Diagnostics) -> TypeExpr {
    let closed = matches!(
        node.additional_properties,
        None | Some(AdditionalProperties::Bool(false))
    );
    match &node.additional_properties {
        Some(AdditionalProperties::Schema(values)) if node.pattern_properties.is_empty() => {
            TypeExpr::Map(Box::new(type_expr(values, path, diags)))
        }
        Some(AdditionalProperties::Bool(true)) if node.pattern_properties.is_empty() => {
            degrade(path, format!("{path} allows values of any type"), diags)
        }
        _ if closed && node.pattern_properties.len() == 1 => match node.pattern_properties.values().next() {
            Some(values) => TypeExpr::Map(Box::new(type_expr(values, path, diags))),
            None => TypeExpr::Any,
        },
        _ => degrade(path, format!("{path} has more than one value schema"), diags),
    }
}

/// Render a literal on one line: `{ name = "web", ports = [80, 443] }`.
pub fn render_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("\"{}\"", escape_hcl_string(s)),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(render_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(fields) if fields.is_empty() => "{}".to_string(),
        Value::Object(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(key, field)| format!("{} = {}", hcl_key(key), render_literal(field)))
                .collect();
            format!("{{ {} }}", fields.join(", "))
        }
    }
}

impl TypeExpr {
    /// Render with nested object attributes indented below `prefix`.
    fn render(&self, prefix: &str) -> String {
        match self {
            TypeExpr::String => "string".to_string(),
            TypeExpr::Number => "number".to_string(),
            TypeExpr::Bool => "bool".to_string(),
            TypeExpr::Any => "any".to_string(),
            TypeExpr::List(element) => format!("list({})", element.render(prefix)),
            TypeExpr::Set(element) => format!("set({})", element.render(prefix)),
            TypeExpr::Map(element) => format!("map({})", element.render(prefix)),
            TypeExpr::Object(attrs) if attrs.is_empty() => "object({})".to_string(),
            TypeExpr::Object(attrs) => {
                let inner = format!("{prefix}{INDENT}");
                let keys: Vec<String> = attrs.iter().map(|attr| hcl_key(&attr.name)).collect();
                let width = keys.iter().map(String::len).max().unwrap_or_default();
                let mut out = String::from("object({\n");
                for (key, attr) in keys.iter().zip(attrs) {
                    out.push_str(&format!("{inner}{key:<width$} = {}\n", attr.render(&inner)));
                }
                out.push_str(prefix);
                out.push_str("})");
                out
            }
        }
    }
}

impl Emit for TypeExpr {
    fn emit(&self) -> String {
        self.render("")
    }
}

impl ObjectAttr {
    fn render(&self, prefix: &str) -> String {
        let ty = self.ty.render(prefix);
        match (&self.default, self.optional) {
            (_, false) => ty,
            (None, true) => format!("optional({ty})"),
            (Some(default), true) => format!("optional({ty}, {})", render_literal(default)),
        }
    }
}

impl Emit for VariableBlock {
    fn emit(&self) -> String {
        let mut attrs = vec![("type", self.ty.render(INDENT))];
        if !self.description.is_empty() {
            attrs.push((
                "description",
                format!("\"{}\"", escape_hcl_string(&self.description)),
            ));
        }
        if let Some(default) = &self.default {
            attrs.push(("default", render_literal(default)));
        }
        let width = attrs.iter().map(|(key, _)| key.len()).max().unwrap_or_default();

        let mut out = format!("variable \"{}\" {{\n", self.name);
        for (key, value) in attrs {
            out.push_str(&format!("{INDENT}{key:<width$} = {value}\n"));
        }
        out.push_str("}\n");
        out
    }
}
