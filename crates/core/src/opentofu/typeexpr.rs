//! Type constraint expressions (`list(string)`, `object({...})`, ...).
//!
//! The constraint is parsed from the unevaluated HCL expression of a
//! variable's `type` attribute. Per-attribute defaults given through
//! `optional(T, default)` are evaluated and kept on the attribute they
//! belong to.

use hcl::eval::{Context, Evaluate};
use hcl::expr::{Expression, FuncCall, ObjectKey};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeConstraint {
    Any,
    String,
    Number,
    Bool,
    List(Box<TypeConstraint>),
    Set(Box<TypeConstraint>),
    Map(Box<TypeConstraint>),
    Tuple(Vec<TypeConstraint>),
    Object(Vec<ObjectAttribute>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectAttribute {
    pub name: String,
    pub type_constraint: TypeConstraint,
    pub optional: bool,
    /// Default from `optional(T, default)`.
    pub default: Option<Value>,
}

impl TypeConstraint {
    /// Parse a constraint from the expression of a `type` attribute.
    pub fn from_expr(expr: &Expression) -> Result<Self, String> {
        match expr {
            Expression::Variable(var) => Self::keyword(var.as_str()),
            Expression::String(legacy) => Self::legacy(legacy),
            Expression::Parenthesis(inner) => Self::from_expr(inner),
            Expression::FuncCall(call) => Self::constructor(call),
            _ => Err("a type constraint must be a type keyword or type constructor".to_string()),
        }
    }

    /// Parse a constraint from source text such as `map(list(string))`.
    pub fn parse(source: &str) -> Result<Self, String> {
        let body = hcl::parse(&format!("type = {source}\n")).map_err(|err| err.to_string())?;
        let attr = body
            .attributes()
            .next()
            .ok_or_else(|| "type cannot be empty".to_string())?;
        Self::from_expr(attr.expr())
    }

    fn keyword(name: &str) -> Result<Self, String> {
        match name {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "bool" => Ok(Self::Bool),
            "any" => Ok(Self::Any),
            "list" | "set" | "map" => Err(format!(
                "the {name} type constructor requires one argument specifying the element type"
            )),
            _ => Err(format!("the keyword \"{name}\" is not a valid type specification")),
        }
    }

    fn legacy(name: &str) -> Result<Self, String> {
        match name {
            "string" => Ok(Self::String),
            "list" => Ok(Self::List(Box::new(Self::Any))),
            "map" => Ok(Self::Map(Box::new(Self::Any))),
            _ => Err(format!("invalid legacy type name \"{name}\"")),
        }
    }

    fn constructor(call: &FuncCall) -> Result<Self, String> {
        let name = call.name.to_string();
        match (name.as_str(), call.args.as_slice()) {
            ("list", [element]) => Ok(Self::List(Box::new(Self::from_expr(element)?))),
            ("set", [element]) => Ok(Self::Set(Box::new(Self::from_expr(element)?))),
            ("map", [element]) => Ok(Self::Map(Box::new(Self::from_expr(element)?))),
            ("list" | "set" | "map", _) => Err(format!(
                "the {name} type constructor requires one argument specifying the element type"
            )),
            ("tuple", [Expression::Array(elements)]) => elements
                .iter()
                .map(Self::from_expr)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Tuple),
            ("tuple", _) => Err(
                "the tuple type constructor requires one argument specifying the element types as a list"
                    .to_string(),
            ),
            ("object", [Expression::Object(attributes)]) => {
                let mut parsed = Vec::with_capacity(attributes.len());
                for (key, expr) in attributes {
                    parsed.push(ObjectAttribute::parse(object_key(key)?, expr)?);
                }
                Ok(Self::Object(parsed))
            }
            ("object", _) => Err(
                "the object type constructor requires one argument specifying the attribute types as a map"
                    .to_string(),
            ),
            ("optional", _) => Err(
                "keyword \"optional\" is valid only as a modifier for object type attributes"
                    .to_string(),
            ),
            _ => Err(format!("unknown type constructor \"{name}\"")),
        }
    }
}

impl ObjectAttribute {
    fn parse(name: String, expr: &Expression) -> Result<Self, String> {
        let modifier = match expr {
            Expression::FuncCall(call) if call.name.to_string() == "optional" => call,
            _ => {
                return Ok(Self {
                    name,
                    type_constraint: TypeConstraint::from_expr(expr)?,
                    optional: false,
                    default: None,
                });
            }
        };
        let (type_expr, default) = match modifier.args.as_slice() {
            [type_expr] => (type_expr, None),
            [type_expr, default] => (type_expr, evaluate(default)?),
            _ => {
                return Err(format!(
                    "optional modifier of attribute \"{name}\" takes a type and an optional default"
                ));
            }
        };
        Ok(Self {
            type_constraint: TypeConstraint::from_expr(type_expr)?,
            name,
            optional: true,
            default,
        })
    }
}

fn object_key(key: &ObjectKey) -> Result<String, String> {
    match key {
        ObjectKey::Identifier(ident) => Ok(ident.to_string()),
        ObjectKey::Expression(Expression::String(name)) => Ok(name.clone()),
        ObjectKey::Expression(Expression::Variable(var)) => Ok(var.as_str().to_string()),
        _ => Err("object type attribute names must be identifiers or strings".to_string()),
    }
}

/// Evaluate a literal expression to JSON. `null` counts as no value.
pub(crate) fn evaluate(expr: &Expression) -> Result<Option<Value>, String> {
    let value = expr
        .evaluate(&Context::new())
        .map_err(|err| err.to_string())?;
    let json = serde_json::to_value(value).map_err(|err| err.to_string())?;
    Ok((!json.is_null()).then_some(json))
}
