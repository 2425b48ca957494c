//! Bicep: template parameters in, `param` declarations out.

mod export;
mod import;
mod parser;
mod template;

pub use export::{BicepParam, BicepType, Decorator, render_value, schema_to_bicep};
pub use import::{bicep_to_schema, template_to_schema};
pub use template::{ParameterMetadata, ParameterType, Template, TemplateParameter};
