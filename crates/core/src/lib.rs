//! Translation between infrastructure-as-code parameter declarations and a
//! JSON-Schema-like model.
//!
//! Importers ([`bicep::bicep_to_schema`], [`helm::helm_to_schema`],
//! [`opentofu::opentofu_to_schema`]) never fail outright: they return a
//! [`SchemaResult`] holding the best-effort schema and its diagnostics.
//! Exporters ([`bicep::schema_to_bicep`], [`opentofu::schema_to_opentofu`])
//! flatten composite schemas with [`schema::expand_properties`] and return
//! the generated code as a [`CodeResult`].

pub mod bicep;
pub mod emit;
pub mod error;
pub mod helm;
pub mod opentofu;
pub mod result;
pub mod schema;
pub mod utils;

pub use error::{Error, Result};
pub use result::{CodeResult, Diagnostic, SchemaResult, Severity};
pub use schema::Schema;
