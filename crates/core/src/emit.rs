//! Code emission via the Emit trait.
//!
//! Exporters first build a small IR of declarations and then render each node
//! through `Emit`, so rendering rules live next to the node they belong to.

/// Trait for emitting target-language source from IR nodes.
pub trait Emit {
    /// Convert the node to its source representation.
    fn emit(&self) -> String;
}
