pub mod choice;
pub mod compiler;
pub mod element;
pub mod parser;
pub mod validate;

use serde::Serialize;

use crate::compiler::Command;

/// A compiled procedure: the instruction program produced from one
/// top-level `<proc>` element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Procedure {
    /// Declared id (the `id` attribute of the source element).
    pub id: String,
    /// Ordered commands. Block structure is encoded purely in the indent
    /// fields plus the implicit code-0 terminators.
    pub commands: Vec<Command>,
}
