//! Code generation errors
//!
//! The generator consumes an already-typed, already-validated AST, so none of
//! these are user-facing diagnostics. Every variant signals a broken contract
//! with the front-end; generation of the current unit halts rather than
//! emitting corrupt output.

use crate::ast::Type;
use thiserror::Error;

/// Internal-consistency failures during code generation
#[derive(Debug, Error)]
pub enum CodegenError {
    /// A name resolved to no parameter or local slot in the current method
    #[error("no slot for identifier `{name}` in method `{method}`")]
    UnresolvedSlot {
        /// The identifier that failed to resolve
        name: String,
        /// The method whose slot table was searched
        method: String,
    },

    /// A class name has no node in the class hierarchy
    #[error("unknown class `{0}` in hierarchy lookup")]
    UnknownClass(String),

    /// A member was not declared by the class or any of its ancestors
    #[error("class `{class}` has no member `{member}`")]
    UnknownMember {
        /// The class the lookup started from
        class: String,
        /// The missing member name
        member: String,
    },

    /// `break` or `continue` lowered with no enclosing loop
    #[error("break/continue outside of a loop")]
    LoopControlOutsideLoop,

    /// A type with no runtime representation reached the mapper
    #[error("type {0:?} has no runtime representation")]
    UnrepresentableType(Type),

    /// An expression's static type contradicts its syntactic position
    #[error("type mismatch in {context}")]
    UnexpectedType {
        /// Where the mismatch was detected
        context: &'static str,
    },

    /// Failure writing an emitted unit
    #[error("I/O error writing unit: {0}")]
    Io(#[from] std::io::Error),
}
