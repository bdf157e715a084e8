//! Opal language backend
//!
//! Lowers a type-annotated Opal AST into textual stack-machine assembly, one
//! unit per class, for an external assembler to turn into executable object
//! code. The front-end (lexing, parsing, symbol table, type checking,
//! hierarchy validation) is an external collaborator: the generator consumes
//! an already-typed, already-validated AST plus a read-only class-hierarchy
//! relation, and produces only assembly text.
//!
//! Pipeline position:
//!
//! ```text
//! source → [front-end] → typed AST + hierarchy → generate() → units → [assembler]
//! ```

pub mod ast;
pub mod emit;
pub mod error;
pub mod hierarchy;
pub mod lower;
pub mod repr;

pub use emit::{write_units, Unit};
pub use error::CodegenError;
pub use hierarchy::{ClassHierarchy, MemberKind};
pub use lower::{generate, CodeGenerator};
