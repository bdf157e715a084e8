//! Class hierarchy graph
//!
//! A read-only directed graph over class names, built once from the program
//! before emission. The generator's single query is nearest-owner member
//! resolution: walking parent links to decide whether a named member is a
//! field or a method.

use crate::ast::Program;
use crate::error::CodegenError;
use rustc_hash::{FxHashMap, FxHashSet};

/// What kind of member a hierarchy lookup resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// An instance field (addressed by name, loaded directly)
    Field,
    /// An instance method (materialized as a bound function pointer)
    Method,
}

/// A node in the class hierarchy
#[derive(Debug, Clone, Default)]
struct ClassNode {
    /// Declared parent class, if any
    parent: Option<String>,
    /// Names of fields declared directly on this class
    fields: FxHashSet<String>,
    /// Names of methods declared directly on this class
    methods: FxHashSet<String>,
}

/// Class hierarchy relation keyed by class name
#[derive(Debug, Default)]
pub struct ClassHierarchy {
    nodes: FxHashMap<String, ClassNode>,
}

impl ClassHierarchy {
    /// Build the hierarchy from a program's class declarations
    pub fn from_program(program: &Program) -> Self {
        let mut nodes = FxHashMap::default();
        for class in &program.classes {
            let node = ClassNode {
                parent: class.parent.clone(),
                fields: class
                    .fields
                    .iter()
                    .map(|f| f.var.name.clone())
                    .collect(),
                methods: class.methods.iter().map(|m| m.name.clone()).collect(),
            };
            nodes.insert(class.name.clone(), node);
        }
        Self { nodes }
    }

    /// Declared parent of `class`, if any
    pub fn parent_of(&self, class: &str) -> Option<&str> {
        self.nodes.get(class).and_then(|n| n.parent.as_deref())
    }

    /// Resolve `member` against `class`, walking up parent links to the
    /// nearest declared owner. A miss is a fatal contract violation: the type
    /// checker already proved the member exists.
    pub fn resolve_member(
        &self,
        class: &str,
        member: &str,
    ) -> Result<MemberKind, CodegenError> {
        let mut current = Some(class);
        while let Some(name) = current {
            let node = self
                .nodes
                .get(name)
                .ok_or_else(|| CodegenError::UnknownClass(name.to_string()))?;
            if node.fields.contains(member) {
                return Ok(MemberKind::Field);
            }
            if node.methods.contains(member) {
                return Ok(MemberKind::Method);
            }
            current = node.parent.as_deref();
        }
        Err(CodegenError::UnknownMember {
            class: class.to_string(),
            member: member.to_string(),
        })
    }
}
