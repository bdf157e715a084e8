//! AST to assembly lowering
//!
//! Drives one pass over the whole program and produces one output unit per
//! class: header, field directives, constructor(s), methods, and the
//! process-entry stub for the distinguished `Main` class. Statement and
//! expression lowering live in the sibling modules and push instruction text
//! through the per-class emission sink.

mod control_flow;
mod expr;
mod stmt;

use crate::ast::{ClassDecl, MethodDecl, Program, Type, VarDecl};
use crate::emit::{Sink, Unit};
use crate::error::CodegenError;
use crate::hierarchy::ClassHierarchy;
use crate::repr;
use control_flow::LoopStack;

/// The universal base class chained to when a class declares no parent
const BASE_CLASS: &str = "java/lang/Object";

/// Reserved name of the program's entry class
const ENTRY_CLASS: &str = "Main";

/// Fixed locals/stack capacity declared per method block. No frame-size
/// analysis is performed; emitted code never exceeds this.
const FRAME_LIMIT: u32 = 128;

/// Where a resolved slot lives, which decides its at-rest representation:
/// parameter slots hold boxed values (the call convention passes objects
/// through `Fptr.invoke`), local and temporary slots hold raw primitives for
/// Int/Bool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Declared parameter (slots from 1; slot 0 is the receiver)
    Param,
    /// Declared local variable (slots after the parameter region)
    Local,
    /// Compiler-introduced temporary (disjoint region after the locals)
    Temp,
}

/// A resolved storage slot within the current method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub index: usize,
    pub kind: SlotKind,
}

/// Lowers a fully typed program into one assembly unit per class.
///
/// Per-class state (label counter, sink) is reset at class entry; per-method
/// state (temporary-slot counter, loop-control stack binding) is reset at
/// method entry. The input AST and hierarchy are read-only.
pub struct CodeGenerator<'a> {
    hierarchy: &'a ClassHierarchy,
    sink: Sink,
    current_class: Option<&'a ClassDecl>,
    current_method: Option<&'a MethodDecl>,
    /// Count of temporaries handed out in the current method
    temp_counter: usize,
    /// Next label number, reset at class entry
    next_label: u32,
    loop_stack: LoopStack,
}

/// Lower `program` to one unit per class, in declaration order.
pub fn generate(
    program: &Program,
    hierarchy: &ClassHierarchy,
) -> Result<Vec<Unit>, CodegenError> {
    let mut generator = CodeGenerator::new(hierarchy);
    program
        .classes
        .iter()
        .map(|class| generator.lower_class(class))
        .collect()
}

impl<'a> CodeGenerator<'a> {
    /// Create a generator over a read-only class hierarchy
    pub fn new(hierarchy: &'a ClassHierarchy) -> Self {
        Self {
            hierarchy,
            sink: Sink::default(),
            current_class: None,
            current_method: None,
            temp_counter: 0,
            next_label: 0,
            loop_stack: LoopStack::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Class/unit emission
    // ---------------------------------------------------------------------

    /// Emit the full unit for one class
    pub fn lower_class(&mut self, class: &'a ClassDecl) -> Result<Unit, CodegenError> {
        self.current_class = Some(class);
        self.next_label = 0;
        self.sink.open(&class.name);

        self.emit(&format!(".class public {}", class.name));
        self.emit(&format!(".super {}", self.superclass_name()));

        for field in &class.fields {
            let sig = self.sig(&field.var.ty)?;
            self.emit(&format!(".field public {} {}", field.var.name, sig));
        }

        if let Some(constructor) = &class.constructor {
            // A declared constructor with arguments does not replace the
            // zero-argument one: subclass default constructors chain to the
            // parent's `<init>()V`, so every class must expose it.
            if !constructor.params.is_empty() {
                self.emit_default_constructor()?;
            }
            self.begin_method(constructor);
            self.lower_constructor(constructor)?;
        } else {
            self.emit_default_constructor()?;
        }

        if class.name == ENTRY_CLASS {
            self.emit_entry_stub();
        }

        for method in &class.methods {
            self.begin_method(method);
            self.lower_method(method)?;
        }

        Ok(self.sink.close())
    }

    /// Synthesized zero-argument constructor: chain to the superclass
    /// constructor, then default-initialize every field in declaration order.
    fn emit_default_constructor(&mut self) -> Result<(), CodegenError> {
        self.emit(".method public <init>()V");
        self.emit(&format!(".limit locals {}", FRAME_LIMIT));
        self.emit(&format!(".limit stack {}", FRAME_LIMIT));

        self.emit("aload_0");
        self.emit(&format!("invokespecial {}/<init>()V", self.superclass_name()));
        self.emit_field_defaults()?;

        self.emit("return");
        self.emit(".end method");
        Ok(())
    }

    /// Declared constructor: `<init>` header with the declared parameter
    /// signature, superclass chaining and field defaulting prepended to the
    /// lowered body.
    fn lower_constructor(&mut self, constructor: &MethodDecl) -> Result<(), CodegenError> {
        let params = self.param_signatures(&constructor.params)?;
        self.emit(&format!(".method public <init>({})V", params));
        self.emit(&format!(".limit locals {}", FRAME_LIMIT));
        self.emit(&format!(".limit stack {}", FRAME_LIMIT));

        self.emit("aload_0");
        self.emit(&format!("invokespecial {}/<init>()V", self.superclass_name()));
        self.emit_field_defaults()?;

        self.lower_method_body(constructor)?;
        self.emit(".end method");
        Ok(())
    }

    /// Ordinary method: header with the declared signature, locals
    /// default-initialized, body lowered, implicit return unless every path
    /// already returns.
    fn lower_method(&mut self, method: &MethodDecl) -> Result<(), CodegenError> {
        let params = self.param_signatures(&method.params)?;
        let ret = match &method.return_type {
            Some(ty) => self.sig(ty)?,
            None => "V".to_string(),
        };
        self.emit(&format!(".method public {}({}){}", method.name, params, ret));
        self.emit(&format!(".limit locals {}", FRAME_LIMIT));
        self.emit(&format!(".limit stack {}", FRAME_LIMIT));

        self.lower_method_body(method)?;
        self.emit(".end method");
        Ok(())
    }

    /// Locals then statements then the trailing implicit return
    fn lower_method_body(&mut self, method: &MethodDecl) -> Result<(), CodegenError> {
        for local in &method.locals {
            self.lower_local_decl(local)?;
        }
        for stmt in &method.body {
            self.lower_stmt(stmt)?;
        }
        if !method.always_returns {
            self.emit("return");
        }
        Ok(())
    }

    /// Bind a local's storage slot and initialize it to its type's default
    fn lower_local_decl(&mut self, local: &VarDecl) -> Result<(), CodegenError> {
        let default = repr::default_value(&local.ty, self.class_name())?;
        self.emit(&default);
        let slot = self.slot_of(&local.name)?;
        if local.ty.is_primitive() {
            self.emit(&format!("istore {}", slot.index));
        } else {
            self.emit(&format!("astore {}", slot.index));
        }
        Ok(())
    }

    /// Per-field: receiver, default value (boxed for primitives, since field
    /// slots hold boxed references), store.
    fn emit_field_defaults(&mut self) -> Result<(), CodegenError> {
        let class = self.class();
        for field in &class.fields {
            let ty = field.var.ty.clone();
            let name = field.var.name.clone();
            self.emit("aload_0");
            let default = repr::default_value(&ty, self.class_name())?;
            self.emit(&default);
            self.box_primitive(&ty);
            let sig = self.sig(&ty)?;
            self.emit(&format!("putfield {}/{} {}", self.class_name(), name, sig));
        }
        Ok(())
    }

    /// Process-entry stub on the entry class: construct one instance of
    /// itself and return.
    fn emit_entry_stub(&mut self) {
        self.emit(".method public static main([Ljava/lang/String;)V");
        self.emit(&format!(".limit locals {}", FRAME_LIMIT));
        self.emit(&format!(".limit stack {}", FRAME_LIMIT));

        self.emit(&format!("new {}", ENTRY_CLASS));
        self.emit("dup");
        self.emit(&format!("invokespecial {}/<init>()V", ENTRY_CLASS));
        self.emit("return");
        self.emit(".end method");
    }

    // ---------------------------------------------------------------------
    // Name resolution: slots and labels
    // ---------------------------------------------------------------------

    /// Resolve `name` to its storage slot: parameters from slot 1, then
    /// locals continuing after the parameter region. Slot 0 is reserved for
    /// the receiver and never returned. A miss is a front-end contract
    /// violation, not a recoverable condition.
    fn slot_of(&self, name: &str) -> Result<Slot, CodegenError> {
        let method = self.method();
        let mut index = 1;
        for param in &method.params {
            if param.name == name {
                return Ok(Slot {
                    index,
                    kind: SlotKind::Param,
                });
            }
            index += 1;
        }
        for local in &method.locals {
            if local.name == name {
                return Ok(Slot {
                    index,
                    kind: SlotKind::Local,
                });
            }
            index += 1;
        }
        Err(CodegenError::UnresolvedSlot {
            name: name.to_string(),
            method: method.name.clone(),
        })
    }

    /// Allocate the next unused temporary slot; strictly increasing, never
    /// reused within one method.
    fn temp_slot(&mut self) -> Slot {
        let method = self.method();
        self.temp_counter += 1;
        Slot {
            index: method.params.len() + method.locals.len() + self.temp_counter,
            kind: SlotKind::Temp,
        }
    }

    /// Fresh branch-target label, unique within the current class
    fn new_label(&mut self) -> String {
        let label = format!("{}{}", crate::emit::LABEL_PREFIX, self.next_label);
        self.next_label += 1;
        label
    }

    /// Bind method-scoped state: slot table layout and temporary counter
    fn begin_method(&mut self, method: &'a MethodDecl) {
        self.current_method = Some(method);
        self.temp_counter = 0;
    }

    // ---------------------------------------------------------------------
    // Shared emission helpers
    // ---------------------------------------------------------------------

    fn emit(&mut self, command: &str) {
        self.sink.push(command);
    }

    /// Place a branch-target label in the instruction stream
    fn place_label(&mut self, label: &str) {
        self.emit(&format!("{}:", label));
    }

    fn class(&self) -> &'a ClassDecl {
        self.current_class.expect("lowering outside a class")
    }

    fn class_name(&self) -> &str {
        &self.class().name
    }

    fn method(&self) -> &'a MethodDecl {
        self.current_method.expect("lowering outside a method")
    }

    fn superclass_name(&self) -> String {
        match &self.class().parent {
            Some(parent) => parent.clone(),
            None => BASE_CLASS.to_string(),
        }
    }

    fn sig(&self, ty: &Type) -> Result<String, CodegenError> {
        repr::signature(ty, self.class_name())
    }

    fn sig_class(&self, ty: &Type) -> Result<String, CodegenError> {
        repr::signature_class(ty, self.class_name())
    }

    fn param_signatures(&self, params: &[VarDecl]) -> Result<String, CodegenError> {
        let mut out = String::new();
        for param in params {
            out += &self.sig(&param.ty)?;
        }
        Ok(out)
    }

    /// Box a raw primitive value on the stack into its reference container
    fn box_primitive(&mut self, ty: &Type) {
        match ty {
            Type::Int => {
                self.emit("invokestatic java/lang/Integer/valueOf(I)Ljava/lang/Integer;");
            }
            Type::Bool => {
                self.emit("invokestatic java/lang/Boolean/valueOf(Z)Ljava/lang/Boolean;");
            }
            _ => {}
        }
    }

    /// Unbox a boxed primitive reference on the stack into its raw value
    fn unbox_primitive(&mut self, ty: &Type) {
        match ty {
            Type::Int => self.emit("invokevirtual java/lang/Integer/intValue()I"),
            Type::Bool => self.emit("invokevirtual java/lang/Boolean/booleanValue()Z"),
            _ => {}
        }
    }

    /// Narrow a raw `java/lang/Object` on the stack to `ty`'s representation:
    /// checkcast to the signature class, then unbox primitives. `Null` (void
    /// results) is left untouched.
    fn cast_object_to(&mut self, ty: &Type) -> Result<(), CodegenError> {
        if matches!(ty, Type::Null) {
            return Ok(());
        }
        let class = self.sig_class(ty)?;
        self.emit(&format!("checkcast {}", class));
        self.unbox_primitive(ty);
        Ok(())
    }
}
