//! Expression lowering
//!
//! Every expression's lowering leaves exactly one value on the operand stack.
//! Integers and booleans are raw on the stack and boxed at rest (fields,
//! parameters, list elements, call arguments); the boxing/unboxing points are
//! explicit in the emitted sequences. Relational and logical operators
//! materialize their boolean result through branches to constant pushes;
//! `&&`/`||` short-circuit the second operand.

use super::{CodeGenerator, SlotKind};
use crate::ast::{BinaryOp, Expr, ExprKind, ListElement, Type, UnaryOp};
use crate::error::CodegenError;
use crate::hierarchy::MemberKind;

impl<'a> CodeGenerator<'a> {
    /// Lower an expression; net effect is one value on the stack
    pub(super) fn lower_expr(&mut self, expr: &Expr) -> Result<(), CodegenError> {
        match &expr.kind {
            ExprKind::Binary { op, lhs, rhs } => self.lower_binary(*op, lhs, rhs),
            ExprKind::Unary { op, operand } => self.lower_unary(*op, operand),
            ExprKind::Identifier(name) => self.lower_identifier(name, &expr.ty),
            ExprKind::ListIndex { list, index } => {
                self.lower_expr(list)?;
                self.lower_expr(index)?;
                self.emit("invokevirtual List/getElement(I)Ljava/lang/Object;");
                self.cast_object_to(&expr.ty)
            }
            ExprKind::Member { instance, member } => {
                self.lower_member(instance, member, &expr.ty)
            }
            ExprKind::Call { callee, args } => self.lower_call(callee, args, &expr.ty),
            ExprKind::New { class_name, args } => self.lower_new(class_name, args),
            ExprKind::This => {
                self.emit("aload_0");
                Ok(())
            }
            ExprKind::ListLiteral(elements) => self.lower_list_literal(elements),
            ExprKind::Int(value) => {
                self.emit(&format!("ldc {}", value));
                Ok(())
            }
            ExprKind::Bool(value) => {
                self.emit(if *value { "ldc 1" } else { "ldc 0" });
                Ok(())
            }
            ExprKind::Str(value) => {
                self.emit(&format!("ldc \"{}\"", value));
                Ok(())
            }
            ExprKind::Null => {
                self.emit("aconst_null");
                Ok(())
            }
        }
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<(), CodegenError> {
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                self.lower_expr(lhs)?;
                self.lower_expr(rhs)?;
                let instr = match op {
                    BinaryOp::Add => "iadd",
                    BinaryOp::Sub => "isub",
                    BinaryOp::Mul => "imul",
                    BinaryOp::Div => "idiv",
                    _ => "irem",
                };
                self.emit(instr);
                Ok(())
            }
            BinaryOp::Gt | BinaryOp::Lt | BinaryOp::Eq | BinaryOp::Neq => {
                self.lower_comparison(op, lhs, rhs)
            }
            BinaryOp::And | BinaryOp::Or => self.lower_logical(op, lhs, rhs),
            BinaryOp::Assign => self.lower_assign(lhs, rhs),
        }
    }

    /// Branch-based boolean materialization: branch-if-true to a true label,
    /// push 0, jump past, push 1 at the true label.
    fn lower_comparison(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<(), CodegenError> {
        self.lower_expr(lhs)?;
        self.lower_expr(rhs)?;

        // Equality dispatches on representation: integer compare for raw
        // primitives, reference compare for everything else.
        let primitive = lhs.ty.is_primitive() || rhs.ty.is_primitive();
        let branch = match op {
            BinaryOp::Gt => "if_icmpgt",
            BinaryOp::Lt => "if_icmplt",
            BinaryOp::Eq if primitive => "if_icmpeq",
            BinaryOp::Eq => "if_acmpeq",
            BinaryOp::Neq if primitive => "if_icmpne",
            _ => "if_acmpne",
        };

        let true_label = self.new_label();
        let after_label = self.new_label();
        self.emit(&format!("{} {}", branch, true_label));
        self.emit("ldc 0");
        self.emit(&format!("goto {}", after_label));
        self.place_label(&true_label);
        self.emit("ldc 1");
        self.place_label(&after_label);
        Ok(())
    }

    /// Short-circuit `&&`/`||`: the second operand is only evaluated when the
    /// first has not already decided the result.
    fn lower_logical(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<(), CodegenError> {
        let decided_label = self.new_label();
        let after_label = self.new_label();
        let (branch, decided_value, other_value) = match op {
            BinaryOp::And => ("ifeq", "ldc 0", "ldc 1"),
            _ => ("ifne", "ldc 1", "ldc 0"),
        };

        self.lower_expr(lhs)?;
        self.emit(&format!("{} {}", branch, decided_label));
        self.lower_expr(rhs)?;
        self.emit(&format!("{} {}", branch, decided_label));
        self.emit(other_value);
        self.emit(&format!("goto {}", after_label));
        self.place_label(&decided_label);
        self.emit(decided_value);
        self.place_label(&after_label);
        Ok(())
    }

    fn lower_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<(), CodegenError> {
        match op {
            UnaryOp::Minus => {
                self.lower_expr(operand)?;
                self.emit("ineg");
                Ok(())
            }
            UnaryOp::Not => {
                // Boolean not as subtract-from-one
                self.emit("ldc 1");
                self.lower_expr(operand)?;
                self.emit("isub");
                Ok(())
            }
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                self.lower_incdec(op, operand)
            }
        }
    }

    /// Load an identifier from its resolved slot. Parameter slots hold boxed
    /// values and are unboxed immediately after load; local and temporary
    /// slots hold raw primitives.
    fn lower_identifier(&mut self, name: &str, ty: &Type) -> Result<(), CodegenError> {
        let slot = self.slot_of(name)?;
        match slot.kind {
            SlotKind::Param => {
                self.emit(&format!("aload {}", slot.index));
                self.unbox_primitive(ty);
            }
            SlotKind::Local | SlotKind::Temp => {
                if ty.is_primitive() {
                    self.emit(&format!("iload {}", slot.index));
                } else {
                    self.emit(&format!("aload {}", slot.index));
                }
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Assignment
    // ---------------------------------------------------------------------

    /// Lower `lhs = rhs`, leaving the assigned value on the stack. The store
    /// dispatches on the target's syntactic shape; `dup` variants keep a copy
    /// of the value below the store operands so the statement-level pop is
    /// uniform.
    pub(super) fn lower_assign(&mut self, lhs: &Expr, rhs: &Expr) -> Result<(), CodegenError> {
        match &lhs.kind {
            ExprKind::Identifier(name) => {
                let slot = self.slot_of(name)?;
                self.lower_assigned_value(&lhs.ty, rhs)?;
                self.emit("dup");
                match (slot.kind, lhs.ty.is_primitive()) {
                    (SlotKind::Param, true) => {
                        self.box_primitive(&lhs.ty);
                        self.emit(&format!("astore {}", slot.index));
                    }
                    (_, true) => self.emit(&format!("istore {}", slot.index)),
                    (_, false) => self.emit(&format!("astore {}", slot.index)),
                }
                Ok(())
            }
            ExprKind::ListIndex { list, index } => {
                self.lower_expr(list)?;
                self.lower_expr(index)?;
                self.lower_assigned_value(&lhs.ty, rhs)?;
                self.box_primitive(&lhs.ty);
                self.emit("dup_x2");
                self.emit("invokevirtual List/setElement(ILjava/lang/Object;)V");
                self.unbox_primitive(&lhs.ty);
                Ok(())
            }
            ExprKind::Member { instance, member } => match &instance.ty {
                Type::Class(_) => {
                    let class_name = self.instance_class_name(instance)?;
                    self.lower_expr(instance)?;
                    self.lower_assigned_value(&lhs.ty, rhs)?;
                    self.box_primitive(&lhs.ty);
                    self.emit("dup_x1");
                    let sig = self.sig(&lhs.ty)?;
                    self.emit(&format!("putfield {}/{} {}", class_name, member, sig));
                    self.unbox_primitive(&lhs.ty);
                    Ok(())
                }
                Type::List(elements) => {
                    let position = list_member_position(elements, member)?;
                    self.lower_expr(instance)?;
                    self.emit(&format!("ldc {}", position));
                    self.lower_assigned_value(&lhs.ty, rhs)?;
                    self.box_primitive(&lhs.ty);
                    self.emit("dup_x2");
                    self.emit("invokevirtual List/setElement(ILjava/lang/Object;)V");
                    self.unbox_primitive(&lhs.ty);
                    Ok(())
                }
                _ => Err(CodegenError::UnexpectedType {
                    context: "member assignment on a non-object instance",
                }),
            },
            _ => Err(CodegenError::UnexpectedType {
                context: "assignment target",
            }),
        }
    }

    /// Lower the right-hand side of an assignment. List-typed targets take a
    /// copy of the source list (value semantics) via the copy constructor.
    fn lower_assigned_value(&mut self, target_ty: &Type, rhs: &Expr) -> Result<(), CodegenError> {
        if matches!(target_ty, Type::List(_)) {
            self.emit("new List");
            self.emit("dup");
            self.lower_expr(rhs)?;
            self.emit("invokespecial List/<init>(LList;)V");
            Ok(())
        } else {
            self.lower_expr(rhs)
        }
    }

    // ---------------------------------------------------------------------
    // Increment / decrement
    // ---------------------------------------------------------------------

    /// Pre-forms read after mutating, post-forms read before mutating. Raw
    /// integer locals mutate in place with `iinc`; boxed parameters and
    /// container targets go through read/compute/box/store.
    fn lower_incdec(&mut self, op: UnaryOp, operand: &Expr) -> Result<(), CodegenError> {
        let pre = matches!(op, UnaryOp::PreInc | UnaryOp::PreDec);
        let step = match op {
            UnaryOp::PreInc | UnaryOp::PostInc => 1,
            _ => -1,
        };
        let apply = if step > 0 { "iadd" } else { "isub" };

        match &operand.kind {
            ExprKind::Identifier(name) => {
                let slot = self.slot_of(name)?;
                match slot.kind {
                    SlotKind::Local | SlotKind::Temp => {
                        if pre {
                            self.emit(&format!("iinc {} {}", slot.index, step));
                            self.emit(&format!("iload {}", slot.index));
                        } else {
                            self.emit(&format!("iload {}", slot.index));
                            self.emit(&format!("iinc {} {}", slot.index, step));
                        }
                    }
                    SlotKind::Param => {
                        self.emit(&format!("aload {}", slot.index));
                        self.emit("invokevirtual java/lang/Integer/intValue()I");
                        if pre {
                            self.emit("ldc 1");
                            self.emit(apply);
                            self.emit("dup");
                        } else {
                            self.emit("dup");
                            self.emit("ldc 1");
                            self.emit(apply);
                        }
                        self.emit("invokestatic java/lang/Integer/valueOf(I)Ljava/lang/Integer;");
                        self.emit(&format!("astore {}", slot.index));
                    }
                }
                Ok(())
            }
            ExprKind::ListIndex { list, index } => {
                self.lower_expr(list)?;
                self.lower_expr(index)?;
                self.lower_container_incdec(pre, apply)
            }
            ExprKind::Member { instance, member } => match &instance.ty {
                Type::Class(_) => {
                    let class_name = self.instance_class_name(instance)?;
                    let sig = self.sig(&operand.ty)?;
                    let field = format!("{}/{} {}", class_name, member, sig);
                    self.lower_expr(instance)?;
                    self.emit("dup");
                    self.emit(&format!("getfield {}", field));
                    self.emit("invokevirtual java/lang/Integer/intValue()I");
                    if pre {
                        self.emit("ldc 1");
                        self.emit(apply);
                        self.emit("dup_x1");
                    } else {
                        self.emit("dup_x1");
                        self.emit("ldc 1");
                        self.emit(apply);
                    }
                    self.emit("invokestatic java/lang/Integer/valueOf(I)Ljava/lang/Integer;");
                    self.emit(&format!("putfield {}", field));
                    Ok(())
                }
                Type::List(elements) => {
                    let position = list_member_position(elements, member)?;
                    self.lower_expr(instance)?;
                    self.emit(&format!("ldc {}", position));
                    self.lower_container_incdec(pre, apply)
                }
                _ => Err(CodegenError::UnexpectedType {
                    context: "increment/decrement on a non-object member",
                }),
            },
            _ => Err(CodegenError::UnexpectedType {
                context: "increment/decrement target",
            }),
        }
    }

    /// Shared tail for list-element inc/dec: expects `[list, index]` on the
    /// stack, leaves the old (post) or new (pre) raw value.
    fn lower_container_incdec(&mut self, pre: bool, apply: &str) -> Result<(), CodegenError> {
        self.emit("dup2");
        self.emit("invokevirtual List/getElement(I)Ljava/lang/Object;");
        self.emit("checkcast java/lang/Integer");
        self.emit("invokevirtual java/lang/Integer/intValue()I");
        if pre {
            self.emit("ldc 1");
            self.emit(apply);
            self.emit("dup_x2");
        } else {
            self.emit("dup_x2");
            self.emit("ldc 1");
            self.emit(apply);
        }
        self.emit("invokestatic java/lang/Integer/valueOf(I)Ljava/lang/Integer;");
        self.emit("checkcast java/lang/Object");
        self.emit("invokevirtual List/setElement(ILjava/lang/Object;)V");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Members, calls, construction
    // ---------------------------------------------------------------------

    /// Member access on an object resolves, through the class hierarchy,
    /// whether the member is a field (direct load) or a method (bound
    /// function-pointer object). On a list it is a named element position.
    fn lower_member(
        &mut self,
        instance: &Expr,
        member: &str,
        result_ty: &Type,
    ) -> Result<(), CodegenError> {
        match &instance.ty {
            Type::Class(_) => {
                let class_name = self.instance_class_name(instance)?;
                match self.hierarchy.resolve_member(&class_name, member)? {
                    MemberKind::Field => {
                        self.lower_expr(instance)?;
                        let sig = self.sig(result_ty)?;
                        self.emit(&format!("getfield {}/{} {}", class_name, member, sig));
                        self.unbox_primitive(result_ty);
                    }
                    MemberKind::Method => {
                        self.emit("new Fptr");
                        self.emit("dup");
                        self.lower_expr(instance)?;
                        self.emit(&format!("ldc \"{}\"", member));
                        self.emit(
                            "invokespecial Fptr/<init>(Ljava/lang/Object;Ljava/lang/String;)V",
                        );
                    }
                }
                Ok(())
            }
            Type::List(elements) => {
                let position = list_member_position(elements, member)?;
                self.lower_expr(instance)?;
                self.emit(&format!("ldc {}", position));
                self.emit("invokevirtual List/getElement(I)Ljava/lang/Object;");
                self.cast_object_to(result_ty)
            }
            _ => Err(CodegenError::UnexpectedType {
                context: "member access on a non-object instance",
            }),
        }
    }

    /// Indirect call: the bound function pointer goes below the argument
    /// collection, each argument is boxed into the collection in order, and
    /// the raw `Object` result is narrowed to the call's static type.
    fn lower_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        result_ty: &Type,
    ) -> Result<(), CodegenError> {
        self.lower_expr(callee)?;

        self.emit("new java/util/ArrayList");
        self.emit("dup");
        self.emit("invokespecial java/util/ArrayList/<init>()V");
        for arg in args {
            self.emit("dup");
            self.lower_expr(arg)?;
            self.box_primitive(&arg.ty);
            self.emit("checkcast java/lang/Object");
            self.emit("invokevirtual java/util/ArrayList/add(Ljava/lang/Object;)Z");
            self.emit("pop");
        }

        self.emit("invokevirtual Fptr/invoke(Ljava/util/ArrayList;)Ljava/lang/Object;");
        self.cast_object_to(result_ty)
    }

    /// `new C(args...)`: allocate, lower and box each argument, and invoke the
    /// constructor overload selected by the boxed argument signature.
    fn lower_new(&mut self, class_name: &str, args: &[Expr]) -> Result<(), CodegenError> {
        self.emit(&format!("new {}", class_name));
        self.emit("dup");
        let mut arg_sigs = String::new();
        for arg in args {
            self.lower_expr(arg)?;
            self.box_primitive(&arg.ty);
            arg_sigs += &self.sig(&arg.ty)?;
        }
        self.emit(&format!(
            "invokespecial {}/<init>({})V",
            class_name, arg_sigs
        ));
        Ok(())
    }

    /// List literal: fresh backing collection, each element lowered, boxed,
    /// and appended in declared order, then wrapped in the list object.
    fn lower_list_literal(&mut self, elements: &[Expr]) -> Result<(), CodegenError> {
        self.emit("new List");
        self.emit("dup");
        self.emit("new java/util/ArrayList");
        self.emit("dup");
        self.emit("invokespecial java/util/ArrayList/<init>()V");
        for element in elements {
            self.emit("dup");
            self.lower_expr(element)?;
            self.box_primitive(&element.ty);
            self.emit("checkcast java/lang/Object");
            self.emit("invokevirtual java/util/ArrayList/add(Ljava/lang/Object;)Z");
            self.emit("pop");
        }
        self.emit("invokespecial List/<init>(Ljava/util/ArrayList;)V");
        Ok(())
    }

    /// Static class name of an instance expression, for hierarchy lookups and
    /// field references
    fn instance_class_name(&self, instance: &Expr) -> Result<String, CodegenError> {
        match &instance.ty {
            Type::Class(name) => Ok(name.clone()),
            _ => Err(CodegenError::UnexpectedType {
                context: "instance expression is not class-typed",
            }),
        }
    }
}

/// Position of a named member within a list type's declared element slots
fn list_member_position(
    elements: &[ListElement],
    member: &str,
) -> Result<usize, CodegenError> {
    elements
        .iter()
        .position(|element| element.name.as_deref() == Some(member))
        .ok_or_else(|| CodegenError::UnknownMember {
            class: "List".to_string(),
            member: member.to_string(),
        })
}
