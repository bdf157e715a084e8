//! Statement lowering
//!
//! Converts AST statements to instruction sequences with zero net stack
//! effect. Structured control flow is linearized with branches and labels;
//! sub-expressions delegate to expression lowering. Values left behind by
//! expression statements are popped explicitly so stack-depth accounting
//! stays correct.

use super::control_flow::LoopContext;
use super::CodeGenerator;
use crate::ast::{Expr, Stmt, Type};
use crate::error::CodegenError;

impl<'a> CodeGenerator<'a> {
    /// Lower a statement
    pub(super) fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match stmt {
            Stmt::Assign { lhs, rhs } => {
                // Desugars to the binary assign operator; the value it leaves
                // on the stack is discarded here.
                self.lower_assign(lhs, rhs)?;
                self.emit("pop");
                Ok(())
            }
            Stmt::Block(stmts) => {
                for stmt in stmts {
                    self.lower_stmt(stmt)?;
                }
                Ok(())
            }
            Stmt::If {
                condition,
                then_body,
                else_body,
            } => self.lower_if(condition, then_body, else_body.as_deref()),
            Stmt::MethodCall(call) => {
                // Lowered for side effects only; the result is discarded.
                self.lower_expr(call)?;
                self.emit("pop");
                Ok(())
            }
            Stmt::Print(arg) => self.lower_print(arg),
            Stmt::Return(value) => self.lower_return(value.as_ref()),
            Stmt::Break => {
                let target = self
                    .loop_stack
                    .current()
                    .ok_or(CodegenError::LoopControlOutsideLoop)?
                    .break_label
                    .clone();
                self.emit(&format!("goto {}", target));
                Ok(())
            }
            Stmt::Continue => {
                let target = self
                    .loop_stack
                    .current()
                    .ok_or(CodegenError::LoopControlOutsideLoop)?
                    .continue_label
                    .clone();
                self.emit(&format!("goto {}", target));
                Ok(())
            }
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => self.lower_for(
                init.as_deref(),
                condition.as_ref(),
                update.as_deref(),
                body,
            ),
            Stmt::Foreach {
                variable,
                list,
                body,
            } => self.lower_foreach(variable, list, body),
        }
    }

    fn lower_if(
        &mut self,
        condition: &Expr,
        then_body: &Stmt,
        else_body: Option<&Stmt>,
    ) -> Result<(), CodegenError> {
        self.lower_expr(condition)?;

        let else_label = self.new_label();
        let after_label = self.new_label();

        self.emit(&format!("ifeq {}", else_label));
        self.lower_stmt(then_body)?;
        self.emit(&format!("goto {}", after_label));
        self.place_label(&else_label);
        if let Some(else_body) = else_body {
            self.lower_stmt(else_body)?;
        }
        self.place_label(&after_label);
        Ok(())
    }

    /// Push the output stream, lower the argument, invoke the print operation
    /// chosen by the argument's static type. Primitive arguments are boxed to
    /// match the invoked signature.
    fn lower_print(&mut self, arg: &Expr) -> Result<(), CodegenError> {
        self.emit("getstatic java/lang/System/out Ljava/io/PrintStream;");
        self.lower_expr(arg)?;
        self.box_primitive(&arg.ty);
        let sig = self.sig(&arg.ty)?;
        self.emit(&format!("invokevirtual java/io/PrintStream/print({})V", sig));
        Ok(())
    }

    fn lower_return(&mut self, value: Option<&Expr>) -> Result<(), CodegenError> {
        match value {
            None => {
                self.emit("return");
            }
            Some(expr) => {
                self.lower_expr(expr)?;
                let integer_return = matches!(
                    self.method().return_type,
                    Some(Type::Int | Type::Bool)
                );
                if integer_return {
                    self.emit("ireturn");
                } else {
                    self.emit("areturn");
                }
            }
        }
        Ok(())
    }

    /// Layout: init once, continue label, condition (exit on false), body,
    /// update, jump back, break label. `continue` re-tests the condition
    /// without running the update.
    fn lower_for(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        update: Option<&Stmt>,
        body: &Stmt,
    ) -> Result<(), CodegenError> {
        let continue_label = self.new_label();
        let break_label = self.new_label();
        self.loop_stack
            .push(LoopContext::new(break_label.clone(), continue_label.clone()));

        if let Some(init) = init {
            self.lower_stmt(init)?;
        }
        self.place_label(&continue_label);
        if let Some(condition) = condition {
            self.lower_expr(condition)?;
            self.emit(&format!("ifeq {}", break_label));
        }
        self.lower_stmt(body)?;
        if let Some(update) = update {
            self.lower_stmt(update)?;
        }
        self.emit(&format!("goto {}", continue_label));
        self.place_label(&break_label);

        self.loop_stack.pop();
        Ok(())
    }

    /// Explicit index-counted loop over the statically-known element count of
    /// the list's type. The list is evaluated once into a temporary; the
    /// iteration variable is rebound at the top of every turn.
    fn lower_foreach(
        &mut self,
        variable: &Expr,
        list: &Expr,
        body: &Stmt,
    ) -> Result<(), CodegenError> {
        let element_count = match &list.ty {
            Type::List(elements) => elements.len(),
            _ => {
                return Err(CodegenError::UnexpectedType {
                    context: "foreach over a non-list expression",
                })
            }
        };

        let continue_label = self.new_label();
        let break_label = self.new_label();
        self.loop_stack
            .push(LoopContext::new(break_label.clone(), continue_label.clone()));

        // Evaluate the list once
        let list_slot = self.temp_slot();
        self.lower_expr(list)?;
        self.emit(&format!("astore {}", list_slot.index));

        // Index temporary starts at 0
        let index_slot = self.temp_slot();
        self.emit("ldc 0");
        self.emit(&format!("istore {}", index_slot.index));

        self.place_label(&continue_label);
        self.emit(&format!("iload {}", index_slot.index));
        self.emit(&format!("ldc {}", element_count));
        self.emit(&format!("if_icmpge {}", break_label));

        self.bind_foreach_variable(variable, list_slot.index, index_slot.index)?;
        self.lower_stmt(body)?;

        self.emit(&format!("iinc {} 1", index_slot.index));
        self.emit(&format!("goto {}", continue_label));
        self.place_label(&break_label);

        self.loop_stack.pop();
        Ok(())
    }

    /// `variable = list[index]` at the top of each iteration
    fn bind_foreach_variable(
        &mut self,
        variable: &Expr,
        list_slot: usize,
        index_slot: usize,
    ) -> Result<(), CodegenError> {
        let name = match &variable.kind {
            crate::ast::ExprKind::Identifier(name) => name.clone(),
            _ => {
                return Err(CodegenError::UnexpectedType {
                    context: "foreach variable is not an identifier",
                })
            }
        };

        self.emit(&format!("aload {}", list_slot));
        self.emit(&format!("iload {}", index_slot));
        self.emit("invokevirtual List/getElement(I)Ljava/lang/Object;");
        let class = self.sig_class(&variable.ty)?;
        self.emit(&format!("checkcast {}", class));

        let slot = self.slot_of(&name)?;
        if variable.ty.is_primitive() && slot.kind != super::SlotKind::Param {
            self.unbox_primitive(&variable.ty);
            self.emit(&format!("istore {}", slot.index));
        } else {
            self.emit(&format!("astore {}", slot.index));
        }
        Ok(())
    }
}
