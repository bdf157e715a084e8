//! Typed AST consumed by the code generator
//!
//! These nodes are produced by the excluded front-end: parsed, validated, and
//! annotated with their resolved static type. The generator traverses them
//! read-only. Every expression carries exactly one resolved `Type`, stamped by
//! the type checker before lowering begins.

/// Static types of the Opal language (closed set)
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// String
    Str,
    /// Fixed-arity list; the element count is part of the type
    List(Vec<ListElement>),
    /// Reference to a class instance
    Class(String),
    /// Bound function pointer
    Fptr,
    /// The type of the `null` literal
    Null,
}

impl Type {
    /// True for types represented as raw primitives on the operand stack
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Int | Type::Bool)
    }
}

/// One declared element slot of a list type
#[derive(Debug, Clone, PartialEq)]
pub struct ListElement {
    /// Element name, when the list declares named members
    pub name: Option<String>,
    /// Element type
    pub ty: Type,
}

/// A whole program: classes in emission order
#[derive(Debug, Clone)]
pub struct Program {
    pub classes: Vec<ClassDecl>,
}

/// A class declaration
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    /// Declared parent class (single inheritance)
    pub parent: Option<String>,
    pub fields: Vec<FieldDecl>,
    /// Explicit constructor, if declared. A class without one still gets a
    /// synthesized default constructor in the output.
    pub constructor: Option<MethodDecl>,
    pub methods: Vec<MethodDecl>,
}

/// A field declaration
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub var: VarDecl,
}

/// A named, typed variable (field, parameter, or local)
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
}

/// A method declaration. Constructors are methods whose name equals the class
/// name and whose `return_type` is `None`.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<VarDecl>,
    pub locals: Vec<VarDecl>,
    /// `None` for constructors and void methods
    pub return_type: Option<Type>,
    pub body: Vec<Stmt>,
    /// Derived by the front-end: every path through the body returns
    pub always_returns: bool,
}

/// Statement (zero net stack effect after lowering)
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Assignment statement: `lhs = rhs;`
    Assign { lhs: Expr, rhs: Expr },

    /// Block: `{ ... }` (no new slot scope; slots are method-scoped)
    Block(Vec<Stmt>),

    /// Conditional: `if (c) then else other`
    If {
        condition: Expr,
        then_body: Box<Stmt>,
        else_body: Option<Box<Stmt>>,
    },

    /// Method call evaluated for its side effects
    MethodCall(Expr),

    /// Print statement: `print(arg);`
    Print(Expr),

    /// Return with optional value
    Return(Option<Expr>),

    /// Break out of the innermost loop
    Break,

    /// Continue the innermost loop
    Continue,

    /// For loop: `for (init; cond; update) body`
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Box<Stmt>>,
        body: Box<Stmt>,
    },

    /// Foreach loop over a fixed-arity list: `foreach (x in list) body`
    Foreach {
        /// The iteration variable (an identifier expression, method-local)
        variable: Expr,
        list: Expr,
        body: Box<Stmt>,
    },
}

/// Expression with its resolved static type
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    /// Resolved static type, stamped by the excluded type checker
    pub ty: Type,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type) -> Self {
        Self { kind, ty }
    }
}

/// Expression forms
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Binary operation (assignment is modeled as a binary operator)
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Unary operation
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Identifier referencing a parameter or local
    Identifier(String),

    /// List element access by index: `list[i]`
    ListIndex { list: Box<Expr>, index: Box<Expr> },

    /// Object field/method or named list member access: `obj.m`
    Member { instance: Box<Expr>, member: String },

    /// Indirect call through a bound function pointer: `callee(args...)`
    Call { callee: Box<Expr>, args: Vec<Expr> },

    /// Object construction: `new C(args...)`
    New { class_name: String, args: Vec<Expr> },

    /// The receiver reference
    This,

    /// List literal: `[e0, e1, ...]`
    ListLiteral(Vec<Expr>),

    /// Integer literal
    Int(i64),

    /// Boolean literal
    Bool(bool),

    /// String literal
    Str(String),

    /// Null literal
    Null,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Gt,
    Lt,
    Eq,
    Neq,
    And,
    Or,
    Assign,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation
    Minus,
    /// Logical not
    Not,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}
