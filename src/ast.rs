// File: src/ast.rs
//
// Abstract Syntax Tree (AST) definitions for the Brewin language.
// Defines the structure of parsed Brewin programs.
//
// A program is a set of function definitions. Statements (Stmt) represent
// actions and control flow, expressions (Expr) represent values and
// computations. Every node is serde-serializable so that an external parser
// can hand the interpreter a tree as JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Name given to the definition node of a lambda literal
pub const LAMBDA_NAME: &str = "lambda";

/// A whole program: the top-level function definitions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Rc<FuncDef>>,
}

/// A named function or a lambda literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

impl FuncDef {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// A formal parameter; `by_ref` marks a reference parameter (`ref x`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub by_ref: bool,
}

impl Param {
    pub fn value(name: impl Into<String>) -> Self {
        Param { name: name.into(), by_ref: false }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Param { name: name.into(), by_ref: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `target = value;`
    Assign { target: AssignTarget, value: Expr },
    /// A call whose result is discarded
    Call(Call),
    If { condition: Expr, then_branch: Vec<Stmt>, else_branch: Option<Vec<Stmt>> },
    While { condition: Expr, body: Vec<Stmt> },
    Return(Option<Expr>),
}

impl Stmt {
    /// Short statement name for diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            Stmt::Assign { .. } => "assign",
            Stmt::Call(_) => "call",
            Stmt::If { .. } => "if",
            Stmt::While { .. } => "while",
            Stmt::Return(_) => "return",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssignTarget {
    Var(String),
    Field { object: Expr, field: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Int(i64),
    Str(String),
    Bool(bool),
    Nil,
    Var(String),
    /// `object.field`
    Field { object: Box<Expr>, field: String },
    Call(Call),
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Lambda(Rc<FuncDef>),
    /// `@`
    NewObject,
}

impl Expr {
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call(Call { callee: Callee::Name(name.into()), args })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub callee: Callee,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Callee {
    /// A declared function, a built-in, or a variable holding a callable
    Name(String),
    /// `object.method(...)`
    Method { object: Box<Expr>, method: String },
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callee::Name(name) => write!(f, "{}", name),
            Callee::Method { method, .. } => write!(f, ".{}", method),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Maps an operator token to its operator
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(BinaryOp::Add),
            "-" => Some(BinaryOp::Sub),
            "*" => Some(BinaryOp::Mul),
            "/" => Some(BinaryOp::Div),
            "%" => Some(BinaryOp::Mod),
            "==" => Some(BinaryOp::Eq),
            "!=" => Some(BinaryOp::Ne),
            "<" => Some(BinaryOp::Lt),
            "<=" => Some(BinaryOp::Le),
            ">" => Some(BinaryOp::Gt),
            ">=" => Some(BinaryOp::Ge),
            "&&" => Some(BinaryOp::And),
            "||" => Some(BinaryOp::Or),
            _ => None,
        }
    }

    /// Comparison, equality and logical operators coerce Int to Bool
    pub fn is_boolean_context(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::And
                | BinaryOp::Or
        )
    }

    /// Arithmetic operators coerce Bool to Int
    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => f.write_str("-"),
            UnaryOp::Not => f.write_str("!"),
        }
    }
}
