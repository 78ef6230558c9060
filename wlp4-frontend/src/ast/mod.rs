//! Per-production model of a WLP4 program
//!
//! Each grammar production maps onto exactly one variant or struct here, so
//! later stages match exhaustively instead of inspecting child symbol lists.
//! Parenthesised expressions and lvalues have no node of their own.

pub mod conversion;

pub use conversion::{convert_program, ConversionError};

use serde::{Deserialize, Serialize};
use std::fmt;
use wlp4_common::Type;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Ordinary procedures in source order
    pub procedures: Vec<Procedure>,
    pub main: Main,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    pub params: Vec<Dcl>,
    pub body: Body,
}

/// The entry procedure `wain`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Main {
    pub first: Dcl,
    pub second: Dcl,
    pub body: Body,
}

impl Main {
    pub const NAME: &'static str = "wain";

    pub fn params(&self) -> [&Dcl; 2] {
        [&self.first, &self.second]
    }
}

/// Declarations, statements and return expression shared by both procedure forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub declarations: Vec<Declaration>,
    pub statements: Vec<Statement>,
    pub ret: Expr,
}

/// `type ID`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dcl {
    pub ty: Type,
    pub name: String,
}

/// `dcl = NUM;` or `dcl = NULL;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub dcl: Dcl,
    pub init: Initializer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Initializer {
    Num(i32),
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Assign {
        target: LValue,
        value: Expr,
    },
    If {
        test: Test,
        then_branch: Vec<Statement>,
        else_branch: Vec<Statement>,
    },
    While {
        test: Test,
        body: Vec<Statement>,
    },
    Println(Expr),
    Delete(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub op: CompareOp,
    pub lhs: Expr,
    pub rhs: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Ge,
    Gt,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
            CompareOp::Gt => ">",
        };
        write!(f, "{}", op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        };
        write!(f, "{}", op)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Num(i32),
    Null,
    Id(String),
    AddressOf(Box<LValue>),
    Deref(Box<Expr>),
    /// `new int[size]`
    New(Box<Expr>),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LValue {
    Id(String),
    Deref(Box<Expr>),
}
