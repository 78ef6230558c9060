//! Bottom-up type derivation for expressions and lvalues

use crate::ast::{BinaryOp, Expr, LValue};
use crate::semantic::errors::SemanticError;
use crate::semantic::symbols::{ProcedureInfo, SymbolTable};
use log::trace;
use wlp4_common::Type;

/// Derives types inside one procedure against a finished symbol table
pub struct ExprTyper<'a> {
    table: &'a SymbolTable,
    procedure: &'a str,
    info: &'a ProcedureInfo,
}

impl<'a> ExprTyper<'a> {
    pub fn new(table: &'a SymbolTable, procedure: &'a str) -> Result<Self, SemanticError> {
        let info = table
            .procedure(procedure)
            .ok_or_else(|| SemanticError::UndeclaredProcedure(procedure.to_string()))?;
        Ok(Self {
            table,
            procedure,
            info,
        })
    }

    fn variable(&self, name: &str) -> Result<Type, SemanticError> {
        self.info
            .variable(name)
            .ok_or_else(|| SemanticError::UndeclaredVariable(name.to_string()))
    }

    pub fn type_of(&self, expr: &Expr) -> Result<Type, SemanticError> {
        let ty = match expr {
            Expr::Num(_) => Type::Int,
            Expr::Null => Type::IntPointer,
            Expr::Id(name) => self.variable(name)?,
            Expr::AddressOf(lvalue) => match self.lvalue_type(lvalue)? {
                Type::Int => Type::IntPointer,
                Type::IntPointer => return Err(SemanticError::AddressOfPointer),
            },
            Expr::Deref(inner) => match self.type_of(inner)? {
                Type::IntPointer => Type::Int,
                Type::Int => return Err(SemanticError::DereferenceInt),
            },
            Expr::New(size) => match self.type_of(size)? {
                Type::Int => Type::IntPointer,
                other => return Err(SemanticError::NewSize(other)),
            },
            Expr::Call { name, args } => self.call_type(name, args)?,
            Expr::Binary { op, lhs, rhs } => {
                let l = self.type_of(lhs)?;
                let r = self.type_of(rhs)?;
                self.binary_type(*op, l, r)?
            }
        };
        trace!("{}: {:?} has type {}", self.procedure, expr, ty);
        Ok(ty)
    }

    pub fn lvalue_type(&self, lvalue: &LValue) -> Result<Type, SemanticError> {
        match lvalue {
            LValue::Id(name) => self.variable(name),
            LValue::Deref(inner) => match self.type_of(inner)? {
                Type::IntPointer => Ok(Type::Int),
                Type::Int => Err(SemanticError::DereferenceInt),
            },
        }
    }

    fn binary_type(&self, op: BinaryOp, l: Type, r: Type) -> Result<Type, SemanticError> {
        use Type::*;
        match (op, l, r) {
            (BinaryOp::Add, Int, Int) => Ok(Int),
            (BinaryOp::Add, IntPointer, Int) | (BinaryOp::Add, Int, IntPointer) => Ok(IntPointer),
            (BinaryOp::Add, IntPointer, IntPointer) => Err(SemanticError::AddPointers),

            (BinaryOp::Sub, Int, Int) => Ok(Int),
            (BinaryOp::Sub, IntPointer, Int) => Ok(IntPointer),
            (BinaryOp::Sub, Int, IntPointer) => Err(SemanticError::SubtractPointerFromInt),
            (BinaryOp::Sub, IntPointer, IntPointer) => Ok(Int),

            (BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod, Int, Int) => Ok(Int),
            (op, _, _) => Err(SemanticError::PointerArithmetic {
                op,
                procedure: self.procedure.to_string(),
            }),
        }
    }

    fn call_type(&self, name: &str, args: &[Expr]) -> Result<Type, SemanticError> {
        if self.info.has_variable(name) {
            return Err(SemanticError::OvershadowedProcedure(name.to_string()));
        }
        let signature = self.table.signature(name)?;

        let arg_types = args
            .iter()
            .map(|arg| self.type_of(arg))
            .collect::<Result<Vec<_>, _>>()?;
        if arg_types.len() != signature.len() {
            return Err(SemanticError::ArgumentCount {
                callee: name.to_string(),
                expected: signature.len(),
                found: arg_types.len(),
            });
        }
        for (expected, found) in signature.iter().zip(&arg_types) {
            if expected != found {
                return Err(SemanticError::ArgumentType {
                    expected: *expected,
                    found: *found,
                });
            }
        }
        Ok(Type::Int)
    }
}
