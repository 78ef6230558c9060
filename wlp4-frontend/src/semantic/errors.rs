//! Semantic analysis error definitions
//!
//! Each variant belongs to exactly one kind of the shared error taxonomy;
//! [`SemanticError::kind`] records which.

use crate::ast::BinaryOp;
use thiserror::Error;
use wlp4_common::{CompilerError, ErrorKind, Type};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("redefinition of procedure {0}")]
    RedefinedProcedure(String),

    #[error("redefinition of variable {0}")]
    RedefinedVariable(String),

    #[error("variable {0} is used without being declared")]
    UndeclaredVariable(String),

    #[error("procedure {0} is used without being declared")]
    UndeclaredProcedure(String),

    #[error("procedure {0} is overshadowed by variable with the same name, therefore cannot be called.")]
    OvershadowedProcedure(String),

    #[error("cannot add two int*")]
    AddPointers,

    #[error("cannot subtract int* from int")]
    SubtractPointerFromInt,

    #[error("& must be used with int")]
    AddressOfPointer,

    #[error("cannot dereference an int")]
    DereferenceInt,

    #[error("new [] must use int parameter, instead {0} is given")]
    NewSize(Type),

    #[error("invalid operation: {op} cannot be used with int* in {procedure}")]
    PointerArithmetic { op: BinaryOp, procedure: String },

    #[error("invalid number of arguments: {callee} expects {expected}, got {found}")]
    ArgumentCount {
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("procedure expected {expected}, got {found}")]
    ArgumentType { expected: Type, found: Type },

    #[error("comparison between {lhs} and {rhs}")]
    Comparison { lhs: Type, rhs: Type },

    #[error("cannot assign {value} to {target}")]
    Assignment { target: Type, value: Type },

    #[error("cannot assign NUM to {0}")]
    NumInitializer(Type),

    #[error("cannot assign NULL to {0}")]
    NullInitializer(Type),

    #[error("println must use int parameter, instead {0} is given")]
    PrintlnArgument(Type),

    #[error("delete [] must use int* parameter, instead {0} is given")]
    DeleteArgument(Type),

    #[error("wain must have int as second argument")]
    WainSecondParameter,

    #[error("wain must return int")]
    WainReturn,

    #[error("procedure {0} must return int")]
    ProcedureReturn(String),

    #[error("procedure {procedure} or variable {name} does not exist")]
    MissingSymbol { procedure: String, name: String },
}

impl SemanticError {
    pub fn kind(&self) -> ErrorKind {
        use SemanticError::*;
        match self {
            RedefinedProcedure(_) | RedefinedVariable(_) => ErrorKind::Redefinition,
            UndeclaredVariable(_) | UndeclaredProcedure(_) => ErrorKind::Undeclared,
            OvershadowedProcedure(_) => ErrorKind::VariableOvershadowProcedure,
            AddPointers
            | SubtractPointerFromInt
            | AddressOfPointer
            | DereferenceInt
            | NewSize(_)
            | PointerArithmetic { .. }
            | ArgumentCount { .. }
            | ArgumentType { .. } => ErrorKind::TypeDerivation,
            Comparison { .. }
            | Assignment { .. }
            | NumInitializer(_)
            | NullInitializer(_)
            | PrintlnArgument(_)
            | DeleteArgument(_)
            | WainSecondParameter
            | WainReturn
            | ProcedureReturn(_) => ErrorKind::TypeCorrectness,
            MissingSymbol { .. } => ErrorKind::AccessViolation,
        }
    }
}

impl From<SemanticError> for CompilerError {
    fn from(err: SemanticError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Redefinition => CompilerError::Redefinition { message },
            ErrorKind::Undeclared => CompilerError::Undeclared { message },
            ErrorKind::VariableOvershadowProcedure => {
                CompilerError::VariableOvershadowProcedure { message }
            }
            ErrorKind::TypeDerivation => CompilerError::TypeDerivation { message },
            ErrorKind::TypeCorrectness => CompilerError::TypeCorrectness { message },
            ErrorKind::AccessViolation => CompilerError::AccessViolation { message },
            _ => CompilerError::Unknown { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_keeps_kind_and_message() {
        let err: CompilerError = SemanticError::AddPointers.into();
        assert_eq!(err.diagnostic(), "ERROR: TypeDerivationError, cannot add two int*");

        let err: CompilerError = SemanticError::Comparison {
            lhs: Type::Int,
            rhs: Type::IntPointer,
        }
        .into();
        assert_eq!(
            err.diagnostic(),
            "ERROR: TypeCorrectnessError, comparison between int and int*"
        );

        let err: CompilerError = SemanticError::OvershadowedProcedure("f".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::VariableOvershadowProcedure);
    }
}
