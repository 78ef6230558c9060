//! Error handling for the WLP4 toolchain
//! 
//! This module defines the error type shared by every stage. Each stage keeps
//! its own narrower error enum and converts into [`CompilerError`] at the
//! crate boundary.

use std::fmt;
use thiserror::Error;

/// Main compiler error type that encompasses all phases of compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("ScanningFailure, {message}")]
    ScanningFailure { message: String },

    /// The parser could not consume the token at `position` (BOF is index 0)
    #[error("syntax error at token {position}")]
    SyntaxReject { position: usize },

    #[error("RedefinitionError, {message}")]
    Redefinition { message: String },

    #[error("UndeclaredError, {message}")]
    Undeclared { message: String },

    #[error("TypeCorrectnessError, {message}")]
    TypeCorrectness { message: String },

    #[error("TypeDerivationError, {message}")]
    TypeDerivation { message: String },

    #[error("VariableOvershadowProcedureError, {message}")]
    VariableOvershadowProcedure { message: String },

    #[error("AccessViolationError, {message}")]
    AccessViolation { message: String },

    #[error("UnknownError, {message}")]
    Unknown { message: String },

    #[error("GrammarError, {message}")]
    Grammar { message: String },

    #[error("AssemblyError, {message}")]
    Assembly { message: String },

    #[error("LinkError, {message}")]
    Link { message: String },

    #[error("IO error: {message}")]
    IoError { message: String },
}

/// Discriminant of [`CompilerError`], convenient for matching in tests and tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ScanningFailure,
    SyntaxReject,
    Redefinition,
    Undeclared,
    TypeCorrectness,
    TypeDerivation,
    VariableOvershadowProcedure,
    AccessViolation,
    Unknown,
    Grammar,
    Assembly,
    Link,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ScanningFailure => "ScanningFailure",
            ErrorKind::SyntaxReject => "SyntaxReject",
            ErrorKind::Redefinition => "RedefinitionError",
            ErrorKind::Undeclared => "UndeclaredError",
            ErrorKind::TypeCorrectness => "TypeCorrectnessError",
            ErrorKind::TypeDerivation => "TypeDerivationError",
            ErrorKind::VariableOvershadowProcedure => "VariableOvershadowProcedureError",
            ErrorKind::AccessViolation => "AccessViolationError",
            ErrorKind::Unknown => "UnknownError",
            ErrorKind::Grammar => "GrammarError",
            ErrorKind::Assembly => "AssemblyError",
            ErrorKind::Link => "LinkError",
            ErrorKind::Io => "IoError",
        };
        write!(f, "{}", name)
    }
}

impl CompilerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompilerError::ScanningFailure { .. } => ErrorKind::ScanningFailure,
            CompilerError::SyntaxReject { .. } => ErrorKind::SyntaxReject,
            CompilerError::Redefinition { .. } => ErrorKind::Redefinition,
            CompilerError::Undeclared { .. } => ErrorKind::Undeclared,
            CompilerError::TypeCorrectness { .. } => ErrorKind::TypeCorrectness,
            CompilerError::TypeDerivation { .. } => ErrorKind::TypeDerivation,
            CompilerError::VariableOvershadowProcedure { .. } => {
                ErrorKind::VariableOvershadowProcedure
            }
            CompilerError::AccessViolation { .. } => ErrorKind::AccessViolation,
            CompilerError::Unknown { .. } => ErrorKind::Unknown,
            CompilerError::Grammar { .. } => ErrorKind::Grammar,
            CompilerError::Assembly { .. } => ErrorKind::Assembly,
            CompilerError::Link { .. } => ErrorKind::Link,
            CompilerError::IoError { .. } => ErrorKind::Io,
        }
    }

    /// The single diagnostic line a tool prints to stderr before exiting
    pub fn diagnostic(&self) -> String {
        match self {
            CompilerError::SyntaxReject { position } => format!("ERROR at {}", position),
            other => format!("ERROR: {}", other),
        }
    }

    /// Create a scanning error
    pub fn scanning_failure(message: impl Into<String>) -> Self {
        CompilerError::ScanningFailure { message: message.into() }
    }

    /// Create an internal-invariant error
    pub fn access_violation(message: impl Into<String>) -> Self {
        CompilerError::AccessViolation { message: message.into() }
    }

    /// Create a should-not-happen error
    pub fn unknown(message: impl Into<String>) -> Self {
        CompilerError::Unknown { message: message.into() }
    }

    /// Create a grammar/interchange format error
    pub fn grammar(message: impl Into<String>) -> Self {
        CompilerError::Grammar { message: message.into() }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::IoError {
            message: err.to_string(),
        }
    }
}
