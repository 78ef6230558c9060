//! Common types used throughout the compiler
//! 
//! WLP4 has exactly two value types. Both occupy one machine word.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of a machine word in bytes. Every WLP4 value occupies one word.
pub const WORD_SIZE: i32 = 4;

/// WLP4 value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// `int`
    Int,
    /// `int*`
    IntPointer,
}

impl Type {
    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::IntPointer)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::IntPointer => write!(f, "int*"),
        }
    }
}
