//! WLP4 Compiler - Common Types and Utilities
//! 
//! This crate contains shared types, error definitions, and machine constants
//! used across all stages of the WLP4 toolchain.

pub mod error;
pub mod types;

pub use error::{CompilerError, ErrorKind};
pub use types::{Type, WORD_SIZE};
