//! WLP4 Compiler - Code Generation
//!
//! This crate handles the final phase of compilation: lowering a checked
//! WLP4 program to MIPS assembly text. It includes:
//!
//! - The instruction model and its textual form
//! - Register roles and stack frame bookkeeping
//! - The tree-walking code generator

pub mod abi;
pub mod asm;
pub mod emit;
pub mod generator;

pub use abi::{AbiError, CallingConvention, Frame};
pub use asm::{AsmInst, Reg, Target, Word};
pub use emit::{emit_instructions, CodegenError, CodegenOptions};
pub use generator::{generate, procedure_label, Assembly, CodeGenerator};
