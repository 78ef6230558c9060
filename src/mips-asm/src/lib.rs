//! Relocating assembler and linker for the MIPS subset emitted by the
//! WLP4 code generator.
//!
//! Source is assembled into [`MerlModule`]s, which the [`Linker`] can
//! combine. Raw output skips the MERL header and loads at address 0.

pub mod assembler;
pub mod encoder;
pub mod error;
pub mod linker;
pub mod merl;
pub mod parser;
pub mod types;

pub use assembler::MipsAssembler;
pub use encoder::InstructionEncoder;
pub use error::{AsmError, LinkError, MerlError};
pub use linker::Linker;
pub use merl::{Entry, MerlModule, HEADER_SIZE, MERL_COOKIE};
pub use parser::Parser;
pub use types::{
    AssemblerOptions, BranchTarget, Instruction, InstructionFormat, Item, Opcode, OutputFormat,
    ParsedLine, WordValue, WORD_SIZE,
};

pub fn assemble(source: &str) -> Result<MerlModule, AsmError> {
    MipsAssembler::new(AssemblerOptions::default()).assemble(source)
}

pub fn link(modules: Vec<MerlModule>) -> Result<MerlModule, LinkError> {
    Linker::new().link(modules)
}
