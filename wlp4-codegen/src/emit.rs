//! Rendering generated instructions as assembly text

use crate::abi::AbiError;
use crate::asm::AsmInst;
use thiserror::Error;
use wlp4_common::CompilerError;
use wlp4_frontend::SemanticError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    #[error(transparent)]
    Abi(#[from] AbiError),

    /// Type derivation failed, so the program never passed checking
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

impl From<CodegenError> for CompilerError {
    fn from(err: CodegenError) -> Self {
        match err {
            CodegenError::Abi(abi) => CompilerError::access_violation(abi.to_string()),
            CodegenError::Semantic(semantic) => semantic.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Keep comment lines and trailing comments in the output
    pub comments: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self { comments: true }
    }
}

/// Render instructions one per line into a single buffer
pub fn emit_instructions(instructions: &[AsmInst], options: &CodegenOptions) -> String {
    let mut output = String::new();
    for inst in instructions {
        if options.comments {
            output.push_str(&inst.to_string());
        } else if let Some(bare) = inst.without_comments() {
            output.push_str(&bare.to_string());
        } else {
            continue;
        }
        output.push('\n');
    }
    output
}
