use thiserror::Error;
use wlp4_common::CompilerError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("line {line}: unexpected '{text}'")]
    Scanning { line: usize, text: String },

    #[error("line {line}: {message}: {text}")]
    Syntax {
        line: usize,
        text: String,
        message: String,
    },

    #[error("line {line}: duplicate label '{label}'")]
    DuplicateLabel { line: usize, label: String },

    #[error("line {line}: undefined label '{label}'")]
    UndefinedLabel { line: usize, label: String },

    #[error("line {line}: branch to '{label}' is {distance} words away")]
    BranchOutOfRange {
        line: usize,
        label: String,
        distance: i64,
    },

    #[error("line {line}: cannot branch to imported symbol '{label}'")]
    BranchToImport { line: usize, label: String },

    #[error("line {line}: .import needs MERL output")]
    ImportInRaw { line: usize },

    #[error("unresolved label '{0}' reached the encoder")]
    Unresolved(String),
}

impl From<AsmError> for CompilerError {
    fn from(err: AsmError) -> Self {
        CompilerError::Assembly {
            message: err.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerlError {
    #[error("module is {0} bytes, not a whole number of words")]
    Unaligned(usize),

    #[error("module is too short for a MERL header")]
    Truncated,

    #[error("bad MERL cookie {0:#010x}")]
    BadCookie(u32),

    #[error("header claims end of code {end_code} and end of module {end_module} in {length} bytes")]
    BadHeader {
        end_code: u32,
        end_module: u32,
        length: usize,
    },

    #[error("unknown table entry format {format:#x} at byte {offset}")]
    UnknownEntry { format: u32, offset: usize },

    #[error("table entry at byte {0} runs past the end of the module")]
    TruncatedEntry(usize),

    #[error("symbol name contains a non-ASCII word {0:#x}")]
    BadName(u32),

    #[error("entry location {0} is outside the code segment")]
    BadLocation(u32),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("nothing to link")]
    NoModules,

    #[error("duplicate export {0}")]
    DuplicateExport(String),

    #[error(transparent)]
    Merl(#[from] MerlError),
}

impl From<LinkError> for CompilerError {
    fn from(err: LinkError) -> Self {
        CompilerError::Link {
            message: err.to_string(),
        }
    }
}
