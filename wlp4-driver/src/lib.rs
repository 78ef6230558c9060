//! WLP4 Compiler - Driver
//!
//! Each tool is a stdin to stdout filter over one pipeline stage. The
//! stages are exposed here so the binaries stay thin and the text
//! interchange between them can be tested in-process.

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use wlp4_codegen::CodegenOptions;
use wlp4_common::CompilerError;
use wlp4_frontend::{format_tokens, read_terminals, CheckedProgram, Frontend, Grammar, SyntaxTree};

/// The stages of the compiler, sharing one grammar
pub struct Pipeline {
    grammar: Grammar,
}

impl Pipeline {
    pub fn new(grammar: Grammar) -> Self {
        Self { grammar }
    }

    /// Use the built-in WLP4 grammar
    pub fn wlp4() -> Result<Self, CompilerError> {
        Ok(Self::new(Grammar::wlp4()?))
    }

    /// Use a table read from `.lr1` text
    pub fn from_lr1(text: &str) -> Result<Self, CompilerError> {
        Ok(Self::new(Grammar::from_lr1(text)?))
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Source to a `KIND lexeme` listing
    pub fn scan(&self, source: &str) -> Result<String, CompilerError> {
        Ok(format_tokens(&Frontend::scan(source)?))
    }

    /// Token listing to a pre-order syntax tree
    pub fn parse(&self, listing: &str) -> Result<String, CompilerError> {
        let terminals = read_terminals(listing)?;
        let tree = Frontend::parse_terminals(terminals, &self.grammar)?;
        Ok(tree.write_preorder())
    }

    /// Pre-order syntax tree to a checked program
    pub fn check(&self, preorder: &str) -> Result<CheckedProgram, CompilerError> {
        let tree = SyntaxTree::read_preorder(preorder, &self.grammar)?;
        Frontend::check_tree(&tree)
    }

    pub fn generate(
        &self,
        checked: &CheckedProgram,
        options: &CodegenOptions,
    ) -> Result<String, CompilerError> {
        Ok(wlp4_codegen::generate(checked, options)?)
    }

    /// Source straight to assembly text
    pub fn compile(&self, source: &str, options: &CodegenOptions) -> Result<String, CompilerError> {
        let checked = Frontend::analyze(source, &self.grammar)?;
        debug!("{} procedures checked", checked.program.procedures.len() + 1);
        self.generate(&checked, options)
    }

    /// Source to a MERL module
    pub fn compile_to_merl(
        &self,
        source: &str,
        options: &CodegenOptions,
    ) -> Result<Vec<u8>, CompilerError> {
        let text = self.compile(source, options)?;
        Ok(mips_asm::assemble(&text)?.to_bytes())
    }
}

pub fn init_logging(verbose: bool) {
    if verbose {
        env_logger::init();
    }
}

/// Read a file, or stdin when no path is given
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).context("reading stdin")?;
            Ok(text)
        }
    }
}

/// Write a file, or stdout when no path is given
pub fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => fs::write(path, bytes).with_context(|| format!("writing {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

/// Print the one-line diagnostic and exit with status 1
pub fn fail(err: CompilerError) -> ! {
    eprintln!("{}", err.diagnostic());
    std::process::exit(1);
}
