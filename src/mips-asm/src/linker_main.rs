use anyhow::{Context, Result};
use clap::Parser;
use mips_asm::{Linker, MerlModule};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use wlp4_common::CompilerError;

#[derive(Parser, Debug)]
#[clap(name = "mips-link", version, about = "Link MERL modules into one")]
struct Args {
    /// Input MERL files, in link order
    #[clap(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (defaults to stdout)
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Write the linked module as JSON instead of MERL bytes
    #[clap(long)]
    json: bool,

    /// Log progress and print a listing of the result to stderr
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::init();
    }

    let mut modules = Vec::new();
    for path in &args.inputs {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        match MerlModule::from_bytes(&bytes) {
            Ok(module) => modules.push(module),
            Err(err) => fail(
                CompilerError::Link {
                    message: format!("{}: {}", path.display(), err),
                }
                .diagnostic(),
            ),
        }
    }

    let linked = match Linker::new().link(modules) {
        Ok(linked) => linked,
        Err(err) => fail(CompilerError::from(err).diagnostic()),
    };

    if args.verbose {
        eprint!("{}", linked.describe());
    }

    let bytes = if args.json {
        serde_json::to_vec_pretty(&linked)?
    } else {
        linked.to_bytes()
    };
    match args.output {
        Some(path) => fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?,
        None => io::stdout().write_all(&bytes)?,
    }

    Ok(())
}

fn fail(diagnostic: String) -> ! {
    eprintln!("{}", diagnostic);
    std::process::exit(1);
}
