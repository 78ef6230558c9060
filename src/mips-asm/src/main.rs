use anyhow::{Context, Result};
use clap::Parser;
use mips_asm::{AssemblerOptions, MipsAssembler, OutputFormat};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use wlp4_common::CompilerError;

#[derive(Parser, Debug)]
#[clap(name = "mips-asm", version, about = "Assemble MIPS source into a MERL module")]
struct Args {
    /// Input assembly file (defaults to stdin)
    input: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Emit bare code words loaded at address 0 instead of MERL
    #[clap(long)]
    raw: bool,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::init();
    }

    let source = match &args.input {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            source
        }
    };

    let options = AssemblerOptions {
        format: if args.raw {
            OutputFormat::Raw
        } else {
            OutputFormat::Merl
        },
    };
    let bytes = match MipsAssembler::new(options).assemble_to_bytes(&source) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("{}", CompilerError::from(err).diagnostic());
            std::process::exit(1);
        }
    };

    match args.output {
        Some(path) => fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?,
        None => io::stdout().write_all(&bytes)?,
    }

    Ok(())
}
