use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use wlp4_codegen::CodegenOptions;
use wlp4_driver::{fail, init_logging, read_input, write_output, Pipeline};

#[derive(Parser, Debug)]
#[clap(
    name = "wlp4gen",
    version,
    about = "Type check a pre-order WLP4 syntax tree and generate MIPS assembly"
)]
struct Args {
    /// Pre-order tree from wlp4parse (defaults to stdin)
    input: Option<PathBuf>,

    /// Output assembly file (defaults to stdout)
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Leave comments out of the generated assembly
    #[clap(long)]
    no_comments: bool,

    /// Dump the symbol table as JSON on stderr
    #[clap(long)]
    symbols: bool,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let preorder = read_input(args.input.as_deref())?;
    let pipeline = Pipeline::wlp4().unwrap_or_else(|err| fail(err));
    let checked = pipeline.check(&preorder).unwrap_or_else(|err| fail(err));

    if args.symbols {
        eprintln!("{}", checked.symbols.to_json()?);
    }

    let options = CodegenOptions {
        comments: !args.no_comments,
    };
    let assembly = pipeline
        .generate(&checked, &options)
        .unwrap_or_else(|err| fail(err));
    write_output(args.output.as_deref(), assembly.as_bytes())
}
