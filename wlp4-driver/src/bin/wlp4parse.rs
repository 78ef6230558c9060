use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use wlp4_driver::{fail, init_logging, read_input, write_output, Pipeline};

#[derive(Parser, Debug)]
#[clap(
    name = "wlp4parse",
    version,
    about = "Parse a WLP4 token listing into a pre-order syntax tree"
)]
struct Args {
    /// Token listing from wlp4scan (defaults to stdin)
    input: Option<PathBuf>,

    /// LR(1) table in .lr1 format, instead of the built-in WLP4 grammar
    #[clap(long, value_name = "FILE")]
    grammar: Option<PathBuf>,

    /// Print the grammar table in .lr1 format and exit
    #[clap(long)]
    emit_table: bool,

    /// Verbose output; traces every shift and reduce
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let pipeline = match &args.grammar {
        Some(path) => Pipeline::from_lr1(&read_input(Some(path))?),
        None => Pipeline::wlp4(),
    }
    .unwrap_or_else(|err| fail(err));

    if args.emit_table {
        return write_output(None, pipeline.grammar().to_lr1().as_bytes());
    }

    let listing = read_input(args.input.as_deref())?;
    let tree = pipeline.parse(&listing).unwrap_or_else(|err| fail(err));
    write_output(None, tree.as_bytes())
}
