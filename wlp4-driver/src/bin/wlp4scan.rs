use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use wlp4_driver::{fail, init_logging, read_input, write_output, Pipeline};

#[derive(Parser, Debug)]
#[clap(name = "wlp4scan", version, about = "Tokenize WLP4 source into KIND lexeme lines")]
struct Args {
    /// Input WLP4 source (defaults to stdin)
    input: Option<PathBuf>,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let source = read_input(args.input.as_deref())?;
    let pipeline = Pipeline::wlp4().unwrap_or_else(|err| fail(err));
    let listing = pipeline.scan(&source).unwrap_or_else(|err| fail(err));
    write_output(None, listing.as_bytes())
}
