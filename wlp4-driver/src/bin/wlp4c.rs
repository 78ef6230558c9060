use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use wlp4_codegen::CodegenOptions;
use wlp4_driver::{fail, init_logging, read_input, write_output, Pipeline};

#[derive(Parser, Debug)]
#[clap(name = "wlp4c", version, about = "Compile WLP4 source to MIPS assembly or a MERL module")]
struct Args {
    /// Input WLP4 source (defaults to stdin)
    input: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Assemble the result into a MERL module
    #[clap(long)]
    merl: bool,

    /// Leave comments out of the generated assembly
    #[clap(long)]
    no_comments: bool,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let source = read_input(args.input.as_deref())?;
    let pipeline = Pipeline::wlp4().unwrap_or_else(|err| fail(err));
    let options = CodegenOptions {
        comments: !args.no_comments,
    };

    let output = if args.merl {
        pipeline.compile_to_merl(&source, &options)
    } else {
        pipeline
            .compile(&source, &options)
            .map(String::into_bytes)
    }
    .unwrap_or_else(|err| fail(err));
    write_output(args.output.as_deref(), &output)
}
