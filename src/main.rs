#![forbid(unsafe_code)]

use std::{
    fs::File,
    io::{self, BufReader, BufWriter},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use k33_koinly::Converter;

#[derive(Parser, Debug)]
#[command(name = "k33-koinly", version, about = "Convert K33 exports to Koinly universal CSV")]
struct Cli {
    /// K33 export CSV file
    #[arg(long = "in", default_value = "k33.csv")]
    input: PathBuf,

    /// Koinly universal CSV output
    #[arg(long = "out", default_value = "koinly.csv")]
    output: PathBuf,

    /// Print mapped rows without writing the output file
    #[arg(long)]
    dryrun: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let input_file = File::open(&cli.input)
        .with_context(|| format!("opening input file {}", cli.input.display()))?;
    let input = BufReader::new(input_file);
    let mut converter = Converter::new();

    if cli.dryrun {
        let mut report = io::stdout();
        return converter.preview(input, &mut report);
    }

    let output_file = File::create(&cli.output)
        .with_context(|| format!("creating output file {}", cli.output.display()))?;
    converter.process(input, BufWriter::new(output_file))?;
    log::info!(
        "Successfully converted {} to {}",
        cli.input.display(),
        cli.output.display()
    );
    Ok(())
}
