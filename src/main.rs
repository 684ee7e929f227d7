use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "opml2toml",
    version,
    about = "Convert an OPML subscription list into a TOML feed configuration"
)]
struct Args {
    /// Input OPML file
    #[arg(value_name = "OPML")]
    opml: PathBuf,

    /// Output TOML file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Log progress to stderr (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries only the TOML document.
    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let toml_text = opml2toml::convert_file(&args.opml)
        .with_context(|| format!("Failed to convert {}", args.opml.display()))?;

    match &args.output {
        Some(path) => opml2toml::output::write_atomic(path, &toml_text)?,
        None => opml2toml::output::write_stream(std::io::stdout().lock(), &toml_text)?,
    }

    Ok(())
}
