//! Geoglyph CLI - multi-scale archaeological discovery pipeline.

use clap::Parser;
use geoglyph_cli::commands;
use geoglyph_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` overrides the level chosen with `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> geoglyph_cli::Result<()> {
    // Load config: explicit path must exist, the default one may not
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let output_dir = cli.output.clone().unwrap_or_else(|| config.settings.output_dir.clone());

    match cli.command {
        Command::Regions(args) => commands::execute_regions(args, &config, &formatter),
        Command::Run(args) => commands::execute_run(args, &config, &output_dir, &formatter),
        Command::Verify(args) => commands::execute_verify(args, &config, &formatter),
        Command::Config => commands::execute_config(&config),
    }
}
