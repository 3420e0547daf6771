pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::Level;
use wrh_quote_core::config::{AppConfig, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "wrh-quote",
    about = "White Rabbit Hole quote wizard CLI",
    long_about = "Inspect the price catalog, estimate quotes, replay a full quote wizard session \
                  from an answers file, and inspect effective configuration.",
    after_help = "Examples:\n  wrh-quote catalog --service photography\n  \
                  wrh-quote estimate --answers answers.toml --explain\n  \
                  wrh-quote quote --answers answers.toml\n  wrh-quote config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file to load instead of wrh-quote.toml")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Print the price catalog, or the option lists of one service type")]
    Catalog {
        #[arg(long, help = "Service type id, e.g. photography or 360tours")]
        service: Option<String>,
    },
    #[command(about = "Price an answers file without contact details or handoff")]
    Estimate {
        #[arg(long, help = "TOML or JSON file with the wizard answers")]
        answers: PathBuf,
        #[arg(long, help = "Include the per-stage pricing trace")]
        explain: bool,
    },
    #[command(about = "Replay the wizard from an answers file and hand off the quote")]
    Quote {
        #[arg(long, help = "TOML or JSON file with the wizard answers")]
        answers: PathBuf,
        #[arg(long, help = "Skip document generation")]
        no_document: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = load_options(cli.config);
    init_logging(&options);

    let result = match cli.command {
        Command::Catalog { service } => commands::catalog::run(&options, service.as_deref()),
        Command::Estimate { answers, explain } => {
            commands::estimate::run(&options, &answers, explain)
        }
        Command::Quote { answers, no_document } => {
            commands::quote::run(&options, &answers, !no_document)
        }
        Command::Config => commands::config::run(&options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn load_options(config_path: Option<PathBuf>) -> LoadOptions {
    let require_file = config_path.is_some();
    LoadOptions { config_path, require_file, ..LoadOptions::default() }
}

/// Logs go to stderr so stdout carries only the command payload.
fn init_logging(options: &LoadOptions) {
    let level = AppConfig::load(options.clone())
        .ok()
        .and_then(|config| config.logging.level.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .compact()
        .init();
}
