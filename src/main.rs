mod batch;
mod detect;
mod error;
mod gateway;
mod menu;
mod processor;
mod report;
mod settings;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use batch::Organizer;
use settings::Settings;

#[derive(Parser)]
#[command(
    name = "gateway_organizer",
    about = "Find payment gateway tables in scraped page JSON and export them to Excel"
)]
struct Cli {
    /// Settings file (TOML/JSON); PGO_* env vars override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (default)
    Menu,
    /// Process one JSON file and write the report
    File {
        path: PathBuf,
        /// Output workbook (default: gateways_pagamento.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Process every JSON file in a folder and write the report
    Dir {
        path: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .with_target(true)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    init_tracing(&settings.log_level);

    let mut organizer = Organizer::new(&settings);

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => {
            let stdin = io::stdin();
            let mut menu = menu::Menu::new(
                organizer,
                &settings.default_output,
                stdin.lock(),
                io::stdout(),
            );
            menu.run()
        }
        Commands::File { path, output } => {
            let output = output.unwrap_or_else(|| PathBuf::from(&settings.default_output));
            organizer.run_and_report(&output, |org| org.run_single(&path))
        }
        Commands::Dir { path, output } => {
            let output = output.unwrap_or_else(|| PathBuf::from(&settings.default_output));
            organizer.run_and_report(&output, |org| org.run_directory(&path))
        }
    }
}
