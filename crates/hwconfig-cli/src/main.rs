//! hwconfig CLI
//!
//! Compiles authored hardware configuration and answers build-time queries
//! about the result.

mod cli;
mod commands;
mod error;
mod io;
mod schema;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose || std::env::var_os("RUST_LOG").is_some() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        // Only fails when a subscriber is already installed.
        let _ = tracing::subscriber::set_global_default(subscriber);
        tracing::debug!("Verbose mode enabled");
    }

    execute_command(cli.command)
}

fn execute_command(cmd: Commands) -> Result<()> {
    let mut out = std::io::stdout().lock();
    match cmd {
        Commands::Compile(args) => commands::run_compile(&args, &mut out),
        Commands::ListModels { source } => commands::run_list_models(&source.config, &mut out),
        Commands::Get {
            source,
            model,
            path,
            property,
        } => commands::run_get(&source.config, &model, &path, &property, &mut out),
        Commands::FirmwareUris { source } => commands::run_firmware_uris(&source.config, &mut out),
        Commands::TouchFiles { source, bsp } => {
            commands::run_touch_files(&source.config, &bsp.dirs(), &mut out)
        }
        Commands::AudioFiles { source } => commands::run_audio_files(&source.config, &mut out),
        Commands::ThermalFiles { source } => commands::run_thermal_files(&source.config, &mut out),
        Commands::ArcFiles { source } => commands::run_arc_files(&source.config, &mut out),
        Commands::BspTarFiles { source, bsp } => {
            commands::run_bsp_tar_files(&source.config, &bsp.dirs(), &mut out)
        }
        Commands::BspUris { source, bsp } => {
            commands::run_bsp_uris(&source.config, &bsp.dirs(), &mut out)
        }
        Commands::BuildTargets {
            source,
            target_type,
            fw,
        } => commands::run_build_targets(&source.config, &target_type, &fw.filter(), &mut out),
        Commands::BuildCombinations {
            source,
            components,
            fw,
        } => commands::run_build_combinations(&source.config, &components, &fw.filter(), &mut out),
        Commands::FirmwareInfo { source } => commands::run_firmware_info(&source.config, &mut out),
        Commands::FileTree { source, bsp, root } => {
            commands::run_file_tree(&source.config, &bsp.dirs(), root.as_deref(), &mut out)
        }
    }
}
