//! SoundFix CLI - batch conditioner for game sound assets

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use soundfix::cli::{commands, Cli, Commands};

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    info!("SoundFix v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("SoundFix v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Process {
            root,
            dest,
            rules,
            engine,
        } => commands::process(&root, dest.as_deref(), rules.as_deref(), &engine)?,
        Commands::Presets { rules } => commands::presets(rules.as_deref())?,
        Commands::Engines => commands::engines()?,
    }
    Ok(())
}
