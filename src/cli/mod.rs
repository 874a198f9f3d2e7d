//! Command-line interface for the SoundFix batch conditioner

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SoundFix - batch conditioner for game sound assets
#[derive(Parser, Debug)]
#[command(name = "soundfix")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process every audio file under a directory
    #[command(name = "process")]
    Process {
        /// Root directory to walk for audio files
        root: PathBuf,

        /// Deliver the finished archive to this directory
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Rule table file; the compiled-in presets are used when omitted
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Processing engine: butterworth, hybrid, dynamic-hybrid, or multiband
        #[arg(short, long, default_value = "hybrid")]
        engine: String,
    },

    /// List the active preset rules
    #[command(name = "presets")]
    Presets {
        /// Rule table file; the compiled-in presets are used when omitted
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// List the available processing engines
    #[command(name = "engines")]
    Engines,
}
