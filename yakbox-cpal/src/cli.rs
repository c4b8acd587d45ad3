//! Command-line interface for yakbox
//!
//! Handles argument parsing and logging configuration.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use log::LevelFilter;

/// yakbox - record short voice clips and play with them backwards
#[derive(Parser, Debug)]
#[command(name = "yakbox")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON recorder configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (-v = debug, -vv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List input devices
    Devices,

    /// Record from an input device into a WAV file
    Record(RecordArgs),

    /// Write a reversed copy of a recording
    Reverse { input: PathBuf, output: PathBuf },

    /// Show format and metadata of a recording
    Info { file: PathBuf },

    /// Convert a raw scratch file into a WAV recording
    ScratchToWav {
        scratch: PathBuf,
        output: PathBuf,

        /// Sample rate the scratch samples were captured at
        #[arg(long)]
        rate: u32,

        /// Scratch buffer length in seconds (default: configured max record time)
        #[arg(long)]
        seconds: Option<u32>,
    },
}

#[derive(ClapArgs, Debug)]
pub struct RecordArgs {
    /// Output WAV file
    #[arg(short, long)]
    pub out: PathBuf,

    /// Maximum record time in seconds
    #[arg(short, long)]
    pub seconds: Option<u32>,

    /// Reverse the clip before saving
    #[arg(short, long)]
    pub reverse: bool,

    /// Input device name (default: host default input)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Also keep the raw samples in a scratch file
    #[arg(long)]
    pub scratch: Option<PathBuf>,
}

impl Args {
    /// Get the log level filter based on verbosity flags
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Info,
                1 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }
}

/// Initialize the logging system based on CLI arguments
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // Audio host crates are noisy below warn
    builder.filter_level(LevelFilter::Warn);

    for module in ["yakbox", "yakbox_core", "yakbox_cpal"] {
        builder.filter_module(module, args.log_level());
    }

    // RUST_LOG still wins when set
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    builder.format_timestamp_millis().init();
}
