//! Command-line parsing for the procurement client.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! gateway, orchestration and rendering code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "procure", version, about = "Material price forecasts and vendor recommendations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive TUI (the default).
    Tui(ClientArgs),
    /// Print the materials known to the server.
    Materials(ClientArgs),
    /// Fetch the price forecast and vendor ranking for one material.
    Analyze(AnalyzeArgs),
    /// Upload the three datasets.
    Upload(UploadArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct ClientArgs {
    /// Backend base address (overrides PROCURE_API_BASE).
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,

    /// Log file used by the TUI (overrides PROCURE_LOG_FILE).
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Vendor scoring weight for price, in percent.
    #[arg(long)]
    pub w_price: Option<f64>,

    /// Vendor scoring weight for delivery time, in percent.
    #[arg(long)]
    pub w_delivery: Option<f64>,

    /// Vendor scoring weight for reliability, in percent.
    #[arg(long)]
    pub w_reliability: Option<f64>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Material identifier (as listed by `procure materials`).
    pub material_id: String,

    /// Write predictions and vendor rankings to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Materials CSV.
    #[arg(long, value_name = "CSV")]
    pub materials: Option<PathBuf>,

    /// Vendor prices CSV.
    #[arg(long, value_name = "CSV")]
    pub prices: Option<PathBuf>,

    /// Vendor metadata CSV.
    #[arg(long, value_name = "CSV")]
    pub vendors: Option<PathBuf>,
}
