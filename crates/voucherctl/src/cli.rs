//! CLI - Command-line argument parsing
//!
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use voucher_router::Language;

/// Voucher search router CLI
#[derive(Parser, Debug)]
#[command(name = "voucherctl")]
#[command(about = "Route housing-search messages through the two-tier intent router", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Config file (overrides $VOUCHER_ROUTER_CONFIG and the system path)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging for the router
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Pattern tier only; the fallback model is never called
    #[arg(long, global = true)]
    pub no_llm: bool,

    /// UI language (en, es, zh, bn). Detected from the message when omitted
    #[arg(long, global = true)]
    pub language: Option<Language>,

    /// Output JSON only
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Route one message through both tiers
    Route {
        message: String,

        /// Current search as JSON, e.g. '{"borough":"brooklyn","bedrooms":2}'
        #[arg(long)]
        previous: Option<String>,
    },

    /// Pattern-tier classification only
    Classify {
        message: String,

        /// Classify as if a search were already in progress
        #[arg(long)]
        with_context: bool,
    },

    /// Pattern-tier parameter extraction only
    Extract { message: String },

    /// Interactive multi-turn session
    Session,

    /// Show or write configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration and where it came from
    Show,

    /// Write the built-in defaults to a file
    Init {
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
