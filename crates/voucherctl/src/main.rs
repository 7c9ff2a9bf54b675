//! voucherctl - operator CLI for the voucher search router
//!
//! Routes messages one at a time or in an interactive session that owns the
//! conversation's search context.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use voucherctl::cli::Cli;
use voucherctl::commands;

fn init_logging(verbose: bool) {
    let default = if verbose {
        "voucher_router=debug,voucherctl=debug"
    } else {
        "voucher_router=info"
    };
    let filter = if verbose {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    commands::run(cli)
}
