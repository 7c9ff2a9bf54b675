//! voucherctl library - exposes the CLI pieces for testing

pub mod cli;
pub mod commands;
pub mod output;
