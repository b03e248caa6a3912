//! CLI argument parsing for the leadhub-worker binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "leadhub-worker", about = "LeadHub CRM lead import worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the worker server (default if no subcommand given)
    Serve,
    /// Run database migrations and exit
    Migrate,
    /// Import a spreadsheet (.xlsx, .xls, .csv, .txt) into a tenant and print the report
    Import {
        /// File to import
        file: PathBuf,
        /// Session token of the importing admin or agent
        #[arg(long)]
        token: String,
    },
}
