//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate a Prisma schema from TypeScript interfaces
#[derive(Parser, Debug)]
#[command(name = "prisma-typegen")]
#[command(about = "Generate a Prisma schema from TypeScript interfaces")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a source tree and write the schema file
    Generate {
        /// Source directory to scan (overrides config)
        root: Option<PathBuf>,

        /// Schema file to write (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Datasource provider for a fresh preamble
        #[arg(long)]
        provider: Option<String>,

        /// Extra exclude patterns (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Ignore generator/datasource blocks of the existing schema
        #[arg(long)]
        no_preserve: bool,

        /// Leave doc comments out of the schema
        #[arg(long)]
        no_docs: bool,

        /// Keep running and regenerate on changes
        #[arg(short, long)]
        watch: bool,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the resolved model registry as JSON
    Inspect {
        /// Source directory to scan (overrides config)
        root: Option<PathBuf>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}
