//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quire static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Content directory path (relative to project root)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Config file name (default: quire.toml)
    #[arg(short = 'C', long, default_value = "quire.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments of the build command
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Include drafts and future-dated content
    #[arg(short, long)]
    pub drafts: bool,

    /// Drop files of the previous output that this build does not produce
    #[arg(long)]
    pub clean: bool,

    /// Minify the html content
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Override base URL for the site.
    ///
    /// Useful for CI/CD deployments where the production URL differs from local development.
    ///
    /// Example: quire build --base-url "https://alice.github.io/blog"
    #[arg(long = "base-url")]
    pub base_url: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render the whole site into the output directory
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}

impl Cli {
    /// Arguments shared by every building command.
    pub const fn build_args(&self) -> &BuildArgs {
        match &self.command {
            Commands::Build { build_args } => build_args,
        }
    }
}
