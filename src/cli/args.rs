//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Federated source roots: parse, print, and save unit trees across
/// package-routed directories
#[derive(Parser, Debug)]
#[command(name = "srcroot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase debug output (-d, -dd, -ddd)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse source files and report problems
    Parse {
        /// Primary root directory
        #[arg(value_hint = ValueHint::DirPath)]
        root: PathBuf,

        /// Parse only this package (routed to its delegate if registered)
        #[arg(short, long)]
        package: Option<String>,

        /// Register a delegate root as PKG=DIR (repeatable)
        #[arg(long = "route", value_name = "PKG=DIR")]
        routes: Vec<String>,

        /// Parser configuration file (TOML)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
    },

    /// Parse one file and pretty-print it to stdout
    Print {
        /// Primary root directory
        #[arg(value_hint = ValueHint::DirPath)]
        root: PathBuf,

        /// Package of the file (empty string for the root package)
        package: String,

        /// Filename relative to the package directory
        file: String,

        /// Parser configuration file (TOML)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
    },

    /// Parse all roots and write the trees back out
    Save {
        /// Primary root directory
        #[arg(value_hint = ValueHint::DirPath)]
        root: PathBuf,

        /// Target directory for the primary root (delegates keep their own)
        #[arg(long, value_hint = ValueHint::DirPath)]
        to: Option<PathBuf>,

        /// Register a delegate root as PKG=DIR (repeatable)
        #[arg(long = "route", value_name = "PKG=DIR")]
        routes: Vec<String>,

        /// Parser configuration file (TOML)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
    },
}
