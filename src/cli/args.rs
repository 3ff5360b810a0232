//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `check`: Report missing, incomplete and untranslated messages
//! - `merge`: Write `<locale>.all.json` and `<locale>.untranslated.json`
//! - `init`: Initialize glossa configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::config::OutputFormat;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Check(cmd)) => cmd.common.verbose,
            Some(Command::Merge(cmd)) => cmd.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Source locale (overrides config file)
    #[arg(long, env = "GLOSSA_SOURCE_LOCALE")]
    pub source_locale: Option<String>,

    /// Translation files directory (overrides config file)
    #[arg(long, env = "GLOSSA_MESSAGES_ROOT")]
    pub messages_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct CheckCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct MergeCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Directory for merged files (overrides config file)
    #[arg(long)]
    pub outdir: Option<PathBuf>,

    /// Layout of merged files (overrides config file)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check translations for missing, incomplete and untranslated messages
    Check(CheckCommand),
    /// Write merged and untranslated translation files for every locale
    Merge(MergeCommand),
    /// Initialize a new .glossarc.json configuration file
    Init,
}
