//! Clap adapter for the `dynamic-media` command.
//!
//! Compiled only with the `clap` Cargo feature (on by default). The single
//! bridge to the core is [`Cli::into_invocation()`]; everything after that is
//! clap-free and goes through [`handle`](crate::handle).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::ops::Invocation;
use crate::types::{MediaAction, OutputFormat};

/// Apply dynamic media plugin settings to a content framework config.
#[derive(Debug, Parser)]
#[command(name = "dynamic-media", version)]
pub struct Cli {
    /// Plugin settings file. Repeat to layer files; later files win.
    #[arg(short, long = "plugin", global = true)]
    pub plugin: Vec<PathBuf>,

    /// Accept unknown keys in plugin settings files.
    #[arg(long, global = true)]
    pub lenient: bool,

    /// Output format for `merge` and `resolve`.
    #[arg(long, value_enum, default_value = "toml", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the framework config with upload handlers merged in.
    Merge {
        /// Framework config file (TOML).
        config: PathBuf,
    },
    /// Show the read/upload chains and appended handlers for a collection.
    Resolve {
        /// Collection slug.
        slug: String,
    },
    /// Print a commented plugin settings template.
    Template,
}

impl Cli {
    /// Convert clap-parsed args into a framework-agnostic [`Invocation`].
    pub fn into_invocation(self) -> Invocation {
        let format = self.format;
        let action = match self.command {
            Command::Merge { config } => MediaAction::Merge { config, format },
            Command::Resolve { slug } => MediaAction::Resolve { slug, format },
            Command::Template => MediaAction::Template,
        };
        Invocation {
            plugin_files: self.plugin,
            strict: !self.lenient,
            action,
        }
    }
}
