//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Live module alias registry
#[derive(Parser)]
#[command(
    name = "aliasmap",
    version = env!("CARGO_PKG_VERSION"),
    about = "Live module alias registry",
    long_about = "Map short module names to the files that implement them and keep a tsconfig-style paths file in sync.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Examples:\n  aliasmap init\n  aliasmap scan\n  aliasmap watch\n  aliasmap resolve @components/App"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print aliases as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .aliasmap directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .aliasmap/settings.toml")]
    Config,

    /// Scan every source root and write the persisted file
    #[command(about = "Cold scan: rebuild the alias file from the source roots")]
    Scan,

    /// Scan, then keep the alias file in sync until interrupted
    #[command(about = "Cold scan, then watch source roots for changes")]
    Watch,

    /// Print aliases from the persisted file without scanning
    #[command(about = "Warm start: list aliases from the persisted file")]
    Show,

    /// Print the file a module key resolves to
    #[command(
        about = "Resolve a module key to its file",
        after_help = "Exit status is 1 when the key is unknown."
    )]
    Resolve {
        /// Module key, e.g. @components/App
        key: String,
    },
}
