use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "nexus-server")]
#[command(about = "Nexus - document tools over line-delimited JSON on stdio")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to ~/.config/nexus/config.toml)
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Document root directory (overrides config file and NEXUS_ROOT)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Comma-separated bundles to load (overrides config file and NEXUS_BUNDLES)
    #[arg(long, value_delimiter = ',')]
    pub bundles: Option<Vec<String>>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log filter forced by `-v`, if any
    pub fn verbosity_filter(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}
