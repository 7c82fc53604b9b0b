use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;

use crate::storage::resolve_prefs_path;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";

#[derive(Parser, Debug)]
#[command(
    name = "dashboard_sync",
    version,
    about = "Drive finance dashboard actions against a live server from a page snapshot"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Page snapshot (JSON) to load
    #[arg(long)]
    pub page: PathBuf,

    /// Application root of the dashboard server
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Preferences file standing in for browser-local storage
    #[arg(long, global = true)]
    pub prefs: Option<PathBuf>,

    /// Answer for the amount prompt; repeat for several. Reads stdin when absent
    #[arg(long = "answer", global = true)]
    pub answers: Vec<String>,

    /// Write the resulting page tree to this file
    #[arg(short, long, global = true)]
    pub out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Click the element matching a selector (#id, .class or .class:N)
    Click { selector: String },
    /// Submit the form matching a selector
    Submit { selector: String },
    /// Flip the dark-mode preference
    ToggleTheme,
    /// Load the page and report it without firing anything
    Show,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub prefs_path: PathBuf,
}

/// CLI flags win over the environment, which wins over defaults.
pub fn resolve_settings(cli: &Cli) -> Settings {
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| env::var("DASHBOARD_BASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let prefs_path = cli.prefs.clone().unwrap_or_else(resolve_prefs_path);

    Settings { base_url, prefs_path }
}
