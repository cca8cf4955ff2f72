//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use repotree_lib::model::RepoRef;

#[derive(Debug, Parser)]
#[command(name = "repotree", version, about = "Browse repositories through the dashboard backend")]
pub struct Cli {
    /// Base URL of the dashboard backend
    #[arg(long, env = "REPOTREE_URL", default_value = "http://localhost:5000")]
    pub url: String,

    /// Cookie header carrying the backend session
    #[arg(long, env = "REPOTREE_SESSION", hide_env_values = true)]
    pub session: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the login URL instead of opening it when the session is missing
    #[arg(long)]
    pub no_browser: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List repositories visible to the session
    Repos,

    /// Print the file tree of a repository
    Tree {
        /// Repository as owner/name
        repo: RepoRef,

        /// Directory or file to open; parents are opened along the way
        #[arg(short, long = "expand", value_name = "PATH")]
        expand: Vec<String>,
    },
}
