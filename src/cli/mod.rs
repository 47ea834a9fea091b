//! CLI definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Overrides;
use commands::Stream;
use crate::content::MatchPolicy;

pub mod commands;

/// Export and import Looks between BI instances
#[derive(Parser, Debug)]
#[command(name = "lookport", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Instance host, e.g. bi.example.com or https://bi.example.com:19999
    #[arg(long, global = true, env = "LOOKPORT_HOST")]
    pub host: Option<String>,

    /// API client id
    #[arg(long, global = true, env = "LOOKPORT_CLIENT_ID")]
    pub client_id: Option<String>,

    /// API client secret
    #[arg(long, global = true, env = "LOOKPORT_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Access token to use instead of logging in
    #[arg(long, global = true, env = "LOOKPORT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// REST API version (default: 4.0)
    #[arg(long, global = true, env = "LOOKPORT_API_VERSION")]
    pub api_version: Option<String>,

    /// Request timeout in seconds (default: 60)
    #[arg(long, global = true, env = "LOOKPORT_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Config file (default: ~/.lookport/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl Cli {
    /// Connection values given on the command line or in the environment.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            api_version: self.api_version.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            access_token: self.access_token.clone(),
            timeout_secs: self.timeout,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Look export, import and deletion
    Look {
        #[command(subcommand)]
        command: LookCommands,
    },

    /// Merge query import
    MergeQuery {
        #[command(subcommand)]
        command: MergeQueryCommands,
    },

    /// User export
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

impl Commands {
    /// Where operator messages go: stderr for exports, whose document
    /// goes to stdout.
    #[must_use]
    pub fn message_stream(&self) -> Stream {
        match self {
            Self::Look {
                command: LookCommands::Cat { .. },
            }
            | Self::User {
                command: UserCommands::Cat { .. },
            } => Stream::Stderr,
            _ => Stream::Stdout,
        }
    }
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Look Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum LookCommands {
    /// Export a Look as JSON
    Cat {
        /// Look ID
        id: String,

        /// Write Look_<id>_<title>.json into this directory instead of stdout
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Include the Look's scheduled plans
        #[arg(long)]
        plans: bool,

        /// Keep only the fields an import can write
        #[arg(long)]
        trim: bool,
    },

    /// Import a Look from a JSON file into a folder
    Import {
        /// Exported Look file
        file: PathBuf,

        /// Destination folder ID
        folder_id: String,

        /// Overwrite a Look with the same slug or title
        #[arg(long)]
        force: bool,

        /// Which match wins when several Looks share a slug or title
        #[arg(long, value_enum, default_value_t)]
        match_policy: MatchPolicyArg,
    },

    /// Delete a Look
    Rm {
        /// Look ID
        id: String,
    },
}

/// `--match-policy` values.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchPolicyArg {
    /// First match as returned by the instance
    #[default]
    Remote,
    /// Most recently updated match
    Recent,
}

impl From<MatchPolicyArg> for MatchPolicy {
    fn from(arg: MatchPolicyArg) -> Self {
        match arg {
            MatchPolicyArg::Remote => Self::RemoteOrder,
            MatchPolicyArg::Recent => Self::MostRecentlyUpdated,
        }
    }
}

// ============================================================================
// Merge Query Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum MergeQueryCommands {
    /// Create a merge query from a JSON file
    Import {
        /// Exported merge query file
        file: PathBuf,
    },
}

// ============================================================================
// User Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Export a user as JSON
    Cat {
        /// User ID
        id: String,

        /// Comma-separated list of fields to fetch
        #[arg(long)]
        fields: Option<String>,

        /// Keep only the fields an import can write
        #[arg(long)]
        trim: bool,

        /// Write User_<id>_<first>_<last>.json into this directory instead of stdout
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}
