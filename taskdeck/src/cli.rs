//! CLI argument definitions for the taskdeck binary.
//!
//! Global flags mirror the config file (and can be supplied via
//! environment variables); the subcommand selects which client
//! operation to run.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI arguments parsed by clap.
#[derive(Parser, Debug)]
#[command(version, about = "Terminal client for a multi-tenant to-do service")]
pub struct CliArgs {
    /// Backend API base URL.
    #[arg(long, env = "TASKDECK_API_URL")]
    pub api_url: Option<String>,

    /// Path to config file (default: `~/.config/taskdeck/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the persisted session file.
    #[arg(long, env = "TASKDECK_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKDECK_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskdeck.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Client operations exposed as subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and persist the session.
    Login {
        /// Account email.
        email: String,
        /// Account password.
        password: String,
    },
    /// Create an account (sign in separately afterwards).
    Register {
        /// Desired account email.
        email: String,
        /// Desired account password.
        password: String,
        /// Password confirmation; must match.
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Discard the local session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// List tasks.
    List {
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,
        /// Page offset.
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show one task.
    Show {
        /// Task id.
        id: String,
    },
    /// Create a task.
    Add {
        /// Task title.
        title: String,
        /// Optional description.
        #[arg(long)]
        description: Option<String>,
    },
    /// Update a task's title and description.
    Edit {
        /// Task id.
        id: String,
        /// New title.
        title: String,
        /// New description (omit to clear).
        #[arg(long)]
        description: Option<String>,
    },
    /// Flip a task's completion state.
    Toggle {
        /// Task id.
        id: String,
    },
    /// Delete a task.
    Rm {
        /// Task id.
        id: String,
    },
    /// Send a message to the assistant.
    Chat {
        /// Message text.
        message: String,
        /// Conversation to continue.
        #[arg(long)]
        conversation: Option<String>,
    },
    /// List assistant conversations.
    Conversations,
    /// Show a conversation's messages.
    Messages {
        /// Conversation id.
        id: String,
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,
        /// Page offset.
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
}
