use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// readlens command-line client
#[derive(Parser, Debug)]
#[command(name = "readlens")]
#[command(about = "Extract, summarize and translate articles from the readlens backend")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL (overrides the config file)
    #[arg(long, env = "READLENS_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Also write logs to daily files in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the issued tokens
    Login {
        /// Defaults to the last username that logged in
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Create an account and log in
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,
    },

    /// End the session and forget the stored tokens
    Logout,

    /// Show the current session
    Status,

    /// Extract a Wikipedia article into your history
    Extract {
        /// Wikipedia article URL
        url: String,
    },

    /// List your articles, or show one
    Articles {
        /// Article ID
        id: Option<i64>,
    },

    /// Summarize text
    Summarize { text: String },

    /// Translate text, or the summary of a saved article
    Translate {
        /// Target language, e.g. "Spanish"
        #[arg(long = "to")]
        target_language: String,

        /// Translate this article instead of TEXT
        #[arg(long, conflicts_with = "text")]
        article: Option<i64>,

        #[arg(required_unless_present = "article")]
        text: Option<String>,
    },

    /// Send an arbitrary authenticated request
    Request {
        /// HTTP method, e.g. GET
        method: String,

        /// Path below the base URL, e.g. /api/v1/auth/me
        path: String,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },
}
