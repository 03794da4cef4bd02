use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "helpdesk", about = "Chat with Helpdesk support from the terminal", version)]
pub struct Cli {
    /// Base URL of the Helpdesk API.
    #[arg(
        long,
        global = true,
        env = "HELPDESK_API_URL",
        default_value = helpdesk_client::api::DEFAULT_BASE_URL
    )]
    pub server: String,

    /// File holding the session id between runs (defaults to the app data dir).
    #[arg(long, global = true, env = "HELPDESK_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat. `/clear` starts over, `/quit` or EOF exits.
    Chat,
    /// Send a single message and print the reply.
    Send {
        /// Message text.
        message: String,
    },
    /// Print the current conversation.
    History,
    /// Forget the local session. Nothing is deleted on the server.
    Clear,
    /// Print the version.
    Version,
}
