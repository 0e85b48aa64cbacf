use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "stockroom", version, about = "Inventory backend client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and keep the session for later commands
    Login {
        #[arg(short, long)]
        username: Option<String>,
        /// Remember the password in the OS keychain
        #[arg(long)]
        remember: bool,
    },
    /// End the session
    Logout {
        /// Also delete the remembered password
        #[arg(long)]
        forget: bool,
    },
    /// Show the logged-in user
    Whoami,
    /// Navigate to a route, as the browser front end would
    Open { path: String },
    /// List the routes
    Routes,
    /// GET an API path
    Get { url: String },
    /// POST to an API path; BODY is sent as given
    Post { url: String, body: Option<String> },
    /// PUT to an API path
    Put { url: String, body: Option<String> },
    /// PATCH an API path
    Patch { url: String, body: Option<String> },
    /// DELETE an API path
    Delete { url: String },
}
