//! Command-line surface of the `relay` binary.

pub mod console;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Workflow agent the chat session talks to unless told otherwise.
pub const DEFAULT_WORKFLOW_AGENT: &str = "service-payment-workflow";

/// Relay CLI
#[derive(Parser, Debug)]
#[command(name = "relay", version, about = "Drive remote agents with local tools and workflows")]
pub struct Cli {
    /// Config file (defaults to ~/.relay/relay.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive session with a remote workflow agent
    Chat(ChatArgs),
    /// Run the local payment workflow once
    Workflow(WorkflowArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Remote workflow agent to address
    #[arg(short, long, default_value = DEFAULT_WORKFLOW_AGENT)]
    pub agent: String,
}

/// Arguments for the `workflow` subcommand.
#[derive(Parser, Debug)]
pub struct WorkflowArgs {
    /// What the user wants, e.g. "quiero pagar la luz"
    pub request: String,
}
