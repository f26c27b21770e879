use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "quill",
    version,
    about = "A command-line coding assistant with file and shell tools"
)]
pub struct Cli {
    /// Query to send to the assistant (words are joined with spaces)
    pub query: Vec<String>,

    /// Run in interactive mode (prompt for queries)
    #[arg(short, long)]
    pub interactive: bool,

    /// Working directory for the agent
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Model name override (e.g. "deepseek-chat")
    #[arg(short, long)]
    pub model: Option<String>,

    /// Shell command timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Path to config file (overrides default search)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
