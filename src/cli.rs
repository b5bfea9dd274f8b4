use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flowchat")]
#[command(about = "Terminal chat client for webhook-driven workflow agents")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Workflow webhook URL, overrides the configured one
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Write the session log as markdown to this file on exit
    #[arg(long, value_name = "PATH")]
    pub dump_logs: Option<PathBuf>,
}
