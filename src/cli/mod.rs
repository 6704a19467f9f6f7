//! Command-line surface for swarmex.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(name = "swarmex")]
#[command(about = "Export running Docker Swarm services as docker-compose stack files")]
#[command(version)]
pub struct Args {
    /// Daemon socket to connect to (tcp:// or http(s):// address)
    #[arg(short = 'H', long, env = "DOCKER_HOST", default_value = "tcp://localhost:2375")]
    pub host: String,

    /// Use TLS when talking to the daemon
    #[arg(long, env = "DOCKER_TLS_VERIFY")]
    pub tls: bool,

    /// Directory the stack files are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Print the generated files to stdout instead of writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Path to a .env file with connection settings
    #[arg(long, value_name = "FILE")]
    pub env_file: Option<PathBuf>,

    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
