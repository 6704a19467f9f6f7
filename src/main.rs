use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use swarmex::cli::Args;
use swarmex::swarm::DockerClient;
use swarmex::{export_cluster, render_cluster};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    // Load .env file if specified
    if let Some(ref env_file) = args.env_file {
        if let Err(e) = dotenvy::from_path(env_file) {
            error!("Failed to load env file {}: {}", env_file.display(), e);
            process::exit(1);
        }
    }

    let client = match DockerClient::new(&args.host, args.tls) {
        Ok(client) => client,
        Err(e) => {
            error!("Invalid docker host {}: {}", args.host, e);
            process::exit(1);
        }
    };

    info!("Connecting to docker engine at {}", args.host);

    // Dry-run mode: print the documents and exit
    if args.dry_run {
        let stacks = match render_cluster(&client).await {
            Ok(stacks) => stacks,
            Err(e) => {
                error!("Export failed: {}", e);
                process::exit(1);
            }
        };

        for (name, yaml) in &stacks {
            println!("# {}.yml", name);
            println!("{}", yaml);
        }
        println!("Exported {} stacks (dry run)", stacks.len());
        return;
    }

    match export_cluster(&client, &args.output_dir).await {
        Ok(count) => println!("Exported {} stacks", count),
        Err(e) => {
            error!("Export failed: {}", e);
            process::exit(1);
        }
    }
}
