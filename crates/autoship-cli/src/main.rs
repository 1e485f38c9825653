mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{DeployKind, ScanOptions};

#[derive(Parser)]
#[command(
    name = "autoship",
    about = "Detect a project's stack, build a container image, and deploy it"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a project, generate a Dockerfile if needed, build the image, and optionally deploy it
    Scan {
        /// Project directory
        project_path: PathBuf,
        /// Image name (prompted if omitted)
        #[arg(long)]
        name: Option<String>,
        /// Image tag (prompted if omitted)
        #[arg(long)]
        tag: Option<String>,
        /// Deployment target (prompted if omitted)
        #[arg(long, value_enum)]
        deploy: Option<DeployKind>,
        /// Remote host for `--deploy remote`
        #[arg(long)]
        remote_host: Option<String>,
        /// Remote user for `--deploy remote`
        #[arg(long)]
        remote_user: Option<String>,
        /// Kubernetes namespace to watch (default: from autoship.toml, else "default")
        #[arg(long)]
        namespace: Option<String>,
        /// Seconds to wait for pods to run (default: from autoship.toml, else 300)
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            project_path,
            name,
            tag,
            deploy,
            remote_host,
            remote_user,
            namespace,
            timeout,
        } => {
            commands::scan(ScanOptions {
                project_path,
                name,
                tag,
                deploy,
                remote_host,
                remote_user,
                namespace,
                timeout,
            })
            .await?
        }
    }

    Ok(())
}
