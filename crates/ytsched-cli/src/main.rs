use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ytsched",
    version,
    about = "Upload and schedule YouTube videos with per-project isolation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project management
    Project {
        #[command(subcommand)]
        action: commands::project::ProjectAction,
    },
    /// Run the OAuth flow and save a token for a project
    Auth(commands::auth::AuthArgs),
    /// Upload and schedule any new videos found in the directory
    Upload(commands::upload::UploadArgs),
    /// Delete local files that were already uploaded for a project
    Cleanup(commands::cleanup::CleanupArgs),
    /// Show where ytsched stores its data
    Where,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Project { action } => commands::project::run(action),
        Commands::Auth(args) => commands::auth::run(args),
        Commands::Upload(args) => commands::upload::run(args),
        Commands::Cleanup(args) => commands::cleanup::run(args),
        Commands::Where => commands::where_cmd::run(),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
