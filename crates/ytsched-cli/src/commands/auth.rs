//! OAuth flow for a project.

use std::path::Path;
use std::process::ExitCode;

use clap::Args;
use ytsched_core::storage::{Config, ProjectStore};
use ytsched_core::youtube::{auth, YouTubeClient};
use ytsched_core::CapabilityError;

use super::{runtime, CmdResult, EXIT_MISSING_CAPABILITY};

#[derive(Args)]
pub struct AuthArgs {
    /// Project name
    project: String,
    /// Localhost port for the OAuth callback (defaults to config)
    #[arg(long)]
    port: Option<u16>,
}

pub fn run(args: AuthArgs) -> CmdResult {
    let store = ProjectStore::open()?;
    let mut project = store.load(&args.project)?;

    let secrets_path = match project.client_secrets_path.as_deref() {
        Some(p) if Path::new(p).is_file() => Path::new(p).to_path_buf(),
        Some(p) => {
            eprintln!(
                "error: {}",
                CapabilityError::SecretsMissing(Path::new(p).to_path_buf())
            );
            return Ok(ExitCode::from(EXIT_MISSING_CAPABILITY));
        }
        None => {
            eprintln!(
                "error: {}",
                CapabilityError::SecretsNotConfigured(project.name.clone())
            );
            return Ok(ExitCode::from(EXIT_MISSING_CAPABILITY));
        }
    };

    let config = Config::load_or_default();
    let port = args.port.unwrap_or(config.oauth_redirect_port);
    let secrets = auth::ClientSecrets::from_file(&secrets_path)?;
    let token_path = store.token_path(&project.name)?;

    println!("Opening browser for Google sign-in (callback on localhost:{port})...");

    let rt = runtime()?;
    let channel = rt.block_on(async {
        let tokens = auth::authorize(&secrets, port, &token_path).await?;
        let client = YouTubeClient::new(tokens.access_token);
        Ok::<_, Box<dyn std::error::Error>>(client.channel_info().await?)
    })?;

    project.channel_id = Some(channel.id.clone());
    project.channel_title = Some(channel.title.clone());
    store.save(&project)?;

    println!("Authenticated. Channel: {} ({})", channel.title, channel.id);
    println!("Token saved at: {}", token_path.display());
    Ok(ExitCode::SUCCESS)
}
