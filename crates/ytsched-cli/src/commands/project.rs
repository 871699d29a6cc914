//! Project management commands.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Subcommand};
use ytsched_core::storage::ProjectStore;
use ytsched_core::Project;

use super::CmdResult;

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    Create {
        /// Project name (e.g. my-channel-2026)
        name: String,
        #[command(flatten)]
        settings: ProjectSettings,
    },
    /// List saved projects
    List,
    /// Print one project as JSON
    Show {
        /// Project name
        name: String,
    },
    /// Update project settings
    Set {
        /// Project name
        name: String,
        #[command(flatten)]
        settings: ProjectSettings,
    },
    /// Delete a project and its token (does not delete uploaded videos)
    Delete {
        /// Project name
        name: String,
    },
}

/// Settings shared by `create` and `set`; only flags you pass are changed.
#[derive(Args)]
pub struct ProjectSettings {
    /// Directory scanned for video files
    #[arg(long)]
    upload_dir: Option<PathBuf>,
    /// IANA timezone, e.g. America/New_York
    #[arg(long)]
    timezone: Option<String>,
    /// How many videos to publish per day
    #[arg(long)]
    videos_per_day: Option<u32>,
    /// Local time the day's schedule starts (HH:MM)
    #[arg(long)]
    day_start: Option<String>,
    /// Path to the downloaded OAuth client secrets JSON
    #[arg(long)]
    client_secrets: Option<PathBuf>,
    /// Default title applied to uploads
    #[arg(long)]
    title: Option<String>,
    /// Default description applied to uploads
    #[arg(long)]
    description: Option<String>,
    /// Default tags, comma-separated
    #[arg(long)]
    tags: Option<String>,
    /// Default YouTube category id
    #[arg(long)]
    category: Option<String>,
    /// Whether uploads are "made for kids"
    #[arg(long)]
    made_for_kids: Option<bool>,
}

impl ProjectSettings {
    fn apply(self, project: &mut Project) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(dir) = self.upload_dir {
            if !dir.is_dir() {
                return Err(format!("not a directory: {}", dir.display()).into());
            }
            project.upload_dir = Some(dir.display().to_string());
        }
        if let Some(tz) = self.timezone {
            tz.parse::<chrono_tz::Tz>()
                .map_err(|_| format!("invalid timezone: {tz}"))?;
            project.timezone = tz;
        }
        if let Some(n) = self.videos_per_day {
            if n == 0 || n > 86_400 {
                return Err("videos-per-day must be between 1 and 86400".into());
            }
            project.videos_per_day = n;
        }
        if let Some(start) = self.day_start {
            project.day_start_time = start;
        }
        if let Some(secrets) = self.client_secrets {
            if !secrets.is_file() {
                return Err(format!("file not found: {}", secrets.display()).into());
            }
            project.client_secrets_path = Some(secrets.display().to_string());
        }
        if let Some(title) = self.title {
            project.default_title = Some(title);
        }
        if let Some(description) = self.description {
            project.default_description = Some(description);
        }
        if let Some(tags) = self.tags {
            let parsed: Vec<String> = tags
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            project.default_tags = if parsed.is_empty() { None } else { Some(parsed) };
        }
        if let Some(category) = self.category {
            project.default_category_id = Some(category);
        }
        if let Some(kids) = self.made_for_kids {
            project.made_for_kids = kids;
        }
        Ok(())
    }
}

pub fn run(action: ProjectAction) -> CmdResult {
    let store = ProjectStore::open()?;

    match action {
        ProjectAction::Create { name, settings } => {
            let mut project = store.create(&name)?;
            settings.apply(&mut project)?;
            let path = store.save(&project)?;
            println!("Created project: {}", project.name);
            println!("Stored at: {}", path.display());
        }
        ProjectAction::List => {
            let names = store.list()?;
            if names.is_empty() {
                println!("No projects yet. Run: ytsched project create <name>");
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }
        ProjectAction::Show { name } => {
            let project = store.load(&name)?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::Set { name, settings } => {
            let mut project = store.load(&name)?;
            settings.apply(&mut project)?;
            store.save(&project)?;
            println!("Saved project settings: {}", project.name);
        }
        ProjectAction::Delete { name } => {
            if store.delete(&name)? {
                println!("Deleted project: {name}");
            } else {
                println!("No such project: {name}");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
