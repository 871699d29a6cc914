//! Upload and schedule new videos for a project.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use clap::Args;
use ytsched_core::batch::{self, BatchOutcome};
use ytsched_core::storage::{Config, ProjectStore};
use ytsched_core::youtube::{
    self, auth, RetryPolicy, UploadMetadata, YouTubeClient, YouTubeUploader, DEFAULT_CHUNK_SIZE,
};
use ytsched_core::Project;

use super::{runtime, CmdResult, EXIT_MISSING_CAPABILITY, EXIT_QUOTA};

#[derive(Args)]
pub struct UploadArgs {
    /// Project name
    project: String,
    /// Directory containing videos (overrides project setting)
    #[arg(long)]
    directory: Option<PathBuf>,
    /// Plan the schedule without uploading
    #[arg(long)]
    dry_run: bool,
    /// Start scheduling from this local date (YYYY-MM-DD) instead of now
    #[arg(long)]
    start_date: Option<String>,
    /// Seconds to wait between uploads (defaults to config)
    #[arg(long)]
    throttle: Option<f64>,
}

fn resolve_dir(project: &Project, flag: Option<PathBuf>) -> Result<PathBuf, String> {
    let dir = flag
        .or_else(|| project.upload_dir.as_deref().map(PathBuf::from))
        .ok_or("no upload directory set; pass --directory or set upload_dir on the project")?;
    if !dir.is_dir() {
        return Err(format!("not a directory: {}", dir.display()));
    }
    Ok(dir)
}

/// Midnight of `date` in the project's timezone, as a UTC instant.
fn start_instant(project: &Project, date: &str) -> Result<DateTime<Utc>, String> {
    let tz: chrono_tz::Tz = project
        .timezone
        .parse()
        .map_err(|_| format!("invalid timezone: {}", project.timezone))?;
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{date}': expected YYYY-MM-DD"))?;
    let local = tz
        .with_ymd_and_hms(day.year(), day.month(), day.day(), 0, 0, 0)
        .earliest()
        .ok_or_else(|| format!("date {date} has no midnight in {tz}"))?;
    Ok(local.with_timezone(&Utc))
}

pub fn run(args: UploadArgs) -> CmdResult {
    let store = ProjectStore::open()?;
    let mut project = store.load(&args.project)?;
    let config = Config::load_or_default();

    let dir = resolve_dir(&project, args.directory)?;
    let files = batch::scan_video_files(&dir, &config.video_extensions)?;
    if files.is_empty() {
        println!(
            "No video files found in {} (expected one of: {})",
            dir.display(),
            config.video_extensions.join(", ")
        );
        return Ok(ExitCode::SUCCESS);
    }

    let start = match &args.start_date {
        Some(date) => start_instant(&project, date)?,
        None => Utc::now(),
    };

    println!(
        "Found {} files. Checking which are new for project {}...",
        files.len(),
        project.name
    );
    let (plan, skipped) = batch::plan_batch(&project, &files, start)?;
    if skipped > 0 {
        println!("Skipping {skipped} already-uploaded files.");
    }
    if plan.is_empty() {
        println!("Nothing new to upload.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("New videos to upload: {}", plan.len());
    for item in &plan {
        println!("  {}  ->  {}", item.file_name, item.slot);
    }
    if args.dry_run {
        println!("Dry-run: not uploading.");
        return Ok(ExitCode::SUCCESS);
    }

    if let Err(e) = youtube::capability_check(&store, &project) {
        eprintln!("error: {e}");
        return Ok(ExitCode::from(EXIT_MISSING_CAPABILITY));
    }

    let title = project.default_title.clone().ok_or_else(|| {
        format!(
            "no default title set; run: ytsched project set {} --title <title>",
            project.name
        )
    })?;
    let metadata = UploadMetadata {
        title,
        description: project.default_description.clone().unwrap_or_default(),
        tags: project.default_tags.clone(),
        category_id: project.default_category_id.clone(),
        made_for_kids: project.made_for_kids,
    };

    let secrets_path = project
        .client_secrets_path
        .as_deref()
        .map(Path::new)
        .map(Path::to_path_buf)
        .ok_or("project has no client secrets configured")?;
    let secrets = auth::ClientSecrets::from_file(&secrets_path)?;
    let token_path = store.token_path(&project.name)?;
    let throttle =
        Duration::from_secs_f64(args.throttle.unwrap_or(config.throttle_seconds).max(0.0));

    let rt = runtime()?;
    let report = rt.block_on(async {
        let access = auth::access_token(&secrets, &token_path).await?;
        let client = YouTubeClient::new(access);
        let uploader = YouTubeUploader {
            client: &client,
            policy: RetryPolicy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        };
        Ok::<_, Box<dyn std::error::Error>>(
            batch::run_batch(&uploader, &store, &mut project, plan, &metadata, throttle).await?,
        )
    })?;

    for record in &report.uploaded {
        println!("Uploaded: https://youtu.be/{}", record.remote_id);
    }
    match report.outcome {
        BatchOutcome::Completed => {
            println!("Done. Project state updated.");
            Ok(ExitCode::SUCCESS)
        }
        BatchOutcome::QuotaReached => {
            eprintln!(
                "Upload limit reached. {} uploads saved; {} remaining. Re-run later to continue.",
                report.uploaded.len(),
                report.skipped
            );
            Ok(ExitCode::from(EXIT_QUOTA))
        }
    }
}
