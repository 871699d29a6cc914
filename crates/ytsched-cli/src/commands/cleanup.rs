//! Delete local copies of already-uploaded videos.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use ytsched_core::cleanup::{execute_cleanup, plan_cleanup};
use ytsched_core::storage::ProjectStore;

use super::CmdResult;

#[derive(Args)]
pub struct CleanupArgs {
    /// Project name
    project: String,
    /// Directory to clean (overrides project setting)
    #[arg(long)]
    directory: Option<PathBuf>,
    /// Preview deletions without deleting
    #[arg(long)]
    dry_run: bool,
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    yes: bool,
}

pub fn run(args: CleanupArgs) -> CmdResult {
    let store = ProjectStore::open()?;
    let project = store.load(&args.project)?;

    let dir = args
        .directory
        .or_else(|| project.upload_dir.as_deref().map(PathBuf::from))
        .ok_or("no upload directory set; pass --directory or set upload_dir on the project")?;
    if !dir.is_dir() {
        return Err(format!("not a directory: {}", dir.display()).into());
    }

    if project.uploaded.is_empty() {
        println!("No uploads recorded for this project yet. Nothing to clean.");
        return Ok(ExitCode::SUCCESS);
    }

    let plan = plan_cleanup(&dir, &project.uploaded)?;
    if plan.is_empty() {
        println!("No files matched uploaded records by name and content. Nothing to delete.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Files eligible for deletion (already uploaded):");
    for candidate in &plan.candidates {
        println!(
            "  {}  ({:.2} MB)",
            candidate.path.display(),
            candidate.size as f64 / (1024.0 * 1024.0)
        );
    }
    println!(
        "Total space to free: {:.2} MB",
        plan.total_bytes() as f64 / (1024.0 * 1024.0)
    );

    if args.dry_run {
        println!("Dry-run: no files deleted.");
        return Ok(ExitCode::SUCCESS);
    }

    if !args.yes && !confirm("Delete these files now? [y/N] ")? {
        println!("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let deleted = execute_cleanup(&plan);
    println!("Deleted {}/{} files.", deleted, plan.candidates.len());
    Ok(ExitCode::SUCCESS)
}

fn confirm(prompt: &str) -> std::io::Result<bool> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}
