//! `ytsched where`

use std::process::ExitCode;

use super::CmdResult;

pub fn run() -> CmdResult {
    println!("{}", ytsched_core::storage::data_dir()?.display());
    Ok(ExitCode::SUCCESS)
}
