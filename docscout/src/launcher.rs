//! Opening a matched file in the application the desktop associates with it.
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

use crate::errors::{SearchError, SearchResult};

/// Hands `path` to the platform opener and returns once it has been spawned
pub fn open_with_default_application(path: &Path) -> SearchResult<()> {
    if !path.exists() {
        return Err(SearchError::launch(path, "file does not exist"));
    }

    let mut command = opener_command(path);
    debug!("Launching {:?}", command);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| SearchError::launch(path, e.to_string()))
}

#[cfg(target_os = "windows")]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("cmd");
    // The empty string is the window title `start` expects first
    command.args(["/C", "start", ""]).arg(path);
    command
}

#[cfg(target_os = "macos")]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg(path);
    command
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    command
}
