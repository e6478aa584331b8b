//! Keep a local working copy in sync with a remote git repository.

use crate::process::{CommandRunner, CommandSpec, ProcessError};
use std::fmt;
use std::path::{Path, PathBuf};

/// Revision that needs no extra checkout after updating.
pub const DEFAULT_BRANCH: &str = "master";

/// Which path `sync_repo` took to bring the working copy up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// No `.git` directory: fresh clone.
    Cloned,
    /// Existing working copy: checkout master and pull.
    Updated,
}

/// Progress reported by `sync_repo` before each phase, for the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Cloning { dir: PathBuf },
    Updating { dir: PathBuf },
    CheckingOut { revision: String },
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncEvent::Cloning { dir } => write!(
                f,
                "{} doesn't look like a git repo, performing checkout...",
                dir.display()
            ),
            SyncEvent::Updating { dir } => write!(
                f,
                "{} looks like a repo already. Updating to {}...",
                dir.display(),
                DEFAULT_BRANCH
            ),
            SyncEvent::CheckingOut { revision } => write!(f, "Checking out {}", revision),
        }
    }
}

/// True if `dir` holds git metadata.
pub fn is_working_copy(dir: &Path) -> bool {
    dir.join(".git").exists()
}

/// Clone `repo_url` into `build_dir`, or update an existing working copy there,
/// then check out `revision` unless it is master.
/// Stops at the first git invocation that fails. `on_event` is called before each phase.
pub fn sync_repo(
    runner: &dyn CommandRunner,
    git_bin: &Path,
    repo_url: &str,
    revision: &str,
    build_dir: &Path,
    mut on_event: impl FnMut(SyncEvent),
) -> Result<SyncAction, ProcessError> {
    let action = if !is_working_copy(build_dir) {
        on_event(SyncEvent::Cloning {
            dir: build_dir.to_path_buf(),
        });
        runner.run(
            &CommandSpec::new(git_bin)
                .arg("clone")
                .arg(repo_url)
                .arg(build_dir),
        )?;
        SyncAction::Cloned
    } else {
        on_event(SyncEvent::Updating {
            dir: build_dir.to_path_buf(),
        });
        runner.run(
            &CommandSpec::new(git_bin)
                .arg("checkout")
                .arg(DEFAULT_BRANCH)
                .current_dir(build_dir),
        )?;
        runner.run(&CommandSpec::new(git_bin).arg("pull").current_dir(build_dir))?;
        SyncAction::Updated
    };
    tracing::info!(?action, dir = %build_dir.display(), "working copy synced");

    if revision != DEFAULT_BRANCH {
        on_event(SyncEvent::CheckingOut {
            revision: revision.to_string(),
        });
        runner.run(
            &CommandSpec::new(git_bin)
                .arg("checkout")
                .arg(revision)
                .current_dir(build_dir),
        )?;
    }

    Ok(action)
}
