//! Fixed bootstrap / configure / make sequence run inside the working copy.

use crate::process::{CommandRunner, CommandSpec, ProcessError};
use std::path::Path;

/// Build steps, run in order with the working copy as the working directory.
pub const BUILD_STEPS: [&str; 3] = ["./bootstrap.sh", "./configure", "make"];

/// Run every build step in `build_dir`. The first failing step aborts the sequence.
pub fn run_build(runner: &dyn CommandRunner, build_dir: &Path) -> Result<(), ProcessError> {
    for step in BUILD_STEPS {
        tracing::info!(step, dir = %build_dir.display(), "build step");
        runner.run(&CommandSpec::new(step).current_dir(build_dir))?;
    }
    Ok(())
}
