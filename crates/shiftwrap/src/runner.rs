use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};

pub const RELEASE_IMAGE_OVERRIDE_ENV: &str = "OPENSHIFT_INSTALL_RELEASE_IMAGE_OVERRIDE";

/// Exit code reported when the installer fails in a way that carries no exit
/// code of its own (killed by a signal, for instance).
pub const SENTINEL_EXIT_CODE: i32 = 255;

pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Runs the installer with the release image override added to the inherited
/// environment. Stdin/stdout/stderr pass through unmodified; the returned code
/// is the child's exit code, to be propagated as this process's own.
pub fn run_installer<S: AsRef<OsStr>>(
    path: &Path,
    args: &[S],
    release_image: &str,
) -> Result<i32> {
    debug!(
        installer = %path.display(),
        release_image,
        "running installer with release image override"
    );
    let status = Command::new(path)
        .args(args)
        .env(RELEASE_IMAGE_OVERRIDE_ENV, release_image)
        .status()
        .map_err(|e| Error::Subprocess(format!("failed to spawn {}: {e}", path.display())))?;
    if status.success() {
        return Ok(0);
    }
    Ok(status.code().unwrap_or(SENTINEL_EXIT_CODE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_in_path_locates_a_common_binary() {
        // /bin/sh is a safe bet on any unix test host.
        if cfg!(unix) {
            assert!(find_in_path("sh").is_some());
        }
    }

    #[test]
    fn find_in_path_misses_unknown_binary() {
        assert!(find_in_path("shiftwrap-no-such-binary-xyzzy").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn child_exit_code_is_propagated() {
        let sh = find_in_path("sh").expect("sh in PATH");
        let code = run_installer(&sh, &["-c", "exit 7"], "registry.example/ocp/release:4.3")
            .expect("run");
        assert_eq!(code, 7);
    }

    #[cfg(unix)]
    #[test]
    fn override_is_visible_to_the_child() {
        let sh = find_in_path("sh").expect("sh in PATH");
        let code = run_installer(
            &sh,
            &[
                "-c",
                &format!("test \"${}\" = r/i:1", RELEASE_IMAGE_OVERRIDE_ENV),
            ],
            "r/i:1",
        )
        .expect("run");
        assert_eq!(code, 0);
    }
}
