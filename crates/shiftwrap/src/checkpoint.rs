use std::env;
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, LineKind, Result};
use crate::fetch;

pub const INSTALLER_BIN: &str = "openshift-install";

/// Compiled-in default location of the published checkpoints array.
pub const CHECKPOINTS_URL: &str =
    "https://raw.githubusercontent.com/shiftwrap/shiftwrap/main/checkpoints.json";

/// Environment override for the checkpoints location, consulted exactly once
/// at resolution start.
pub const CHECKPOINTS_URL_ENV: &str = "SHIFTWRAP_CHECKPOINTS_URL";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct InstallerVersion {
    pub version: String,
    #[serde(rename = "commit")]
    pub build_commit: String,
}

/// A pinned pair of installer build identity and release image reference,
/// enough to reproduce a known-good installer run.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Checkpoint {
    pub installer: InstallerVersion,
    #[serde(rename = "release_image")]
    pub release_image_url: String,
}

impl Checkpoint {
    // Everything besides the release image is informational at this stage.
    pub fn is_valid(&self) -> bool {
        !self.release_image_url.is_empty()
    }
}

pub fn checkpoints_location() -> String {
    env::var(CHECKPOINTS_URL_ENV).unwrap_or_else(|_| CHECKPOINTS_URL.to_string())
}

/// Fetches the checkpoints array at `location` and returns the active entry.
/// Index 0 is authoritative: the publisher pre-sorts the array, and this
/// resolver does not sort, parse dates, or compare versions.
pub fn active_from_location(location: &str) -> Result<Checkpoint> {
    debug!(%location, "resolving checkpoint");
    let data = fetch::fetch_bytes(location)?;
    active_from_slice(&data)
}

fn active_from_slice(data: &[u8]) -> Result<Checkpoint> {
    let checkpoints: Vec<Checkpoint> = serde_json::from_slice(data).map_err(|e| Error::Decode {
        what: "checkpoints",
        source: e,
    })?;
    checkpoints.into_iter().next().ok_or(Error::NoCheckpoints)
}

/// Runs `<path> version` and parses the result. The probe is diagnostic only:
/// callers that gate on version compatibility hook in here.
pub fn probe_installer(path: &Path) -> Result<Checkpoint> {
    let out = Command::new(path)
        .arg("version")
        .output()
        .map_err(|e| Error::ProbeExec {
            program: path.display().to_string(),
            reason: e.to_string(),
        })?;
    if !out.status.success() {
        return Err(Error::ProbeExec {
            program: path.display().to_string(),
            reason: format!(
                "{}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            ),
        });
    }
    parse_version_output(&String::from_utf8_lossy(&out.stdout))
}

/*
 * example:
 * /some/path/to/openshift-install unreleased-master-2147-g1d7ed7af26a804b229924633b22a3ea013cf9cae
 * built from commit 1d7ed7af26a804b229924633b22a3ea013cf9cae
 * release image registry.svc.ci.openshift.org/ocp/release:4.3
 */
fn parse_version_output(text: &str) -> Result<Checkpoint> {
    let mut lines = text.lines();
    let mut info = Checkpoint::default();

    let header = next_line(&mut lines, LineKind::Version)?;
    let items: Vec<&str> = header.split_whitespace().collect();
    let malformed_header = || Error::MalformedOutput {
        kind: LineKind::Version,
        line: header.to_string(),
    };
    let &[exe, version] = items.as_slice() else {
        return Err(malformed_header());
    };
    if Path::new(exe).file_name().and_then(|n| n.to_str()) != Some(INSTALLER_BIN) {
        return Err(malformed_header());
    }
    info.installer.version = version.trim().to_string();

    let line = next_line(&mut lines, LineKind::Commit)?;
    let commit = line
        .strip_prefix("built from commit")
        .ok_or_else(|| Error::MalformedOutput {
            kind: LineKind::Commit,
            line: line.to_string(),
        })?;
    info.installer.build_commit = commit.trim().to_string();

    let line = next_line(&mut lines, LineKind::Image)?;
    let image = line
        .strip_prefix("release image")
        .ok_or_else(|| Error::MalformedOutput {
            kind: LineKind::Image,
            line: line.to_string(),
        })?;
    info.release_image_url = image.trim().to_string();

    Ok(info)
}

fn next_line<'a>(lines: &mut std::str::Lines<'a>, kind: LineKind) -> Result<&'a str> {
    lines.next().ok_or(Error::MalformedOutput {
        kind,
        line: String::new(),
    })
}
