use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads the full contents of `location`, which is either a local filesystem
/// path (no URL scheme) or an http(s) URL.
pub fn fetch_bytes(location: &str) -> Result<Vec<u8>> {
    match Url::parse(location) {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => fetch_http(location),
        Ok(u) => Err(Error::InvalidLocation {
            location: location.to_string(),
            reason: format!("unsupported scheme '{}'", u.scheme()),
        }),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            // No scheme: treat as a local path.
            read_file(Path::new(location))
        }
        Err(e) => Err(Error::InvalidLocation {
            location: location.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    debug!(path = %path.display(), "reading local file");
    fs::read(path).map_err(|e| Error::NotFound {
        path: path.to_path_buf(),
        source: e,
    })
}

fn fetch_http(url: &str) -> Result<Vec<u8>> {
    debug!(%url, "fetching over http");
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| Error::Fetch {
            url: url.to_string(),
            reason: format!("failed to build HTTP client: {e}"),
        })?;
    let res = client.get(url).send().map_err(|e| Error::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !res.status().is_success() {
        return Err(Error::Fetch {
            url: url.to_string(),
            reason: format!("status {}", res.status()),
        });
    }
    let body = res.bytes().map_err(|e| Error::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(body.to_vec())
}
