use std::collections::BTreeMap;

use tracing::debug;

use crate::error::Result;
use crate::fetch;
use crate::graph::BuildInfo;

pub const RELEASE_STREAM_BASE_URL: &str =
    "https://openshift-release.svc.ci.openshift.org/releasestream";

/// The literal marker counted on a CI stream status page. The page is rendered
/// HTML and is scanned heuristically, not parsed.
const SUCCESS_MARKER: &str = "Succeeded";

/// Version -> success count. A missing key means the build was never scored
/// (kind derivation or page fetch failed), which is distinct from a stored
/// zero; the best-build selector treats both as never-selectable.
pub type BuildScores = BTreeMap<String, usize>;

/// Source of CI stream status pages. The production implementation fetches
/// live pages, so scores are not reproducible across calls; tests substitute
/// fixed page content.
pub trait PageSource {
    fn release_page(&self, kind: &str, version: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct HttpPageSource {
    base_url: String,
}

impl Default for HttpPageSource {
    fn default() -> Self {
        Self {
            base_url: RELEASE_STREAM_BASE_URL.to_string(),
        }
    }
}

impl HttpPageSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl PageSource for HttpPageSource {
    fn release_page(&self, kind: &str, version: &str) -> Result<String> {
        let url = format!(
            "{}/{}/release/{}",
            self.base_url.trim_end_matches('/'),
            kind,
            version
        );
        let data = fetch::fetch_bytes(&url)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

/// Derives the CI stream identifier from a build version string:
/// `"4.2.0-0.nightly-2019-11-28-230858"` -> `"4.2.0-0.nightly"`.
/// Returns None when the version has no second dash segment or the second
/// segment names neither a ci nor a nightly stream.
pub fn stream_kind(version: &str) -> Option<String> {
    let mut segments = version.split('-');
    let first = segments.next()?;
    let second = segments.next()?;
    if second.contains("ci") || second.contains("nightly") {
        Some(format!("{first}-{second}"))
    } else {
        None
    }
}

/// Scores each build by counting the success marker on its stream status page.
/// Builds whose kind cannot be derived or whose page fetch fails are skipped
/// and left out of the table; partial success is the expected steady state
/// against flaky CI pages, so the pass itself never fails.
pub fn score_builds(builds: &[BuildInfo], pages: &impl PageSource) -> BuildScores {
    let mut scores = BuildScores::new();
    for build in builds {
        let Some(kind) = stream_kind(&build.version) else {
            debug!(version = %build.version, "no stream kind, skipping");
            continue;
        };
        match pages.release_page(&kind, &build.version) {
            Ok(page) => {
                scores.insert(build.version.clone(), count_successes(&page));
            }
            Err(e) => {
                debug!(version = %build.version, error = %e, "page fetch failed, skipping");
            }
        }
    }
    scores
}

fn count_successes(page: &str) -> usize {
    page.matches(SUCCESS_MARKER).count()
}

/// Picks the build with the highest positive score. Ties keep the earliest
/// build in graph order. Returns None when no build scored above zero, so the
/// caller can report that instead of pinning an arbitrary build.
pub fn best_build<'a>(builds: &'a [BuildInfo], scores: &BuildScores) -> Option<&'a BuildInfo> {
    let mut high = 0usize;
    let mut best = None;
    for build in builds {
        let Some(&score) = scores.get(&build.version) else {
            continue;
        };
        if score > high {
            high = score;
            best = Some(build);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct FixedPages(BTreeMap<String, String>);

    impl PageSource for FixedPages {
        fn release_page(&self, kind: &str, version: &str) -> Result<String> {
            let key = format!("{kind}/release/{version}");
            self.0.get(&key).cloned().ok_or(Error::Fetch {
                url: key,
                reason: "status 404 Not Found".to_string(),
            })
        }
    }

    fn build(version: &str) -> BuildInfo {
        BuildInfo {
            version: version.to_string(),
            payload: format!("payload-{version}"),
        }
    }

    #[test]
    fn stream_kind_from_nightly_version() {
        assert_eq!(
            stream_kind("4.2.0-0.nightly-2019-11-28-230858").as_deref(),
            Some("4.2.0-0.nightly")
        );
    }

    #[test]
    fn stream_kind_from_ci_version() {
        assert_eq!(
            stream_kind("4.3.0-0.ci-2019-12-01-120000").as_deref(),
            Some("4.3.0-0.ci")
        );
    }

    #[test]
    fn stream_kind_requires_second_segment() {
        assert_eq!(stream_kind("4.3.0"), None);
    }

    #[test]
    fn stream_kind_rejects_unknown_streams() {
        assert_eq!(stream_kind("4.3.0-rc.1"), None);
    }

    #[test]
    fn scoring_counts_success_marker() {
        let v = "4.3.0-0.nightly-2020-01-01-000000";
        let mut pages = BTreeMap::new();
        pages.insert(
            format!("4.3.0-0.nightly/release/{v}"),
            "<td>Succeeded</td><td>Failed</td><td>Succeeded</td>".to_string(),
        );
        let pages = FixedPages(pages);
        let builds = vec![build(v)];

        let scores = score_builds(&builds, &pages);
        assert_eq!(scores.get(v), Some(&2));

        // Same page content, same count.
        let again = score_builds(&builds, &pages);
        assert_eq!(scores, again);
    }

    #[test]
    fn failed_fetch_leaves_build_unscored() {
        let pages = FixedPages(BTreeMap::new());
        let builds = vec![
            build("4.3.0-0.nightly-2020-01-01-000000"),
            build("4.3.0"), // no derivable kind
        ];
        let scores = score_builds(&builds, &pages);
        assert!(scores.is_empty());
    }

    #[test]
    fn best_build_prefers_highest_score() {
        let builds = vec![build("a-ci-1"), build("b-ci-1"), build("c-ci-1")];
        let mut scores = BuildScores::new();
        scores.insert("a-ci-1".into(), 1);
        scores.insert("b-ci-1".into(), 5);
        scores.insert("c-ci-1".into(), 3);
        let got = best_build(&builds, &scores).expect("best");
        assert_eq!(got.version, "b-ci-1");
    }

    #[test]
    fn best_build_keeps_earliest_on_tie() {
        let builds = vec![build("a-ci-1"), build("b-ci-1")];
        let mut scores = BuildScores::new();
        scores.insert("a-ci-1".into(), 4);
        scores.insert("b-ci-1".into(), 4);
        let got = best_build(&builds, &scores).expect("best");
        assert_eq!(got.version, "a-ci-1");
    }

    #[test]
    fn best_build_reports_nothing_for_all_zero_scores() {
        let builds = vec![build("a-ci-1"), build("b-ci-1")];
        let mut scores = BuildScores::new();
        scores.insert("a-ci-1".into(), 0);
        // b-ci-1 unscored on purpose; both must lose.
        assert!(best_build(&builds, &scores).is_none());
    }
}
