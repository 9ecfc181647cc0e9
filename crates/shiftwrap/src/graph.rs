use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::fetch;

// ref: https://github.com/openshift/cincinnati
pub const DEFAULT_GRAPH_URL: &str = "https://openshift-release.svc.ci.openshift.org/graph";

/// One candidate release build from the upstream graph.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub payload: String,
}

/// The upstream release graph. Edges are decoded for completeness but nothing
/// here traverses them; only the node list matters.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Graph {
    pub edges: Vec<(u32, u32)>,
    pub nodes: Vec<BuildInfo>,
}

/// Fetches the graph at `location` and returns its nodes whose version starts
/// with `version_prefix`, in graph order.
pub fn builds_from_location(location: &str, version_prefix: &str) -> Result<Vec<BuildInfo>> {
    let data = fetch::fetch_bytes(location)?;
    let graph = decode_graph(&data)?;
    debug!(
        nodes = graph.nodes.len(),
        prefix = version_prefix,
        "filtering graph nodes"
    );
    Ok(filter_by_prefix(graph.nodes, version_prefix))
}

pub fn decode_graph(data: &[u8]) -> Result<Graph> {
    serde_json::from_slice(data).map_err(|e| Error::Decode {
        what: "build graph",
        source: e,
    })
}

/// Literal string-prefix match, not a semver comparison: "4.3" matches both
/// "4.3.0-..." and "4.30". An empty prefix matches everything.
pub fn filter_by_prefix(nodes: Vec<BuildInfo>, prefix: &str) -> Vec<BuildInfo> {
    nodes
        .into_iter()
        .filter(|n| n.version.starts_with(prefix))
        .collect()
}
