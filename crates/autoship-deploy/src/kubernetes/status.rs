//! Parsing of `kubectl get pods` / `kubectl get services` tables.

use std::sync::LazyLock;

use regex::Regex;

/// Phase reported for a pod that is up.
pub const RUNNING: &str = "Running";

/// Fallback service name looked up when `<project>-service` is absent.
const FALLBACK_SERVICE: &str = "web-service";

/// One row of `kubectl get pods`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodStatus {
    pub name: String,
    pub ready: String,
    pub status: String,
}

/// Parse the rows of `kubectl get pods`, skipping the header and rows with
/// fewer than three columns.
pub fn parse_pods(output: &str) -> Vec<PodStatus> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty() && !is_header(line))
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            Some(PodStatus {
                name: columns.next()?.to_owned(),
                ready: columns.next()?.to_owned(),
                status: columns.next()?.to_owned(),
            })
        })
        .collect()
}

/// Whether every pod in the sample is `Running`.
///
/// An empty sample is not ready: the pods may not be scheduled yet.
pub fn all_running(pods: &[PodStatus]) -> bool {
    if pods.is_empty() {
        return false;
    }
    for pod in pods {
        if pod.status != RUNNING {
            return false;
        }
    }
    true
}

/// `port:nodePort/protocol`, e.g. `80:30080/TCP`.
static NODE_PORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+):(\d+)/[A-Za-z]+\b").expect("valid regex"));

/// Node port of `<project>-service` (or `web-service`) from
/// `kubectl get services`, read from the first `port:nodePort/protocol`
/// token of that row.
pub fn parse_node_port(output: &str, project: &str) -> Option<u16> {
    let wanted = format!("{project}-service");
    output
        .lines()
        .filter(|line| !is_header(line))
        .filter(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|name| name == wanted || name == FALLBACK_SERVICE)
        })
        .find_map(|line| {
            NODE_PORT
                .captures_iter(line)
                // arch-lint: allow(no-silent-result-drop) reason="a port out of u16 range is no port"
                .find_map(|captures| captures[2].parse().ok())
        })
}

fn is_header(line: &str) -> bool {
    line.trim_start().starts_with("NAME ")
}
