mod pipeline;
mod prompt;
mod scan;

use std::fmt;
use std::path::PathBuf;

pub use scan::scan;

/// Deployment chosen after a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DeployKind {
    /// docker run on this host
    Local,
    /// docker run over ssh
    Remote,
    /// kubectl apply and wait for pods
    K8s,
    /// nginx reverse proxy
    Nginx,
    /// Build only
    #[value(name = "none")]
    Skip,
}

impl DeployKind {
    /// Targets offered by the interactive selection.
    pub(crate) const CHOICES: [DeployKind; 4] =
        [Self::Local, Self::Remote, Self::K8s, Self::Nginx];
}

impl fmt::Display for DeployKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("remote"),
            Self::K8s => f.write_str("k8s"),
            Self::Nginx => f.write_str("nginx"),
            Self::Skip => f.write_str("none"),
        }
    }
}

/// Arguments of `autoship scan`.
pub struct ScanOptions {
    pub project_path: PathBuf,
    pub name: Option<String>,
    pub tag: Option<String>,
    pub deploy: Option<DeployKind>,
    pub remote_host: Option<String>,
    pub remote_user: Option<String>,
    pub namespace: Option<String>,
    pub timeout: Option<u64>,
}
