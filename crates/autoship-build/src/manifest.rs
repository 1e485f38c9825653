use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Entry point assumed when `package.json` declares no `main`.
pub const DEFAULT_ENTRY_POINT: &str = "index.js";

/// The parts of a `package.json` the synthesizer looks at.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    pub main: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl PackageManifest {
    /// Read and parse a `package.json`.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn depends_on(&self, package: &str) -> bool {
        self.dependencies.contains_key(package)
    }

    /// Entry point relative to the manifest directory.
    pub fn entry_point(&self) -> &str {
        self.main
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_ENTRY_POINT)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
