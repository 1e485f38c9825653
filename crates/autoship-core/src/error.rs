use std::path::PathBuf;

use crate::project::ProjectType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    // ── Project scanning ──
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to walk {path}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("unknown project type in {0}: no package.json found, skipping build")]
    UnknownProjectType(PathBuf),

    // ── Build file synthesis ──
    #[error("no Dockerfile template for project type '{0}'")]
    TemplateMissing(ProjectType),

    #[error("failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}
