use std::path::{Path, PathBuf};

use autoship_core::{BuildConfig, EventLog, ProjectDescriptor, ProjectType};

use crate::manifest::{ManifestError, PackageManifest};

/// Name of the build file written at the project root.
pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// Dependencies that switch the start command to a direct `node` invocation.
const WEB_FRAMEWORKS: &[&str] = &["express"];

/// Port exposed once a web framework or an explicit `listen(8000` is detected.
const WEB_PORT: u16 = 8000;

/// Call pattern searched for in the entry point source.
const LISTEN_8000_PATTERN: &str = "listen(8000";

/// Produces a Dockerfile for a scanned project from its stack template.
pub struct DockerfileSynthesizer<'a> {
    config: &'a BuildConfig,
    project: &'a ProjectDescriptor,
}

impl<'a> DockerfileSynthesizer<'a> {
    pub fn new(config: &'a BuildConfig, project: &'a ProjectDescriptor) -> Self {
        Self { config, project }
    }

    /// Path of the Dockerfile at the project root.
    pub fn target_path(&self) -> PathBuf {
        self.project.path.join(DOCKERFILE_NAME)
    }

    /// Unmodified template for the project type.
    pub fn template(&self) -> Result<String, SynthesisError> {
        match self.project.project_type {
            ProjectType::NodeJs => Ok(format!(
                r#"
FROM {image}
WORKDIR /app
COPY package*.json ./
RUN npm install
COPY . .
EXPOSE 3000
CMD ["npm","start"]
"#,
                image = self.config.node_image,
            )),
            other => Err(autoship_core::Error::TemplateMissing(other).into()),
        }
    }

    /// Template with the substitution rules applied, trimmed.
    ///
    /// Rules run in order, so a later rule may override an earlier one:
    /// 1. a known web framework dependency exposes port 8000 and starts the
    ///    entry point with `node` directly;
    /// 2. an entry point containing `listen(8000` exposes port 8000.
    pub fn render(&self, log: &dyn EventLog) -> Result<String, SynthesisError> {
        let mut content = self.template()?;

        if let Some(manifest_path) = &self.project.manifest_path {
            let manifest = PackageManifest::load(manifest_path)?;
            let entry_point = manifest.entry_point();

            if let Some(framework) = WEB_FRAMEWORKS.iter().find(|f| manifest.depends_on(f)) {
                log.record(&format!(
                    "{framework} dependency found, exposing {WEB_PORT} and running node {entry_point}"
                ));
                content = replace_line(&content, "EXPOSE ", &format!("EXPOSE {WEB_PORT}"));
                content = replace_line(
                    &content,
                    "CMD ",
                    &format!(r#"CMD ["node","{entry_point}"]"#),
                );
            }

            let manifest_dir = manifest_path.parent().unwrap_or(Path::new("."));
            let entry_path = manifest_dir.join(entry_point);
            if entry_path.is_file() {
                let source =
                    std::fs::read_to_string(&entry_path).map_err(|e| SynthesisError::EntryRead {
                        path: entry_path.clone(),
                        source: e,
                    })?;
                if source.contains(LISTEN_8000_PATTERN) {
                    log.record(&format!(
                        "{} listens on {WEB_PORT}, exposing {WEB_PORT}",
                        entry_path.display()
                    ));
                    content = replace_line(&content, "EXPOSE ", &format!("EXPOSE {WEB_PORT}"));
                }
            }
        }

        Ok(content.trim().to_owned())
    }

    /// Write the rendered Dockerfile to the project root unless one is
    /// already there, and return its path.
    pub fn synthesize(&self, log: &dyn EventLog) -> Result<PathBuf, SynthesisError> {
        let path = self.target_path();
        if path.exists() {
            log.record(&format!("using existing {}", path.display()));
            return Ok(path);
        }

        let content = self.render(log)?;
        std::fs::write(&path, content).map_err(|e| autoship_core::Error::WriteFailed {
            path: path.clone(),
            source: e,
        })?;

        log.record(&format!("generated {}", path.display()));
        Ok(path)
    }
}

/// Replace every line starting with `prefix` by `new_line`.
fn replace_line(content: &str, prefix: &str, new_line: &str) -> String {
    content
        .split('\n')
        .map(|line| {
            if line.starts_with(prefix) {
                new_line
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Core(#[from] autoship_core::Error),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("failed to read entry point {path}")]
    EntryRead {
        path: PathBuf,
        source: std::io::Error,
    },
}
