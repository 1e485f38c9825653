use std::path::{Path, PathBuf};

use autoship_core::project::{file_name, is_build_file_name};
use autoship_core::{EventLog, ImageReference, walk_files};

use crate::command::CommandError;
use crate::executor::{CommandExecutor, RealExecutor};

/// Builds container images with `docker build`, parameterized over the executor.
pub struct ImageBuilder<E: CommandExecutor = RealExecutor> {
    executor: E,
}

impl ImageBuilder<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for ImageBuilder<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> ImageBuilder<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// Build `image` from the first Dockerfile found under `project_dir`.
    ///
    /// The directory containing that Dockerfile is the build context. Build
    /// output is streamed to the terminal. Returns the Dockerfile used.
    pub async fn build(
        &self,
        project_dir: &Path,
        image: &ImageReference,
        log: &dyn EventLog,
    ) -> Result<PathBuf, BuildError> {
        let build_file = locate_build_file(project_dir)?;
        let context = build_file.parent().unwrap_or(project_dir);

        let args = build_args(&build_file, context, image)?;
        log.record(&format!(
            "building {image} from {} (context {})",
            build_file.display(),
            context.display()
        ));

        match self.executor.exec_streaming("docker", &args).await {
            Ok(()) => {
                log.record(&format!("built {image}"));
                Ok(build_file)
            }
            Err(e @ CommandError::Failed { .. }) => {
                let exit_code = e.exit_code();
                log.record(&format!(
                    "build of {image} failed: {}",
                    crate::command::describe_code(exit_code)
                ));
                Err(BuildError::BuildFailed {
                    exit_code,
                    source: e,
                })
            }
            Err(e) => {
                log.record(&format!("build of {image} could not run: {e}"));
                Err(BuildError::Command { source: e })
            }
        }
    }
}

/// First file, depth-first, whose name ends in "dockerfile" (any case).
pub fn locate_build_file(project_dir: &Path) -> Result<PathBuf, BuildError> {
    walk_files(project_dir)?
        .into_iter()
        .find(|f| is_build_file_name(&file_name(f)))
        .ok_or_else(|| BuildError::BuildFileNotFound(project_dir.to_path_buf()))
}

fn build_args(
    build_file: &Path,
    context: &Path,
    image: &ImageReference,
) -> Result<Vec<String>, BuildError> {
    let file = path_str(build_file)?;
    let context = path_str(context)?;
    Ok(vec![
        "build".to_owned(),
        "-t".to_owned(),
        image.to_string(),
        "-f".to_owned(),
        file.to_owned(),
        context.to_owned(),
    ])
}

fn path_str(path: &Path) -> Result<&str, BuildError> {
    path.to_str()
        .ok_or_else(|| BuildError::InvalidPath(path.to_path_buf()))
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Scan(#[from] autoship_core::Error),

    #[error("no Dockerfile found under {0}")]
    BuildFileNotFound(PathBuf),

    #[error("path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("docker build failed with {}", crate::command::describe_code(*exit_code))]
    BuildFailed {
        exit_code: Option<i32>,
        source: CommandError,
    },

    #[error("docker build could not be run")]
    Command { source: CommandError },
}
