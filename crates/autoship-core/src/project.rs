//! Project scanning: walk a directory tree and infer its runtime stack.

use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::log::EventLog;

/// File name suffix (case-insensitive) that marks a container build file.
const BUILD_FILE_SUFFIX: &str = "dockerfile";

/// File name suffix (case-sensitive) of the Node.js package manifest.
const NODE_MANIFEST_SUFFIX: &str = "package.json";

/// Runtime stack inferred from the files of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectType {
    NodeJs,
    Unknown,
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeJs => f.write_str("nodejs"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Result of scanning a project directory.
///
/// Built once by [`scan`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    /// Project root as given by the operator
    pub path: PathBuf,
    pub project_type: ProjectType,
    /// A file whose name ends in "dockerfile" exists somewhere in the tree
    pub has_existing_build_file: bool,
    /// A `package.json` exists somewhere in the tree
    pub has_manifest: bool,
    /// The manifest to read dependencies from: the root one when present,
    /// otherwise the first one met during the walk
    pub manifest_path: Option<PathBuf>,
}

impl ProjectDescriptor {
    /// Project name, taken from the last component of the root path.
    pub fn name(&self) -> String {
        project_name(&self.path)
    }

    /// Fails with [`crate::Error::UnknownProjectType`] when no stack was recognized.
    pub fn require_known(&self) -> crate::Result<()> {
        match self.project_type {
            ProjectType::Unknown => Err(crate::Error::UnknownProjectType(self.path.clone())),
            _ => Ok(()),
        }
    }
}

/// Name and tag of the image to build, used verbatim in every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub name: String,
    pub tag: String,
}

impl ImageReference {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }

    /// `<name>:latest`, regardless of the requested tag.
    pub fn latest(&self) -> String {
        format!("{}:latest", self.name)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

/// Scan `path` and classify the project it contains.
///
/// Every discovered file is recorded in `log`. An unrecognized stack is not
/// an error here; callers decide through [`ProjectDescriptor::require_known`].
pub fn scan(path: &Path, log: &dyn EventLog) -> crate::Result<ProjectDescriptor> {
    if !path.is_dir() {
        return Err(crate::Error::NotADirectory(path.to_path_buf()));
    }

    let files = walk_files(path)?;

    let mut has_existing_build_file = false;
    let mut manifests = Vec::new();
    for file in &files {
        log.record(&format!("found file: {}", file.display()));
        let name = file_name(file);
        if is_build_file_name(&name) {
            has_existing_build_file = true;
        }
        if is_node_manifest_name(&name) {
            manifests.push(file.clone());
        }
    }

    let root_manifest = path.join(NODE_MANIFEST_SUFFIX);
    let manifest_path = if manifests.contains(&root_manifest) {
        Some(root_manifest)
    } else {
        manifests.into_iter().next()
    };

    let project_type = if manifest_path.is_some() {
        ProjectType::NodeJs
    } else {
        ProjectType::Unknown
    };
    log.record(&format!(
        "project type: {project_type} (Dockerfile present: {has_existing_build_file})"
    ));

    Ok(ProjectDescriptor {
        path: path.to_path_buf(),
        project_type,
        has_existing_build_file,
        has_manifest: manifest_path.is_some(),
        manifest_path,
    })
}

/// Recursively list every regular file under `root`, depth-first.
///
/// Entries of a directory are visited in file name order. Symlinks are
/// followed; dangling links and links back to one of their own ancestors
/// are logged and skipped.
pub fn walk_files(root: &Path) -> crate::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.loop_ancestor().is_some() => {
                tracing::warn!(error = %e, "skipping symlink loop");
                continue;
            }
            Err(e) if e.depth() > 0 && is_dangling(&e) => {
                tracing::warn!(error = %e, "skipping dangling symlink");
                continue;
            }
            Err(e) => {
                return Err(crate::Error::Walk {
                    path: e.path().unwrap_or(root).to_path_buf(),
                    source: e,
                });
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_dangling(e: &walkdir::Error) -> bool {
    e.io_error()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

/// Whether `name` ends in "dockerfile", ignoring case.
pub fn is_build_file_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(BUILD_FILE_SUFFIX)
}

/// Whether `name` ends in "package.json" (case-sensitive).
pub fn is_node_manifest_name(name: &str) -> bool {
    name.ends_with(NODE_MANIFEST_SUFFIX)
}

/// Last path component as a string, empty when there is none.
pub fn file_name(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => String::new(),
    }
}

/// Name of the project rooted at `path`.
///
/// Falls back to the canonical path for inputs such as `.` that have no
/// usable last component.
pub fn project_name(path: &Path) -> String {
    let name = file_name(path);
    if !name.is_empty() && name != "." && name != ".." {
        return name;
    }
    std::fs::canonicalize(path)
        // arch-lint: allow(no-silent-result-drop) reason="an unresolvable path falls back to a default name"
        .ok()
        .map(|p| file_name(&p))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "app".to_owned())
}
