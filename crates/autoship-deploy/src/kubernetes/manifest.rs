//! Manifest discovery, generation, and image pinning.

use std::path::{Path, PathBuf};

use autoship_core::project::file_name;
use autoship_core::{ImageReference, walk_files};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use super::KubernetesError;

const DEPLOYMENT_SUFFIX: &str = "deployment.yaml";
const SERVICE_SUFFIX: &str = "service.yaml";

/// Pull policy set on pinned containers so a locally built image is used.
pub const PULL_IF_NOT_PRESENT: &str = "IfNotPresent";

/// Manifest files split by kind, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestSet {
    pub deployment_files: Vec<PathBuf>,
    pub service_files: Vec<PathBuf>,
}

impl ManifestSet {
    /// Classify every file under `root`.
    pub fn discover(root: &Path) -> Result<Self, KubernetesError> {
        Ok(Self::classify(walk_files(root)?))
    }

    /// Split `files` by name suffix; anything else is ignored.
    pub fn classify(files: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut set = Self::default();
        for file in files {
            match ManifestKind::of(&file_name(&file)) {
                Some(ManifestKind::Deployment) => set.deployment_files.push(file),
                Some(ManifestKind::Service) => set.service_files.push(file),
                None => {}
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.deployment_files.is_empty() && self.service_files.is_empty()
    }

    /// Deployments first, then services.
    pub fn apply_order(&self) -> impl Iterator<Item = &PathBuf> {
        self.deployment_files.iter().chain(self.service_files.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Deployment,
    Service,
}

impl ManifestKind {
    /// Kind of a manifest file from its name, `None` when it is neither.
    pub fn of(name: &str) -> Option<Self> {
        if name.ends_with(SERVICE_SUFFIX) {
            Some(Self::Service)
        } else if name.ends_with(DEPLOYMENT_SUFFIX) {
            Some(Self::Deployment)
        } else {
            None
        }
    }
}

/// Single-replica Deployment running `image` on container port 80.
pub fn deployment_manifest(project: &str, image: &ImageReference) -> String {
    format!(
        r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: {project}-deployment
  labels:
    app: {project}
spec:
  replicas: 1
  selector:
    matchLabels:
      app: {project}
  template:
    metadata:
      labels:
        app: {project}
    spec:
      containers:
        - name: {project}
          image: {image}
          imagePullPolicy: {PULL_IF_NOT_PRESENT}
          ports:
            - containerPort: 80
"#
    )
}

/// NodePort Service forwarding port 80 to the pods' port 80.
pub fn service_manifest(project: &str) -> String {
    format!(
        r#"apiVersion: v1
kind: Service
metadata:
  name: {project}-service
spec:
  type: NodePort
  selector:
    app: {project}
  ports:
    - protocol: TCP
      port: 80
      targetPort: 80
"#
    )
}

/// Write `<project>-deployment.yaml` and `<project>-service.yaml` into `dir`.
pub fn write_default_manifests(
    dir: &Path,
    project: &str,
    image: &ImageReference,
) -> Result<ManifestSet, KubernetesError> {
    let deployment = dir.join(format!("{project}-deployment.yaml"));
    let service = dir.join(format!("{project}-service.yaml"));

    write_file(&deployment, &deployment_manifest(project, image))?;
    write_file(&service, &service_manifest(project))?;

    Ok(ManifestSet {
        deployment_files: vec![deployment],
        service_files: vec![service],
    })
}

/// Point every container of the manifest at `image` with
/// `imagePullPolicy: IfNotPresent`. Returns the number of containers changed.
pub fn pin_image(path: &Path, image: &str) -> Result<usize, KubernetesError> {
    let content = std::fs::read_to_string(path).map_err(|e| KubernetesError::ManifestRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&content) {
        let value = Value::deserialize(document).map_err(|e| KubernetesError::ManifestParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        if !value.is_null() {
            documents.push(value);
        }
    }

    let mut pinned = 0;
    for document in &mut documents {
        pinned += pin_document(document, image);
    }

    let mut rendered = Vec::with_capacity(documents.len());
    for document in &documents {
        let text = serde_yaml::to_string(document).map_err(|e| KubernetesError::ManifestParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        rendered.push(text);
    }

    write_file(path, &rendered.join("---\n"))?;
    Ok(pinned)
}

fn pin_document(document: &mut Value, image: &str) -> usize {
    let containers = document
        .get_mut("spec")
        .and_then(|spec| spec.get_mut("template"))
        .and_then(|template| template.get_mut("spec"))
        .and_then(|pod| pod.get_mut("containers"))
        .and_then(Value::as_sequence_mut);

    let Some(containers) = containers else {
        return 0;
    };

    let mut pinned = 0;
    for container in containers.iter_mut().filter_map(Value::as_mapping_mut) {
        set(container, "image", image);
        set(container, "imagePullPolicy", PULL_IF_NOT_PRESENT);
        pinned += 1;
    }
    pinned
}

fn set(mapping: &mut Mapping, key: &str, value: &str) {
    mapping.insert(
        Value::String(key.to_owned()),
        Value::String(value.to_owned()),
    );
}

fn write_file(path: &Path, content: &str) -> Result<(), KubernetesError> {
    std::fs::write(path, content).map_err(|e| KubernetesError::ManifestWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
