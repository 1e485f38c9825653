//! Kubernetes deployment through `kubectl`.
//!
//! ```text
//! 1. Pin      ── well-known deployment manifest → <name>:latest, IfNotPresent
//! 2. Discover ── *deployment.yaml / *service.yaml under the project
//! 3. Generate ── <project>-deployment.yaml + <project>-service.yaml if none found
//! 4. Apply    ── kubectl apply -f, deployments first, one at a time
//! 5. Wait     ── kubectl get pods until every pod is Running (or timeout)
//! 6. Report   ── kubectl get pods / services, node port lookup
//! ```

pub mod manifest;
pub mod status;

use std::path::{Path, PathBuf};
use std::time::Duration;

use autoship_core::{EventLog, ImageReference, KubernetesConfig};
use tokio::time::Instant;

use crate::args;
use crate::command::CommandError;
use crate::executor::{CommandExecutor, RealExecutor};
use manifest::{ManifestSet, pin_image, write_default_manifests};
use status::{PodStatus, all_running, parse_node_port, parse_pods};

/// Inputs of one Kubernetes deployment.
#[derive(Debug, Clone)]
pub struct KubernetesRequest<'a> {
    pub project_dir: &'a Path,
    /// Directory generated manifests are written to
    pub work_dir: &'a Path,
    pub project_name: &'a str,
    pub image: &'a ImageReference,
    pub namespace: &'a str,
    /// Manifest pinned to `<name>:latest`, relative to `project_dir`
    pub deployment_manifest: &'a str,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl<'a> KubernetesRequest<'a> {
    pub fn new(
        project_dir: &'a Path,
        work_dir: &'a Path,
        project_name: &'a str,
        image: &'a ImageReference,
        config: &'a KubernetesConfig,
    ) -> Self {
        Self {
            project_dir,
            work_dir,
            project_name,
            image,
            namespace: &config.namespace,
            deployment_manifest: &config.deployment_manifest,
            timeout: Duration::from_secs(config.readiness_timeout_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        }
    }
}

/// Outcome of a deployment whose pods all reached `Running`.
#[derive(Debug, Clone, Default)]
pub struct DeploymentReport {
    pub manifests: ManifestSet,
    pub pods: Vec<PodStatus>,
    /// Raw `kubectl get pods` output of the final status query
    pub pods_table: Option<String>,
    /// Raw `kubectl get services` output of the final status query
    pub services_table: Option<String>,
    pub node_port: Option<u16>,
}

/// Drives `kubectl`, parameterized over the executor for testability.
pub struct KubernetesDriver<E: CommandExecutor = RealExecutor> {
    executor: E,
}

impl KubernetesDriver<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for KubernetesDriver<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> KubernetesDriver<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// Run the full pipeline. Nothing applied is rolled back on failure.
    pub async fn deploy(
        &self,
        request: &KubernetesRequest<'_>,
        log: &dyn EventLog,
    ) -> Result<DeploymentReport, KubernetesError> {
        pin_well_known_manifest(request, log)?;
        let manifests = prepare_manifests(request, log)?;
        self.apply_all(&manifests, log).await?;
        let pods = self
            .wait_for_pods(request.namespace, request.timeout, request.poll_interval, log)
            .await?;

        let mut report = self.report(request, log).await;
        report.manifests = manifests;
        report.pods = pods;
        Ok(report)
    }

    /// `kubectl apply -f` every manifest, deployments first, sequentially.
    pub async fn apply_all(
        &self,
        manifests: &ManifestSet,
        log: &dyn EventLog,
    ) -> Result<(), KubernetesError> {
        for file in manifests.apply_order() {
            let path = file
                .to_str()
                .ok_or_else(|| KubernetesError::InvalidPath(file.clone()))?;
            log.record(&format!("applying {}", file.display()));

            let output = self
                .executor
                .exec("kubectl", &args(["apply", "-f", path]))
                .await
                .map_err(|e| {
                    log.record(&format!("failed to apply {}: {e}", file.display()));
                    KubernetesError::ManifestApplyFailed {
                        file: file.clone(),
                        source: e,
                    }
                })?;
            log.record(output.trim());
        }
        Ok(())
    }

    /// Poll `kubectl get pods` every `interval` until all pods are `Running`.
    ///
    /// Fails with [`KubernetesError::ReadinessTimeout`] once `timeout` has
    /// elapsed since the first query without an all-running sample.
    pub async fn wait_for_pods(
        &self,
        namespace: &str,
        timeout: Duration,
        interval: Duration,
        log: &dyn EventLog,
    ) -> Result<Vec<PodStatus>, KubernetesError> {
        let started = Instant::now();
        log.record(&format!(
            "waiting up to {}s for pods in namespace {namespace}",
            timeout.as_secs()
        ));

        loop {
            let output = self
                .executor
                .exec("kubectl", &args(["get", "pods", "-n", namespace]))
                .await
                .map_err(|e| KubernetesError::PodStatus { source: e })?;

            let pods = parse_pods(&output);
            if all_running(&pods) {
                log.record(&format!("all {} pod(s) running", pods.len()));
                return Ok(pods);
            }

            if started.elapsed() >= timeout {
                log.record(&format!("pods not ready after {}s", timeout.as_secs()));
                return Err(KubernetesError::ReadinessTimeout {
                    namespace: namespace.to_owned(),
                    timeout_secs: timeout.as_secs(),
                });
            }

            let pending: Vec<String> = pods
                .iter()
                .filter(|p| p.status != status::RUNNING)
                .map(|p| format!("{} ({})", p.name, p.status))
                .collect();
            if pending.is_empty() {
                log.record("no pods yet, retrying");
            } else {
                log.record(&format!("waiting for: {}", pending.join(", ")));
            }

            tokio::time::sleep(interval).await;
        }
    }

    /// Query pods and services once more and look up the node port.
    ///
    /// Never fails; query errors become warnings in the log.
    pub async fn report(
        &self,
        request: &KubernetesRequest<'_>,
        log: &dyn EventLog,
    ) -> DeploymentReport {
        let namespace = request.namespace;
        let mut report = DeploymentReport::default();

        match self
            .executor
            .exec("kubectl", &args(["get", "pods", "-n", namespace]))
            .await
        {
            Ok(output) => report.pods_table = Some(output),
            Err(e) => log.record(&format!("warning: could not list pods: {e}")),
        }

        match self
            .executor
            .exec("kubectl", &args(["get", "services", "-n", namespace]))
            .await
        {
            Ok(output) => {
                report.node_port = parse_node_port(&output, request.project_name);
                report.services_table = Some(output);
            }
            Err(e) => log.record(&format!("warning: could not list services: {e}")),
        }

        match report.node_port {
            Some(port) => log.record(&format!("service available on node port {port}")),
            None => log.record("warning: could not determine node port"),
        }

        report
    }
}

/// Pin the well-known deployment manifest to `<name>:latest`, if present.
///
/// The requested tag is not used for this file.
pub fn pin_well_known_manifest(
    request: &KubernetesRequest<'_>,
    log: &dyn EventLog,
) -> Result<(), KubernetesError> {
    let path = request.project_dir.join(request.deployment_manifest);
    if !path.is_file() {
        log.record(&format!("no {} to pin", path.display()));
        return Ok(());
    }

    let latest = request.image.latest();
    if request.image.tag != "latest" {
        tracing::warn!(
            requested = %request.image,
            applied = %latest,
            "deployment manifest is pinned to the latest tag"
        );
        log.record(&format!(
            "warning: {} uses {latest}, not the requested {}",
            path.display(),
            request.image
        ));
    }

    let pinned = pin_image(&path, &latest)?;
    log.record(&format!(
        "pinned {pinned} container(s) in {} to {latest}",
        path.display()
    ));
    Ok(())
}

/// Manifests found under the project, or freshly generated ones in the
/// working directory when there are none.
pub fn prepare_manifests(
    request: &KubernetesRequest<'_>,
    log: &dyn EventLog,
) -> Result<ManifestSet, KubernetesError> {
    let found = ManifestSet::discover(request.project_dir)?;
    if !found.is_empty() {
        log.record(&format!(
            "found {} deployment and {} service manifest(s)",
            found.deployment_files.len(),
            found.service_files.len()
        ));
        return Ok(found);
    }

    let generated = write_default_manifests(request.work_dir, request.project_name, request.image)?;
    log.record(&format!(
        "generated {} and {}",
        generated.deployment_files[0].display(),
        generated.service_files[0].display()
    ));
    Ok(generated)
}

#[derive(Debug, thiserror::Error)]
pub enum KubernetesError {
    #[error(transparent)]
    Scan(#[from] autoship_core::Error),

    #[error("failed to read manifest {path}")]
    ManifestRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}")]
    ManifestParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to write manifest {path}")]
    ManifestWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("manifest path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("kubectl apply failed for {file}")]
    ManifestApplyFailed { file: PathBuf, source: CommandError },

    #[error("failed to query pod status")]
    PodStatus { source: CommandError },

    #[error("pods in namespace '{namespace}' not running after {timeout_secs}s")]
    ReadinessTimeout {
        namespace: String,
        timeout_secs: u64,
    },
}
