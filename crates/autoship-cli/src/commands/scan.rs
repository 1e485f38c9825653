use autoship_core::project::project_name;
use autoship_core::{AutoshipConfig, EventLog, ImageReference, RunLog};
use autoship_deploy::{RemoteTarget, RunTarget};

use super::pipeline::{self, BuildOutcome, DeployTarget};
use super::{DeployKind, ScanOptions, prompt};

/// Scan a project, build its image, then deploy it if asked to.
pub async fn scan(options: ScanOptions) -> anyhow::Result<()> {
    let work_dir = std::env::current_dir()?;
    let mut config = AutoshipConfig::load(&work_dir)?;
    if let Some(namespace) = options.namespace.clone() {
        config.kubernetes.namespace = namespace;
    }
    if let Some(timeout) = options.timeout {
        config.kubernetes.readiness_timeout_secs = timeout;
    }
    tracing::debug!(?config, "configuration loaded");

    let log = RunLog::new(&work_dir);
    let result = run(&options, &config, &work_dir, &log).await;
    if let Err(e) = &result {
        log.record(&format!("error: {e:#}"));
    }
    result
}

async fn run(
    options: &ScanOptions,
    config: &AutoshipConfig,
    work_dir: &std::path::Path,
    log: &dyn EventLog,
) -> anyhow::Result<()> {
    let image = image_reference(options)?;
    log.record(&format!(
        "scan of {} started for image {image}",
        options.project_path.display()
    ));

    let (project, dockerfile) =
        match pipeline::build(&options.project_path, &image, config, log).await? {
            BuildOutcome::Built {
                project,
                dockerfile,
            } => (project, dockerfile),
            BuildOutcome::Skipped => {
                println!("Build skipped.");
                return Ok(());
            }
        };
    log.record(&format!("{image} built from {}", dockerfile.display()));

    let kind = match options.deploy {
        Some(kind) => kind,
        None => prompt::deploy_kind()?,
    };

    let target = match kind {
        DeployKind::Skip => {
            println!("Skipping deployment.");
            return Ok(());
        }
        DeployKind::Local => DeployTarget::Run(RunTarget::Local),
        DeployKind::Remote => DeployTarget::Run(RunTarget::Remote(remote_target(options)?)),
        DeployKind::K8s => DeployTarget::Kubernetes,
        DeployKind::Nginx => DeployTarget::Nginx,
    };
    log.record(&format!("deploying with {kind}"));

    pipeline::deploy(target, &project, &image, config, work_dir, log).await
}

fn image_reference(options: &ScanOptions) -> anyhow::Result<ImageReference> {
    let name = match &options.name {
        Some(name) => name.clone(),
        None => prompt::text("Image name", Some(&project_name(&options.project_path)))?,
    };
    let tag = match &options.tag {
        Some(tag) => tag.clone(),
        None => prompt::text("Image tag", Some("latest"))?,
    };

    if name.is_empty() {
        anyhow::bail!("image name must not be empty");
    }
    if tag.is_empty() {
        anyhow::bail!("image tag must not be empty");
    }

    Ok(ImageReference::new(name, tag))
}

fn remote_target(options: &ScanOptions) -> anyhow::Result<RemoteTarget> {
    let host = match &options.remote_host {
        Some(host) => host.clone(),
        None => prompt::text("Remote host", None)?,
    };
    let user = match &options.remote_user {
        Some(user) => user.clone(),
        None => prompt::text("Remote user", None)?,
    };
    let password = prompt::secret("Remote password (empty for key-based auth)")?;

    Ok(RemoteTarget {
        host,
        user,
        password: (!password.is_empty()).then_some(password),
    })
}
