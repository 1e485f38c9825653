use autoship_build::DockerfileSynthesizer;
use autoship_core::{AutoshipConfig, EventLog, ImageReference, ProjectDescriptor};
use autoship_deploy::{
    ContainerRunner, ImageBuilder, KubernetesDriver, KubernetesRequest, ProxyDriver, RunTarget,
};
use std::path::{Path, PathBuf};

/// Result of the scan → synthesize → build stage.
pub(crate) enum BuildOutcome {
    Built {
        project: ProjectDescriptor,
        dockerfile: PathBuf,
    },
    /// No supported stack was detected; nothing was built.
    Skipped,
}

/// Deployment selected by the operator, with its inputs resolved.
pub(crate) enum DeployTarget {
    Run(RunTarget),
    Kubernetes,
    Nginx,
}

/// Scan the project, generate a Dockerfile if it has none, and build the image.
pub(crate) async fn build(
    project_dir: &Path,
    image: &ImageReference,
    config: &AutoshipConfig,
    log: &dyn EventLog,
) -> anyhow::Result<BuildOutcome> {
    println!("Scanning {}...", project_dir.display());
    let project = autoship_core::scan(project_dir, log)?;

    if let Err(e) = project.require_known() {
        log.record(&format!("warning: {e}"));
        println!("Warning: {e}");
        return Ok(BuildOutcome::Skipped);
    }
    println!("Detected {} project", project.project_type);

    if project.has_existing_build_file {
        println!("Using existing Dockerfile");
    } else {
        println!("Generating Dockerfile...");
        let path = DockerfileSynthesizer::new(&config.build, &project).synthesize(log)?;
        println!("Generated {}", path.display());
    }

    println!("Building image {image}...");
    let dockerfile = ImageBuilder::new().build(project_dir, image, log).await?;
    println!("Built {image}");

    Ok(BuildOutcome::Built {
        project,
        dockerfile,
    })
}

/// Run the selected deployment driver against the built image.
pub(crate) async fn deploy(
    target: DeployTarget,
    project: &ProjectDescriptor,
    image: &ImageReference,
    config: &AutoshipConfig,
    work_dir: &Path,
    log: &dyn EventLog,
) -> anyhow::Result<()> {
    let project_name = project.name();

    match target {
        DeployTarget::Run(run_target) => {
            println!("Starting container ({run_target})...");
            let container_id = ContainerRunner::new()
                .run(image, &run_target, &config.run, log)
                .await?;
            println!(
                "Container {container_id} running, port {} → {}",
                config.run.host_port, config.run.container_port
            );
        }
        DeployTarget::Kubernetes => {
            println!("Deploying to Kubernetes...");
            let request = KubernetesRequest::new(
                &project.path,
                work_dir,
                &project_name,
                image,
                &config.kubernetes,
            );
            let report = KubernetesDriver::new().deploy(&request, log).await?;

            println!();
            if let Some(pods) = &report.pods_table {
                println!("{}", pods.trim_end());
            }
            if let Some(services) = &report.services_table {
                println!("{}", services.trim_end());
            }
            println!();
            match report.node_port {
                Some(port) => println!("Deployed: available on node port {port}"),
                None => println!("Deployed, but the node port could not be determined"),
            }
        }
        DeployTarget::Nginx => {
            println!("Configuring nginx...");
            let install = ProxyDriver::new()
                .deploy(&project_name, work_dir, &config.proxy, log)
                .await?;
            println!(
                "nginx site {} enabled: port {} → {}",
                install.enabled, config.proxy.listen_port, config.proxy.upstream_port
            );
        }
    }

    Ok(())
}
