//! nginx reverse proxy installation.

use std::fmt;
use std::path::{Path, PathBuf};

use autoship_core::{EventLog, ProxyConfig};

use crate::args;
use crate::command::CommandError;
use crate::executor::{CommandExecutor, RealExecutor};

/// Privileged step of the installation, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyStep {
    Copy,
    Link,
    Reload,
}

impl fmt::Display for ProxyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => f.write_str("copy to sites-available"),
            Self::Link => f.write_str("link into sites-enabled"),
            Self::Reload => f.write_str("reload nginx"),
        }
    }
}

/// Where the site configuration ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyInstall {
    /// Configuration written to the working directory
    pub local_config: PathBuf,
    pub available: String,
    pub enabled: String,
}

impl ProxyInstall {
    pub fn new(work_dir: &Path, project: &str, config: &ProxyConfig) -> Self {
        let file = format!("{project}.conf");
        Self {
            local_config: work_dir.join(&file),
            available: format!("{}/{file}", config.sites_available.trim_end_matches('/')),
            enabled: format!("{}/{file}", config.sites_enabled.trim_end_matches('/')),
        }
    }
}

/// Site configuration forwarding every request to the upstream port.
pub fn render_config(config: &ProxyConfig) -> String {
    format!(
        r#"server {{
    listen {listen};
    server_name _;

    location / {{
        proxy_pass http://localhost:{upstream};
        proxy_http_version 1.1;
        proxy_set_header Upgrade $http_upgrade;
        proxy_set_header Connection 'upgrade';
        proxy_set_header Host $host;
        proxy_cache_bypass $http_upgrade;
    }}
}}
"#,
        listen = config.listen_port,
        upstream = config.upstream_port,
    )
}

/// Installs and activates an nginx site, parameterized over the executor.
pub struct ProxyDriver<E: CommandExecutor = RealExecutor> {
    executor: E,
}

impl ProxyDriver<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for ProxyDriver<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> ProxyDriver<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// Write `<project>.conf` to `work_dir`, then copy, link, and reload.
    ///
    /// When a step fails, the steps already applied are undone in reverse
    /// order before the error is returned.
    pub async fn deploy(
        &self,
        project: &str,
        work_dir: &Path,
        config: &ProxyConfig,
        log: &dyn EventLog,
    ) -> Result<ProxyInstall, ProxyError> {
        let install = ProxyInstall::new(work_dir, project, config);
        std::fs::write(&install.local_config, render_config(config)).map_err(|e| {
            ProxyError::WriteFailed {
                path: install.local_config.clone(),
                source: e,
            }
        })?;
        log.record(&format!("wrote {}", install.local_config.display()));

        let local = install
            .local_config
            .to_str()
            .ok_or_else(|| ProxyError::InvalidPath(install.local_config.clone()))?;

        let steps = [
            (ProxyStep::Copy, args(["cp", local, &install.available])),
            (
                ProxyStep::Link,
                args(["ln", "-sf", &install.available, &install.enabled]),
            ),
            (ProxyStep::Reload, args(["nginx", "-s", "reload"])),
        ];

        let mut applied = Vec::new();
        for (step, step_args) in steps {
            log.record(&format!("nginx: {step}"));
            if let Err(e) = self.executor.exec("sudo", &step_args).await {
                log.record(&format!("nginx: {step} failed: {e}"));
                self.roll_back(&applied, &install, log).await;
                return Err(ProxyError::StepFailed { step, source: e });
            }
            applied.push(step);
        }

        log.record(&format!(
            "nginx now proxies port {} to {}",
            config.listen_port, config.upstream_port
        ));
        Ok(install)
    }

    async fn roll_back(
        &self,
        applied: &[ProxyStep],
        install: &ProxyInstall,
        log: &dyn EventLog,
    ) {
        for step in applied.iter().rev() {
            let undo = match step {
                ProxyStep::Copy => args(["rm", "-f", &install.available]),
                ProxyStep::Link => args(["rm", "-f", &install.enabled]),
                ProxyStep::Reload => continue,
            };
            match self.executor.exec("sudo", &undo).await {
                Ok(_) => log.record(&format!("nginx: rolled back {step}")),
                Err(e) => log.record(&format!("nginx: could not roll back {step}: {e}")),
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("failed to write nginx config {path}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("nginx setup failed at step '{step}'")]
    StepFailed {
        step: ProxyStep,
        source: CommandError,
    },
}
