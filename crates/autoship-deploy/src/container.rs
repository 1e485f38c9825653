//! `docker run` of the built image, on this host or over ssh.

use std::fmt;

use autoship_core::{EventLog, ImageReference, RunConfig};

use crate::command::CommandError;
use crate::executor::{CommandExecutor, RealExecutor};

/// Where the container is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTarget {
    Local,
    Remote(RemoteTarget),
}

/// ssh destination. The password, when set, is handed to `sshpass -p` as is.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub host: String,
    pub user: String,
    pub password: Option<String>,
}

impl RemoteTarget {
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

impl fmt::Debug for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTarget")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl fmt::Display for RunTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote(remote) => write!(f, "remote {}", remote.destination()),
        }
    }
}

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

/// Starts the built image detached, publishing the configured port.
pub struct ContainerRunner<E: CommandExecutor = RealExecutor> {
    executor: E,
}

impl ContainerRunner<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for ContainerRunner<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> ContainerRunner<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// Run the container and wait for `docker run` to return.
    ///
    /// Returns the container id printed by docker.
    pub async fn run(
        &self,
        image: &ImageReference,
        target: &RunTarget,
        config: &RunConfig,
        log: &dyn EventLog,
    ) -> Result<String, RunError> {
        let command = run_command(image, target, config);
        log.record(&format!("starting {image} on {target}"));

        match self.executor.exec(&command.program, &command.args).await {
            Ok(output) => {
                let container_id = output.trim().to_owned();
                log.record(&format!("container {container_id} started on {target}"));
                Ok(container_id)
            }
            Err(e) => {
                log.record(&format!("failed to start {image} on {target}: {e}"));
                Err(RunError {
                    target: target.to_string(),
                    source: e,
                })
            }
        }
    }
}

/// `docker run` invocation as seen by the docker host.
pub fn docker_run_args(image: &ImageReference, config: &RunConfig) -> Vec<String> {
    vec![
        "run".to_owned(),
        "-d".to_owned(),
        "-p".to_owned(),
        format!("{}:{}", config.host_port, config.container_port),
        image.to_string(),
    ]
}

/// Full command line for `target`.
///
/// Remote runs hand ssh a single command string, which the remote shell
/// interprets; name and tag are inserted without escaping.
pub fn run_command(image: &ImageReference, target: &RunTarget, config: &RunConfig) -> CommandLine {
    let docker_args = docker_run_args(image, config);
    match target {
        RunTarget::Local => CommandLine {
            program: "docker".to_owned(),
            args: docker_args,
        },
        RunTarget::Remote(remote) => {
            let remote_command = format!("docker {}", docker_args.join(" "));
            match remote.password.as_deref().filter(|p| !p.is_empty()) {
                Some(password) => CommandLine {
                    program: "sshpass".to_owned(),
                    args: vec![
                        "-p".to_owned(),
                        password.to_owned(),
                        "ssh".to_owned(),
                        "-o".to_owned(),
                        "StrictHostKeyChecking=no".to_owned(),
                        remote.destination(),
                        remote_command,
                    ],
                },
                None => CommandLine {
                    program: "ssh".to_owned(),
                    args: vec![remote.destination(), remote_command],
                },
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("docker run failed on {target}")]
pub struct RunError {
    pub target: String,
    pub source: CommandError,
}
