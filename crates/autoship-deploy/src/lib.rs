//! Image build and deployment drivers for autoship.
//!
//! Every step shells out to an external tool (`docker`, `ssh`/`sshpass`,
//! `kubectl`, `sudo nginx`) through a [`CommandExecutor`], one command at a
//! time.

pub mod builder;
pub mod command;
pub mod container;
pub mod executor;
pub mod kubernetes;
pub mod proxy;

pub use builder::{BuildError, ImageBuilder};
pub use command::CommandError;
pub use container::{ContainerRunner, RemoteTarget, RunError, RunTarget};
pub use executor::{CommandExecutor, RealExecutor};
pub use kubernetes::{DeploymentReport, KubernetesDriver, KubernetesError, KubernetesRequest};
pub use proxy::{ProxyDriver, ProxyError, ProxyInstall};

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}
