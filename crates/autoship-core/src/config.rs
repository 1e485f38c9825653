use serde::{Deserialize, Serialize};

/// File name of the optional configuration, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "autoship.toml";

/// autoship.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoshipConfig {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub kubernetes: KubernetesConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Base image of the synthesized Node.js Dockerfile
    #[serde(default = "default_node_image")]
    pub node_image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Host port published by `docker run -p`
    #[serde(default = "default_app_port")]
    pub host_port: u16,
    /// Container port published by `docker run -p`
    #[serde(default = "default_app_port")]
    pub container_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubernetesConfig {
    /// Namespace queried while waiting for pods
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Give up waiting for pods after this many seconds
    #[serde(default = "default_readiness_timeout_secs")]
    pub readiness_timeout_secs: u64,
    /// Delay between two pod status queries
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Deployment manifest whose image is pinned to `<name>:latest`,
    /// relative to the project root
    #[serde(default = "default_deployment_manifest")]
    pub deployment_manifest: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Port nginx listens on
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Local port requests are forwarded to
    #[serde(default = "default_upstream_port")]
    pub upstream_port: u16,
    #[serde(default = "default_sites_available")]
    pub sites_available: String,
    #[serde(default = "default_sites_enabled")]
    pub sites_enabled: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            node_image: default_node_image(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            host_port: default_app_port(),
            container_port: default_app_port(),
        }
    }
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            readiness_timeout_secs: default_readiness_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            deployment_manifest: default_deployment_manifest(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            upstream_port: default_upstream_port(),
            sites_available: default_sites_available(),
            sites_enabled: default_sites_enabled(),
        }
    }
}

impl AutoshipConfig {
    /// Load from autoship.toml in the given directory, or return defaults if not found.
    pub fn load(work_dir: &std::path::Path) -> crate::Result<Self> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })
        } else {
            Ok(Self::default())
        }
    }
}

fn default_node_image() -> String {
    "node:18-alpine".to_owned()
}

fn default_app_port() -> u16 {
    8000
}

fn default_namespace() -> String {
    "default".to_owned()
}

fn default_readiness_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_deployment_manifest() -> String {
    "deployment.yaml".to_owned()
}

fn default_listen_port() -> u16 {
    80
}

fn default_upstream_port() -> u16 {
    4000
}

fn default_sites_available() -> String {
    "/etc/nginx/sites-available".to_owned()
}

fn default_sites_enabled() -> String {
    "/etc/nginx/sites-enabled".to_owned()
}
