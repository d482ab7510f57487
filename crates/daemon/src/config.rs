// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway configuration, loaded once from a JSON file and validated at startup.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

const WORKSPACE_ID_PLACEHOLDER: &str = "{{ .workspaceID }}";
const PORT_PLACEHOLDER: &str = "{{ .port }}";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub ingress: IngressConfig,
    pub proxy: ProxyConfig,
    pub workspace_info_provider_config: WorkspaceInfoProviderConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Address of the health and metrics listener.
    #[serde(default)]
    pub readiness_probe_addr: Option<SocketAddr>,
    /// How long workspace routes wait for an unknown workspace to appear.
    #[serde(default, with = "humantime_serde::option")]
    pub workspace_info_wait: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressConfig {
    pub http_address: SocketAddr,
    #[serde(default)]
    pub https_address: Option<SocketAddr>,
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    pub certificate: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    #[serde(default)]
    pub transport_config: TransportConfig,
    #[serde(default)]
    pub blob_server: Option<BlobServerConfig>,
    pub gitpod_installation: GitpodInstallation,
    pub workspace_pod_config: WorkspacePodConfig,
    #[serde(default)]
    pub builtin_pages: BuiltinPagesConfig,
}

/// Backend connection pool tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportConfig {
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub idle_conn_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub websocket_idle_conn_timeout: Duration,
    pub max_idle_conns: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            idle_conn_timeout: Duration::from_secs(60),
            websocket_idle_conn_timeout: Duration::from_secs(180),
            max_idle_conns: 100,
        }
    }
}

/// Static-asset server location.
#[derive(Debug, Clone, Deserialize)]
pub struct BlobServerConfig {
    pub scheme: String,
    pub host: String,
}

impl BlobServerConfig {
    /// Base URL for one image, e.g. `http://blobserve:4000/<image>`.
    pub fn image_url(&self, image: &str) -> Result<Url, url::ParseError> {
        let image = image.trim_start_matches('/');
        Url::parse(&format!("{}://{}/{}", self.scheme, self.host, image))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitpodInstallation {
    pub scheme: String,
    pub host_name: String,
    /// Suffix appended to workspace hosts, e.g. `.ws.example.com`.
    pub workspace_host_suffix: String,
}

impl GitpodInstallation {
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.host_name)
    }

    /// Host serving versioned static assets.
    pub fn blobserve_host(&self) -> String {
        format!("blobserve{}", self.workspace_host_suffix)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacePodConfig {
    /// URL template of the workspace service, e.g. `http://ws-{{ .workspaceID }}-theia:{{ .port }}`.
    pub service_template: String,
    /// URL template of an exposed port.
    pub port_service_template: String,
    pub ide_port: u16,
    pub supervisor_port: u16,
    #[serde(default)]
    pub supervisor_image: String,
}

impl WorkspacePodConfig {
    pub fn ide_url(&self, workspace_id: &str) -> Result<Url, url::ParseError> {
        render(&self.service_template, workspace_id, &self.ide_port.to_string())
    }

    pub fn supervisor_url(&self, workspace_id: &str) -> Result<Url, url::ParseError> {
        render(&self.service_template, workspace_id, &self.supervisor_port.to_string())
    }

    pub fn port_url(&self, workspace_id: &str, port: &str) -> Result<Url, url::ParseError> {
        render(&self.port_service_template, workspace_id, port)
    }
}

fn render(template: &str, workspace_id: &str, port: &str) -> Result<Url, url::ParseError> {
    Url::parse(
        &template.replace(WORKSPACE_ID_PLACEHOLDER, workspace_id).replace(PORT_PLACEHOLDER, port),
    )
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuiltinPagesConfig {
    #[serde(default)]
    pub location: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceInfoProviderConfig {
    /// Base URL of the orchestrator API.
    pub ws_manager_addr: Url,
    #[serde(default = "default_reconnect_interval", with = "humantime_serde")]
    pub reconnect_interval: Duration,
}

fn default_reconnect_interval() -> Duration {
    Duration::from_secs(3)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingStrategy {
    #[default]
    Host,
    PathAndPort,
    PathAndHost,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingConfig {
    #[serde(default)]
    pub strategy: RoutingStrategy,
    /// Header carrying the original host when running behind another proxy.
    #[serde(default = "default_host_header")]
    pub host_header: String,
    #[serde(default)]
    pub path_prefix: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            strategy: RoutingStrategy::default(),
            host_header: default_host_header(),
            path_prefix: String::new(),
        }
    }
}

fn default_host_header() -> String {
    "x-wsproxy-host".to_string()
}

impl Config {
    /// Read, parse and validate the config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_slice(&raw)
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_slice(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let install = &self.proxy.gitpod_installation;
        if install.host_name.is_empty() {
            return Err(invalid("proxy.gitpodInstallation.hostName is required"));
        }
        if install.scheme != "http" && install.scheme != "https" {
            return Err(invalid("proxy.gitpodInstallation.scheme must be http or https"));
        }
        if install.workspace_host_suffix.is_empty() {
            return Err(invalid("proxy.gitpodInstallation.workspaceHostSuffix is required"));
        }

        let pod = &self.proxy.workspace_pod_config;
        if pod.ide_port == 0 || pod.supervisor_port == 0 {
            return Err(invalid("proxy.workspacePodConfig ports must be non-zero"));
        }
        check_template("serviceTemplate", &pod.service_template)?;
        check_template("portServiceTemplate", &pod.port_service_template)?;

        let transport = &self.proxy.transport_config;
        if transport.max_idle_conns == 0 {
            return Err(invalid("proxy.transportConfig.maxIdleConns must be positive"));
        }
        if transport.connect_timeout.is_zero() {
            return Err(invalid("proxy.transportConfig.connectTimeout must be positive"));
        }

        if let Some(blob) = &self.proxy.blob_server {
            if blob.host.is_empty() {
                return Err(invalid("proxy.blobServer.host is required"));
            }
            blob.image_url("validate")
                .map_err(|e| invalid(format!("proxy.blobServer is not a valid URL: {e}")))?;
        }

        if self.ingress.https_address.is_some() && self.ingress.tls.is_none() {
            return Err(invalid("ingress.httpsAddress requires ingress.tls"));
        }
        if self.workspace_info_provider_config.reconnect_interval.is_zero() {
            return Err(invalid("workspaceInfoProviderConfig.reconnectInterval must be positive"));
        }
        Ok(())
    }
}

fn check_template(name: &str, template: &str) -> Result<(), ConfigError> {
    if template.is_empty() {
        return Err(invalid(format!("proxy.workspacePodConfig.{name} is required")));
    }
    let url = render(template, "a7dcf2f0-6a42-4d4b-9c4e-7f1b2f1f0d3a", "3000")
        .map_err(|e| invalid(format!("proxy.workspacePodConfig.{name} is not a URL: {e}")))?;
    if !url.has_host() {
        return Err(invalid(format!("proxy.workspacePodConfig.{name} has no host")));
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

/// Serde helpers for humantime duration strings such as `"10s"` or `"1m 30s"`.
mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(s) => humantime::parse_duration(&s).map(Some).map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
