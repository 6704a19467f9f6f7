//! Docker Engine API client for snapshotting swarm services.
//!
//! The exporter core only ever sees the fully-resolved [`Service`] records
//! produced here; network-id resolution and image-reference splitting are
//! this client's job, not the mapping's.

use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::model::{
    Image, Mount, Network, PortConfig, Service, ServiceMode, STACK_NAMESPACE_LABEL,
};

/// Minimum Docker Engine API version required (Docker 1.13.1 or later).
pub const DOCKER_API_MIN_VERSION: &str = "1.26";

/// Errors raised while talking to the docker engine. All of them abort the
/// export; nothing is written once the snapshot fails.
#[derive(Error, Debug)]
pub enum SwarmError {
    #[error("cannot reach the docker engine: {0}")]
    Connectivity(String),

    #[error("docker engine returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected engine response: {0}")]
    Decode(String),
}

/// Cluster snapshot seam. The export pipeline takes this as a parameter so
/// tests can substitute a canned cluster.
#[async_trait]
pub trait SwarmClient: Send + Sync {
    /// Every service in the cluster, with network ids resolved to records.
    async fn list_services(&self) -> Result<Vec<Service>, SwarmError>;
}

// ============================================================================
// Wire format (Docker Engine API, PascalCase JSON)
// ============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawService {
    #[serde(rename = "ID")]
    id: String,
    spec: RawServiceSpec,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawServiceSpec {
    name: String,
    labels: HashMap<String, String>,
    task_template: RawTaskTemplate,
    mode: RawMode,
    endpoint_spec: RawEndpointSpec,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawTaskTemplate {
    container_spec: RawContainerSpec,
    placement: RawPlacement,
    networks: Vec<RawNetworkAttachment>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawContainerSpec {
    image: String,
    command: Vec<String>,
    args: Vec<String>,
    env: Vec<String>,
    mounts: Vec<RawMount>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawMount {
    #[serde(rename = "Type")]
    mount_type: String,
    source: String,
    target: String,
    read_only: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawPlacement {
    constraints: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawNetworkAttachment {
    target: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawMode {
    replicated: Option<RawReplicated>,
    global: Option<RawGlobal>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawReplicated {
    replicas: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawGlobal {}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawEndpointSpec {
    ports: Vec<RawPort>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawPort {
    protocol: String,
    target_port: u32,
    published_port: u32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawNetwork {
    #[serde(rename = "Id")]
    id: String,
    name: String,
    driver: String,
}

// ============================================================================
// Pure conversion (no I/O)
// ============================================================================

fn image_split_re() -> &'static Regex {
    static IMAGE_SPLIT: OnceLock<Regex> = OnceLock::new();
    IMAGE_SPLIT.get_or_init(|| Regex::new("[:@]").expect("static pattern"))
}

/// Split an engine image reference (`name:tag@digest`) into its parts.
/// Missing parts come back empty; a malformed reference is passed through
/// rather than rejected.
fn parse_image(reference: &str) -> Image {
    let mut parts = image_split_re().splitn(reference, 3);
    Image {
        name: parts.next().unwrap_or_default().to_string(),
        tag: parts.next().unwrap_or_default().to_string(),
        digest: parts.next().unwrap_or_default().to_string(),
    }
}

fn mode_from_raw(mode: &RawMode) -> ServiceMode {
    if mode.global.is_some() {
        ServiceMode::Global
    } else {
        ServiceMode::Replicated {
            replicas: mode.replicated.as_ref().and_then(|r| r.replicas),
        }
    }
}

fn service_from_raw(raw: RawService, networks: &HashMap<String, Network>) -> Service {
    let spec = raw.spec;
    let container = spec.task_template.container_spec;

    let namespace = spec
        .labels
        .get(STACK_NAMESPACE_LABEL)
        .cloned()
        .unwrap_or_default();

    let resolved_networks = spec
        .task_template
        .networks
        .iter()
        .filter_map(|attachment| match networks.get(&attachment.target) {
            Some(network) => Some(network.clone()),
            None => {
                warn!(
                    "service {}: network id {} not found in cluster, skipping",
                    spec.name, attachment.target
                );
                None
            }
        })
        .collect();

    let mounts = container
        .mounts
        .into_iter()
        .map(|m| Mount {
            mount_type: m.mount_type,
            target: m.target,
            source: m.source,
            read_only: m.read_only,
        })
        .collect();

    let ports = spec
        .endpoint_spec
        .ports
        .into_iter()
        .map(|p| PortConfig {
            protocol: p.protocol,
            target_port: p.target_port,
            published_port: p.published_port,
        })
        .collect();

    Service {
        id: raw.id,
        namespace,
        name: spec.name,
        image: parse_image(&container.image),
        mode: mode_from_raw(&spec.mode),
        labels: spec.labels,
        command: container.command,
        args: container.args,
        env: container.env,
        mounts,
        ports,
        networks: resolved_networks,
        placement_constraints: spec.task_template.placement.constraints,
    }
}

/// Normalize a docker host string into an http(s) base URL.
fn base_url_from_host(host: &str, tls: bool) -> Result<String, SwarmError> {
    let trimmed = host.trim_end_matches('/');

    if let Some(rest) = trimmed.strip_prefix("tcp://") {
        let scheme = if tls { "https" } else { "http" };
        return Ok(format!("{}://{}", scheme, rest));
    }

    if let Some(rest) = trimmed.strip_prefix("http://") {
        if tls {
            return Ok(format!("https://{}", rest));
        }
        return Ok(trimmed.to_string());
    }

    if trimmed.starts_with("https://") {
        return Ok(trimmed.to_string());
    }

    Err(SwarmError::Connectivity(format!(
        "unsupported docker host '{}': use a tcp:// or http(s):// address",
        host
    )))
}

// ============================================================================
// I/O implementation (Docker Engine REST API over HTTP)
// ============================================================================

#[derive(Clone)]
pub struct DockerClient {
    client: reqwest::Client,
    base_url: String,
}

impl DockerClient {
    pub fn new(host: &str, tls: bool) -> Result<Self, SwarmError> {
        let base_url = base_url_from_host(host, tls)?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, SwarmError> {
        let url = format!("{}/v{}/{}", self.base_url, DOCKER_API_MIN_VERSION, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SwarmError::Connectivity(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(SwarmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SwarmError::Decode(e.to_string()))
    }

    /// All networks in the cluster, indexed by id for attachment resolution.
    async fn list_networks(&self) -> Result<HashMap<String, Network>, SwarmError> {
        let raw: Vec<RawNetwork> = self.get_json("networks").await?;
        Ok(raw
            .into_iter()
            .map(|n| {
                (
                    n.id.clone(),
                    Network {
                        name: n.name,
                        id: n.id,
                        driver: n.driver,
                    },
                )
            })
            .collect())
    }
}

#[async_trait]
impl SwarmClient for DockerClient {
    async fn list_services(&self) -> Result<Vec<Service>, SwarmError> {
        let networks = self.list_networks().await?;
        let raw: Vec<RawService> = self.get_json("services").await?;

        debug!(
            "snapshot: {} services, {} networks",
            raw.len(),
            networks.len()
        );

        Ok(raw
            .into_iter()
            .map(|service| service_from_raw(service, &networks))
            .collect())
    }
}
