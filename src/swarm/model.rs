//! Snapshot shapes for services running in a swarm cluster.
//!
//! Everything here is read-only input to the compose mapping. The client
//! materializes one [`Service`] per swarm service, with network ids already
//! resolved to full records, and the mapping passes never mutate it.

use std::collections::HashMap;

use serde::Serialize;

/// Label the swarm engine puts on a service to record stack membership.
pub const STACK_NAMESPACE_LABEL: &str = "com.docker.stack.namespace";

/// Parsed image reference. `digest` is empty when the engine did not pin one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Image {
    pub name: String,
    pub tag: String,
    pub digest: String,
}

/// Scheduling mode of a swarm service.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceMode {
    /// One task on every node in the cluster.
    Global,
    /// A fixed number of tasks. The engine may omit the count.
    Replicated { replicas: Option<u64> },
}

impl Default for ServiceMode {
    fn default() -> Self {
        ServiceMode::Replicated { replicas: None }
    }
}

/// A container mount, carried verbatim into the compose `volumes` section.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Mount {
    #[serde(rename = "type")]
    pub mount_type: String,
    pub target: String,
    pub source: String,
    #[serde(rename = "readonly", skip_serializing_if = "is_false")]
    pub read_only: bool,
}

/// A published port as reported by the engine's endpoint spec.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortConfig {
    pub protocol: String,
    pub target_port: u32,
    pub published_port: u32,
}

/// A network record, already resolved from the attachment id by the client.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Network {
    pub name: String,
    pub id: String,
    pub driver: String,
}

/// One swarm service as seen in the cluster snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Service {
    pub id: String,
    /// Stack namespace; empty when the service was not deployed as part of a stack.
    pub namespace: String,
    /// Raw service name as reported by the engine, usually `{namespace}_{name}`.
    pub name: String,
    pub image: Image,
    pub mode: ServiceMode,
    pub labels: HashMap<String, String>,
    pub command: Vec<String>,
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub mounts: Vec<Mount>,
    pub ports: Vec<PortConfig>,
    /// Networks the service attaches to, in attachment order.
    pub networks: Vec<Network>,
    /// Empty when the service has no placement constraints, never absent.
    pub placement_constraints: Vec<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}
