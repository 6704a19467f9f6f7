//! Field-by-field mapping from one swarm service to one compose service.
//!
//! Every derivation here is a total function: malformed input (an empty
//! image tag, a name that does not carry its namespace prefix) passes
//! through into the manifest instead of being rejected, so the export stays
//! best-effort over whatever the cluster reports.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::swarm::{Mount, Network, PortConfig, Service, ServiceMode, STACK_NAMESPACE_LABEL};

/// One service entry of a compose stack file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeService {
    /// Service name with the stack prefix stripped. Used as the map key at
    /// the document root, never serialized inline.
    #[serde(skip)]
    pub name: String,

    /// Stack this service belongs to; the raw service name for services
    /// deployed outside any stack.
    #[serde(skip)]
    pub stack_name: String,

    /// Network records carried through for the per-stack network section.
    #[serde(skip)]
    pub attached_networks: Vec<Network>,

    pub image: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    #[serde(rename = "Environment", skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Mount>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ExposedPort>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,

    pub deploy: ComposeDeploy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExposedPort {
    pub target: u32,
    pub published: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeDeploy {
    pub mode: String,

    /// Present only for replicated services that reported a count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u64>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "ComposePlacement::is_empty")]
    pub placement: ComposePlacement,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ComposePlacement {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
}

impl ComposePlacement {
    fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// Derive the compose service for one swarm service.
pub fn map_service(service: &Service) -> ComposeService {
    ComposeService {
        name: service_name(service),
        stack_name: stack_name(service),
        attached_networks: service.networks.clone(),
        image: qualified_image(service),
        command: command_with_args(service),
        environment: service.env.clone(),
        volumes: service.mounts.clone(),
        ports: exposed_ports(&service.ports),
        networks: network_names(&service.networks),
        deploy: ComposeDeploy {
            mode: deploy_mode(&service.mode).to_string(),
            replicas: replica_count(&service.mode),
            labels: filtered_labels(&service.labels),
            placement: ComposePlacement {
                constraints: service.placement_constraints.clone(),
            },
        },
    }
}

/// `{name}:{tag}`, digest dropped. An empty tag yields a dangling colon;
/// that reference quality is the cluster's, not ours.
fn qualified_image(service: &Service) -> String {
    format!("{}:{}", service.image.name, service.image.tag)
}

/// Command then args, flattened into one sequence. The compose format does
/// not keep the distinction.
fn command_with_args(service: &Service) -> Vec<String> {
    let mut result = service.command.clone();
    result.extend(service.args.iter().cloned());
    result
}

/// Raw name with the `{namespace}_` prefix stripped. A name that does not
/// carry the prefix comes back unchanged.
fn service_name(service: &Service) -> String {
    if service.namespace.is_empty() {
        return service.name.clone();
    }
    let prefix = format!("{}_", service.namespace);
    service
        .name
        .strip_prefix(&prefix)
        .unwrap_or(&service.name)
        .to_string()
}

/// The namespace, or the raw name for services outside any stack (each such
/// service becomes its own single-service stack).
fn stack_name(service: &Service) -> String {
    if service.namespace.is_empty() {
        service.name.clone()
    } else {
        service.namespace.clone()
    }
}

fn deploy_mode(mode: &ServiceMode) -> &'static str {
    match mode {
        ServiceMode::Global => "global",
        ServiceMode::Replicated { .. } => "replicated",
    }
}

fn replica_count(mode: &ServiceMode) -> Option<u64> {
    match mode {
        ServiceMode::Global => None,
        ServiceMode::Replicated { replicas } => *replicas,
    }
}

/// Copy of the labels minus the engine's stack-membership bookkeeping key.
fn filtered_labels(labels: &HashMap<String, String>) -> BTreeMap<String, String> {
    labels
        .iter()
        .filter(|(key, _)| key.as_str() != STACK_NAMESPACE_LABEL)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn exposed_ports(ports: &[PortConfig]) -> Vec<ExposedPort> {
    ports
        .iter()
        .map(|port| ExposedPort {
            target: port.target_port,
            published: port.published_port,
            protocol: port.protocol.clone(),
        })
        .collect()
}

fn network_names(networks: &[Network]) -> Vec<String> {
    networks.iter().map(|network| network.name.clone()).collect()
}
