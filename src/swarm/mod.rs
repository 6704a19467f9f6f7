//! Swarm cluster collaborator: the snapshot model and the engine API client.

pub mod client;
pub mod model;

pub use client::{DockerClient, SwarmClient, SwarmError, DOCKER_API_MIN_VERSION};
pub use model::{
    Image, Mount, Network, PortConfig, Service, ServiceMode, STACK_NAMESPACE_LABEL,
};
