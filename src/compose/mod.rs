//! Translation of swarm service records into compose stack documents.
//!
//! Pure passes only: one swarm service maps to one compose service
//! ([`map_service`]), the mapped set partitions into stacks by stack name
//! ([`group_stacks`]), and each stack derives its network section from the
//! union of its members' attachments ([`stack_networks`]). Nothing in here
//! performs I/O or fails on malformed field content.

pub mod network;
pub mod service;
pub mod stack;

pub use network::{is_external_name, stack_networks, ComposeNetwork};
pub use service::{
    map_service, ComposeDeploy, ComposePlacement, ComposeService, ExposedPort,
};
pub use stack::{group_stacks, ComposeStack, ComposeVolume, StackError, COMPOSE_FILE_VERSION};
