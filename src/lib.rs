//! swarmex — export running Docker Swarm services as compose stack files.
//!
//! The exporter snapshots every service in a swarm cluster, maps each record
//! to a compose service, groups the mapped set into stacks by namespace and
//! writes one `{stack}.yml` per stack. The mapping and grouping passes are
//! pure and synchronous; I/O lives in the [`swarm`] client and the
//! [`export`] writer.

use std::path::Path;

use thiserror::Error;

pub mod cli;
pub mod compose;
pub mod export;
pub mod swarm;

use compose::{group_stacks, map_service, ComposeStack, StackError};
use export::ExportError;
use swarm::{SwarmClient, SwarmError};

/// Anything that can abort an export run. All variants are fatal; there is
/// no retry anywhere in the pipeline.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Swarm(#[from] SwarmError),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Snapshot the cluster through `client` and assemble the stack documents,
/// without writing anything.
pub async fn collect_stacks(client: &dyn SwarmClient) -> Result<Vec<ComposeStack>, RunError> {
    let services = client.list_services().await?;
    let mapped = services.iter().map(map_service).collect();
    Ok(group_stacks(mapped)?)
}

/// Full export pass: snapshot, group and write one `{stack}.yml` per stack
/// into `output_dir`. Returns the number of stacks exported.
pub async fn export_cluster(
    client: &dyn SwarmClient,
    output_dir: &Path,
) -> Result<usize, RunError> {
    let stacks = collect_stacks(client).await?;
    Ok(export::export_stacks(&stacks, output_dir)?)
}

/// Dry-run variant of [`export_cluster`]: render every stack document and
/// hand back `(stack name, yaml)` pairs instead of touching the filesystem.
pub async fn render_cluster(
    client: &dyn SwarmClient,
) -> Result<Vec<(String, String)>, RunError> {
    let stacks = collect_stacks(client).await?;
    stacks
        .iter()
        .map(|stack| Ok((stack.name.clone(), export::render_stack(stack)?)))
        .collect()
}
