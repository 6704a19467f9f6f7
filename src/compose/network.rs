//! Per-stack network section derivation.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use super::service::ComposeService;

/// One entry of a stack's `networks` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeNetwork {
    /// Serves as the map key in the stack document, never inline.
    #[serde(skip)]
    pub name: String,

    pub driver: String,

    #[serde(skip_serializing_if = "is_false")]
    pub external: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Whether a network name looks like it belongs to something outside the
/// stack. Stack-created networks are named `{stack}_{network}`, so a name
/// without an underscore is assumed to be a pre-existing network the stack
/// merely attaches to. Naming heuristic only: the engine's ownership
/// metadata is not consulted, and callers must treat the answer as
/// best-effort.
pub fn is_external_name(name: &str) -> bool {
    !name.contains('_')
}

/// Union (by name) of every network referenced by the stack's member
/// services. The first definition of a name wins; a later one with
/// different driver metadata is reported and dropped.
pub fn stack_networks<'a, I>(services: I) -> BTreeMap<String, ComposeNetwork>
where
    I: IntoIterator<Item = &'a ComposeService>,
{
    let mut result: BTreeMap<String, ComposeNetwork> = BTreeMap::new();

    for service in services {
        for network in &service.attached_networks {
            let entry = ComposeNetwork {
                name: network.name.clone(),
                driver: network.driver.clone(),
                external: is_external_name(&network.name),
            };

            match result.get(&network.name) {
                None => {
                    result.insert(network.name.clone(), entry);
                }
                Some(existing) if existing.driver != entry.driver => {
                    warn!(
                        "network '{}' defined with driver '{}' and '{}', keeping '{}'",
                        network.name, existing.driver, entry.driver, existing.driver
                    );
                }
                Some(_) => {}
            }
        }
    }

    result
}
