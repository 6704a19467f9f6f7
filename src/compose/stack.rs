//! Grouping of mapped services into per-stack compose documents.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use super::network::{stack_networks, ComposeNetwork};
use super::service::ComposeService;

/// Compose file schema version written into every exported stack.
pub const COMPOSE_FILE_VERSION: &str = "3.2";

/// Errors raised while assembling stacks. Grouping fails before anything is
/// written, so a bad snapshot never produces a half-wrong file.
#[derive(Error, Debug, PartialEq)]
pub enum StackError {
    #[error("stack '{stack}' defines service '{service}' more than once")]
    DuplicateService { stack: String, service: String },
}

/// A named volume entry. No swarm field maps into this today; the section
/// exists so the document shape matches the compose schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeVolume {
    pub name: String,
}

/// One stack document. Services are flattened to the document root (the
/// format this exporter emits keys each service directly under `version`),
/// `volumes` and `networks` are dropped entirely when empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeStack {
    pub version: String,

    #[serde(skip)]
    pub name: String,

    #[serde(flatten)]
    pub services: BTreeMap<String, ComposeService>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<ComposeVolume>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub networks: BTreeMap<String, ComposeNetwork>,
}

impl ComposeStack {
    /// File name this stack is exported under.
    pub fn file_name(&self) -> String {
        format!("{}.yml", self.name)
    }
}

/// Partition mapped services into one stack per distinct stack name.
///
/// Stacks come back sorted by name and keep their services in ordered maps,
/// so the same snapshot always serializes to the same bytes. Two services
/// resolving to the same (stack, name) pair is an error rather than a
/// silent overwrite.
pub fn group_stacks(services: Vec<ComposeService>) -> Result<Vec<ComposeStack>, StackError> {
    let mut grouped: BTreeMap<String, BTreeMap<String, ComposeService>> = BTreeMap::new();

    for service in services {
        let members = grouped.entry(service.stack_name.clone()).or_default();
        let name = service.name.clone();
        if let Some(previous) = members.insert(name, service) {
            return Err(StackError::DuplicateService {
                stack: previous.stack_name,
                service: previous.name,
            });
        }
    }

    Ok(grouped
        .into_iter()
        .map(|(name, members)| {
            let networks = stack_networks(members.values());
            ComposeStack {
                version: COMPOSE_FILE_VERSION.to_string(),
                name,
                services: members,
                volumes: Vec::new(),
                networks,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::map_service;
    use crate::swarm::{Network, Service};

    fn swarm_service(name: &str, namespace: &str) -> Service {
        Service {
            name: name.to_string(),
            namespace: namespace.to_string(),
            ..Default::default()
        }
    }

    fn mapped(name: &str, namespace: &str) -> ComposeService {
        map_service(&swarm_service(name, namespace))
    }

    #[test]
    fn test_grouping_is_a_partition() {
        let services = vec![
            mapped("web_app", "web"),
            mapped("web_db", "web"),
            mapped("batch_worker", "batch"),
            mapped("standalone", ""),
        ];

        let stacks = group_stacks(services).unwrap();
        assert_eq!(stacks.len(), 3);

        let total: usize = stacks.iter().map(|s| s.services.len()).sum();
        assert_eq!(total, 4);

        let names: Vec<&str> = stacks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["batch", "standalone", "web"]);
    }

    #[test]
    fn test_single_member_namespace_is_a_valid_stack() {
        let stacks = group_stacks(vec![mapped("batch_worker", "batch")]).unwrap();
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].name, "batch");
        assert!(stacks[0].services.contains_key("worker"));
    }

    #[test]
    fn test_unstacked_service_becomes_singleton_stack() {
        let stacks = group_stacks(vec![mapped("standalone", "")]).unwrap();
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].name, "standalone");
        assert!(stacks[0].services.contains_key("standalone"));
    }

    #[test]
    fn test_duplicate_service_name_is_an_error() {
        let mut first = mapped("web_app", "web");
        let mut second = mapped("web_app", "web");
        first.image = "nginx:1".to_string();
        second.image = "nginx:2".to_string();

        let result = group_stacks(vec![first, second]);
        assert_eq!(
            result,
            Err(StackError::DuplicateService {
                stack: "web".to_string(),
                service: "app".to_string(),
            })
        );
    }

    #[test]
    fn test_version_constant_stamped_on_every_stack() {
        let stacks = group_stacks(vec![mapped("web_app", "web"), mapped("standalone", "")]).unwrap();
        assert!(stacks.iter().all(|s| s.version == "3.2"));
    }

    #[test]
    fn test_networks_unioned_per_stack() {
        let mut a = swarm_service("web_app", "web");
        a.networks = vec![
            Network {
                name: "web_default".to_string(),
                id: "n1".to_string(),
                driver: "overlay".to_string(),
            },
            Network {
                name: "proxy".to_string(),
                id: "n2".to_string(),
                driver: "overlay".to_string(),
            },
        ];
        let mut b = swarm_service("web_db", "web");
        b.networks = vec![Network {
            name: "web_default".to_string(),
            id: "n1".to_string(),
            driver: "overlay".to_string(),
        }];

        let stacks = group_stacks(vec![map_service(&a), map_service(&b)]).unwrap();
        assert_eq!(stacks.len(), 1);

        let networks = &stacks[0].networks;
        assert_eq!(networks.len(), 2);
        assert!(!networks["web_default"].external);
        assert!(networks["proxy"].external);
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let services = || {
            vec![
                mapped("web_app", "web"),
                mapped("web_db", "web"),
                mapped("standalone", ""),
            ]
        };

        let first = group_stacks(services()).unwrap();
        let second = group_stacks(services()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_yaml_flattens_services_to_document_root() {
        let stacks = group_stacks(vec![mapped("web_app", "web"), mapped("web_db", "web")]).unwrap();
        let yaml = serde_yaml::to_string(&stacks[0]).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(doc["version"], "3.2");
        // services sit directly at the root, not under a "services" key
        assert!(doc.get("services").is_none());
        assert!(doc.get("app").is_some());
        assert!(doc.get("db").is_some());
        // empty sections are dropped entirely
        assert!(doc.get("volumes").is_none());
        assert!(doc.get("networks").is_none());
    }

    #[test]
    fn test_yaml_networks_section_present_when_nonempty() {
        let mut a = swarm_service("web_app", "web");
        a.networks = vec![Network {
            name: "proxy".to_string(),
            id: "n1".to_string(),
            driver: "overlay".to_string(),
        }];

        let stacks = group_stacks(vec![map_service(&a)]).unwrap();
        let yaml = serde_yaml::to_string(&stacks[0]).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(doc["networks"]["proxy"]["external"], true);
        assert_eq!(doc["networks"]["proxy"]["driver"], "overlay");
    }
}
