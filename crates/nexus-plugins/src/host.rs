//! Bundle lifecycle and operation dispatch

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::bundle::{Bundle, ResourceInfo};
use crate::error::{HostError, HostResult};
use crate::operation::{Operation, OperationInfo, ToolOutput};

/// Text of a panic payload raised with a string message
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

struct LoadedBundle {
    name: String,
    bundle: Arc<dyn Bundle>,
    operations: Vec<Operation>,
    resources: Vec<ResourceInfo>,
}

struct RegistryEntry {
    bundle: usize,
    operation: Operation,
}

/// Owns loaded bundles and the operation registry
#[derive(Default)]
pub struct PluginHost {
    bundles: Vec<LoadedBundle>,
    registry: HashMap<String, RegistryEntry>,
}

impl std::fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHost")
            .field("bundles", &self.bundle_names())
            .field("operations_count", &self.registry.len())
            .finish()
    }
}

impl PluginHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of loaded bundles in load order
    pub fn bundle_names(&self) -> Vec<&str> {
        self.bundles.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.bundles.iter().any(|b| b.name == name)
    }

    /// Load a bundle under `name`.
    ///
    /// Operation names are checked against the registry and contracts are
    /// checked for compile errors before the load hook runs, so a rejected
    /// bundle leaves nothing behind.
    pub async fn load(&mut self, name: &str, bundle: Arc<dyn Bundle>) -> HostResult<()> {
        if self.is_loaded(name) {
            return Err(HostError::DuplicateBundle(name.to_string()));
        }

        let operations = bundle.operations();
        let mut seen: HashSet<&str> = HashSet::new();
        for operation in &operations {
            if let Some(message) = operation.contract_error() {
                return Err(HostError::Contract {
                    operation: operation.name().to_string(),
                    message: message.to_string(),
                });
            }
            let existing = match self.registry.get(operation.name()) {
                Some(entry) => Some(self.bundles[entry.bundle].name.clone()),
                None if seen.contains(operation.name()) => Some(name.to_string()),
                None => None,
            };
            if let Some(existing) = existing {
                return Err(HostError::OperationConflict {
                    operation: operation.name().to_string(),
                    bundle: name.to_string(),
                    existing,
                });
            }
            seen.insert(operation.name());
        }

        bundle
            .on_load()
            .await
            .map_err(|e| HostError::BundleLoad {
                bundle: name.to_string(),
                message: format!("{e:#}"),
            })?;

        let resources = bundle.resources();
        info!(
            "Loaded bundle '{}' ({} operations, {} resources)",
            name,
            operations.len(),
            resources.len()
        );

        self.bundles.push(LoadedBundle {
            name: name.to_string(),
            bundle,
            operations,
            resources,
        });
        self.rebuild_registry();
        Ok(())
    }

    /// Unload a bundle. A failing unload hook is logged and the bundle is
    /// removed anyway.
    pub async fn unload(&mut self, name: &str) -> HostResult<()> {
        let index = self
            .bundles
            .iter()
            .position(|b| b.name == name)
            .ok_or_else(|| HostError::UnknownBundle(name.to_string()))?;

        if let Err(e) = self.bundles[index].bundle.on_unload().await {
            warn!("Unload hook for bundle '{}' failed: {:#}", name, e);
        }

        self.bundles.remove(index);
        self.rebuild_registry();
        info!("Unloaded bundle '{}'", name);
        Ok(())
    }

    fn rebuild_registry(&mut self) {
        self.registry.clear();
        for (index, loaded) in self.bundles.iter().enumerate() {
            for operation in &loaded.operations {
                self.registry.insert(
                    operation.name().to_string(),
                    RegistryEntry {
                        bundle: index,
                        operation: operation.clone(),
                    },
                );
            }
        }
        debug!("Operation registry rebuilt: {} operations", self.registry.len());
    }

    /// Load `bundles` in order, then run every started hook
    pub async fn start(&mut self, bundles: Vec<(String, Arc<dyn Bundle>)>) -> HostResult<()> {
        for (name, bundle) in bundles {
            self.load(&name, bundle).await?;
        }

        for loaded in &self.bundles {
            if let Err(e) = loaded.bundle.on_started().await {
                warn!("Started hook for bundle '{}' failed: {:#}", loaded.name, e);
            }
        }
        Ok(())
    }

    /// Run every stopping hook, then unload, in reverse load order
    pub async fn stop(&mut self) {
        for loaded in self.bundles.iter().rev() {
            if let Err(e) = loaded.bundle.on_stopping().await {
                warn!("Stopping hook for bundle '{}' failed: {:#}", loaded.name, e);
            }
        }

        let names: Vec<String> = self.bundles.iter().rev().map(|b| b.name.clone()).collect();
        for name in names {
            if let Err(e) = self.unload(&name).await {
                warn!("Failed to unload bundle '{}': {}", name, e);
            }
        }
    }

    /// Every registered operation, in bundle load order
    pub fn list_operations(&self) -> Vec<OperationInfo> {
        self.bundles
            .iter()
            .flat_map(|b| b.operations.iter().map(Operation::info))
            .collect()
    }

    /// Validate arguments and run the named operation
    pub async fn call(&self, operation: &str, arguments: Value) -> HostResult<ToolOutput> {
        let entry = self
            .registry
            .get(operation)
            .ok_or_else(|| HostError::OperationNotFound(operation.to_string()))?;

        let future = entry
            .operation
            .invoke(arguments)
            .map_err(|violations| HostError::InvalidArguments {
                operation: operation.to_string(),
                violations,
            })?;

        debug!("Calling operation '{}'", operation);
        let outcome = match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(anyhow::anyhow!(
                "operation panicked: {}",
                panic_message(payload.as_ref())
            )),
        };

        match outcome {
            Ok(output) => Ok(output),
            Err(e) => {
                let mut message = format!("{e:#}");
                if let Some(hint) = self.bundles[entry.bundle].bundle.usage_hint(operation) {
                    message.push_str("\n\n");
                    message.push_str(&hint);
                }
                warn!("Operation '{}' failed: {}", operation, e);
                Err(HostError::OperationFailed {
                    operation: operation.to_string(),
                    message,
                })
            }
        }
    }

    /// Resources of every loaded bundle, in load order
    pub fn list_resources(&self) -> Vec<ResourceInfo> {
        self.bundles
            .iter()
            .flat_map(|b| b.resources.iter().cloned())
            .collect()
    }

    /// Read a resource from the bundle that declares it
    pub async fn read_resource(&self, uri: &str) -> HostResult<String> {
        let owner = self
            .bundles
            .iter()
            .find(|b| b.resources.iter().any(|r| r.uri == uri))
            .ok_or_else(|| HostError::ResourceNotFound(uri.to_string()))?;

        match owner.bundle.read_resource(uri).await {
            Ok(Some(text)) => Ok(text),
            Ok(None) => Err(HostError::ResourceNotFound(uri.to_string())),
            Err(e) => Err(HostError::ResourceFailed {
                uri: uri.to_string(),
                message: format!("{e:#}"),
            }),
        }
    }
}
