//! # Nexus Tools
//!
//! Built-in bundles for the Nexus plugin host:
//!
//! - **vault** (default): document CRUD, metadata queries and the tag graph
//! - **journal**: insights, reflections and daily logs
//! - **goals**: goal creation, status changes and listings
//!
//! Every bundle works through one shared [`Vault`], so all of them see the
//! same tag index.

#![warn(clippy::all)]

pub mod documents;
pub mod goals;
pub mod journal;
pub mod utils;
pub mod vault;

use std::sync::Arc;

use nexus_plugins::Bundle;

pub use documents::VaultBundle;
pub use goals::GoalsBundle;
pub use journal::JournalBundle;
pub use vault::Vault;

/// Names accepted by [`builtin_bundle`], in their default load order
pub const BUILTIN_BUNDLES: &[&str] = &["vault", "journal", "goals"];

/// Construct a built-in bundle by name
pub fn builtin_bundle(name: &str, vault: &Vault) -> Option<Arc<dyn Bundle>> {
    let bundle: Arc<dyn Bundle> = match name {
        "vault" => Arc::new(VaultBundle::new(vault.clone())),
        "journal" => Arc::new(JournalBundle::new(vault.clone())),
        "goals" => Arc::new(GoalsBundle::new(vault.clone())),
        _ => return None,
    };
    Some(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_config::QueryConfig;
    use nexus_core::DocumentStore;

    #[tokio::test]
    async fn test_every_builtin_constructs() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path()).await.unwrap();
        let vault = Vault::new(store, QueryConfig::default());

        for name in BUILTIN_BUNDLES {
            let bundle = builtin_bundle(name, &vault).unwrap();
            assert!(!bundle.operations().is_empty(), "{name} has no operations");
        }
        assert!(builtin_bundle("calendar", &vault).is_none());
    }
}
