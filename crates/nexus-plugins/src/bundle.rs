//! The bundle trait

use async_trait::async_trait;
use serde::Serialize;

use crate::operation::Operation;

/// A readable resource offered by a bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    pub uri: String,
    pub name: String,
    pub mime_type: String,
}

impl ResourceInfo {
    pub fn new(uri: impl Into<String>, name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// An independently developed unit of operations and resources.
///
/// Hooks default to no-ops. Operations are read once when the bundle loads.
#[async_trait]
pub trait Bundle: Send + Sync {
    /// Operations this bundle handles
    fn operations(&self) -> Vec<Operation>;

    /// Resources this bundle can read
    fn resources(&self) -> Vec<ResourceInfo> {
        Vec::new()
    }

    /// Contents of one of [`Self::resources`], `None` if unknown
    async fn read_resource(&self, _uri: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    /// Extra help appended to a failed call's message
    fn usage_hint(&self, _operation: &str) -> Option<String> {
        None
    }

    /// Runs before the bundle is registered; an error aborts the load
    async fn on_load(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs before the bundle is removed
    async fn on_unload(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs once every configured bundle has loaded
    async fn on_started(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs when the host begins shutting down
    async fn on_stopping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
