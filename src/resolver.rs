// Entity name resolution
// Maps logical pipeline / component identities to the names the stream
// runtime reports metrics under
//
// Numan Thabit 2025 Nov

use crate::errors::MetricsError;
use crate::topology::Component;
use async_trait::async_trait;

#[async_trait]
pub trait EntityNameResolver: Send + Sync {
    /// Name under which the runtime knows the deployed pipeline.
    async fn resolve_backend_name(
        &self,
        pipeline_id: u64,
        pipeline_name: &str,
    ) -> Result<String, MetricsError>;
}

/// Runtime-side name of a component: `"{id}-{name}"`.
pub fn component_backend_name(component: &Component) -> String {
    format!("{}-{}", component.id, component.name)
}
