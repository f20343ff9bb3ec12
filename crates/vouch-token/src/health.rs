//! Health check shared by every external dependency.

use async_trait::async_trait;

/// A dependency that can report whether it is reachable.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Short name used as the key in the composite health report.
    fn component(&self) -> &'static str;

    /// Probe the dependency. The error string is reported to operators
    /// verbatim, so it must not carry secrets.
    async fn check(&self) -> Result<(), String>;
}
