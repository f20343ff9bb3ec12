//! # Health Probes
//!
//! `/health/liveness` answers as long as the process is serving requests.
//! `/health` checks the user directory (`database`) and the credential store
//! (`cache`) concurrently, each bounded by [`PROBE_TIMEOUT`], and reports
//! `200` only when both are healthy.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;
use vouch_token::HealthCheck;

use crate::state::AppState;

/// Upper bound on a single dependency check.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Result of one dependency check.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Composite report served at `/health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    /// `"healthy"` or `"degraded"`.
    pub status: String,
    pub checks: BTreeMap<String, ComponentHealth>,
}

impl HealthReport {
    fn from_checks(checks: BTreeMap<String, ComponentHealth>) -> Self {
        let status = if checks.values().all(|c| c.healthy) {
            "healthy"
        } else {
            "degraded"
        };
        Self {
            status: status.to_string(),
            checks,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

async fn check_dependency<H>(dependency: &H) -> (String, ComponentHealth)
where
    H: HealthCheck + ?Sized,
{
    let component = dependency.component().to_string();
    let outcome = match tokio::time::timeout(PROBE_TIMEOUT, dependency.check()).await {
        Ok(result) => result,
        Err(_) => Err(format!("timed out after {}s", PROBE_TIMEOUT.as_secs())),
    };

    let health = match outcome {
        Ok(()) => ComponentHealth {
            healthy: true,
            error: None,
        },
        Err(error) => {
            tracing::warn!(component = %component, error = %error, "health check failed");
            ComponentHealth {
                healthy: false,
                error: Some(error),
            }
        }
    };
    (component, health)
}

/// Probe every dependency concurrently.
pub async fn check_dependencies(state: &AppState) -> HealthReport {
    let (database, cache) = tokio::join!(
        check_dependency(state.users.as_ref()),
        check_dependency(state.store.as_ref())
    );
    HealthReport::from_checks([database, cache].into_iter().collect())
}

/// Build the unauthenticated health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/liveness", get(liveness))
}

/// GET /health: composite dependency report.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "All dependencies healthy", body = HealthReport),
        (status = 503, description = "At least one dependency unhealthy", body = HealthReport),
    ),
    tag = "health"
)]
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let report = check_dependencies(&state).await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

/// GET /health/liveness
#[utoipa::path(
    get,
    path = "/health/liveness",
    responses((status = 200, description = "Process is alive", body = String)),
    tag = "health"
)]
async fn liveness() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed {
        name: &'static str,
        result: Result<(), String>,
    }

    #[async_trait]
    impl HealthCheck for Fixed {
        fn component(&self) -> &'static str {
            self.name
        }

        async fn check(&self) -> Result<(), String> {
            self.result.clone()
        }
    }

    struct Hanging;

    #[async_trait]
    impl HealthCheck for Hanging {
        fn component(&self) -> &'static str {
            "cache"
        }

        async fn check(&self) -> Result<(), String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn healthy_dependency_reports_ok() {
        let (name, health) = check_dependency(&Fixed {
            name: "database",
            result: Ok(()),
        })
        .await;
        assert_eq!(name, "database");
        assert!(health.healthy);
        assert!(health.error.is_none());
    }

    #[tokio::test]
    async fn failing_dependency_carries_error() {
        let (_, health) = check_dependency(&Fixed {
            name: "database",
            result: Err("connection refused".into()),
        })
        .await;
        assert!(!health.healthy);
        assert_eq!(health.error.as_deref(), Some("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_dependency_times_out() {
        let (name, health) = check_dependency(&Hanging).await;
        assert_eq!(name, "cache");
        assert!(!health.healthy);
        assert_eq!(health.error.as_deref(), Some("timed out after 2s"));
    }

    #[test]
    fn one_failure_degrades_report() {
        let mut checks = BTreeMap::new();
        checks.insert(
            "database".to_string(),
            ComponentHealth {
                healthy: true,
                error: None,
            },
        );
        checks.insert(
            "cache".to_string(),
            ComponentHealth {
                healthy: false,
                error: Some("down".into()),
            },
        );
        let report = HealthReport::from_checks(checks);
        assert_eq!(report.status, "degraded");
        assert!(!report.is_healthy());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["checks"]["cache"]["error"], "down");
        assert!(json["checks"]["database"].get("error").is_none());
    }
}
