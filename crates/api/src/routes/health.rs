//! Liveness and readiness report, mounted at the root rather than under
//! `/api/v1`.

use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Upper bound for the database ping.
const PING_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `"ok"` or `"degraded"`.
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,
    pub engine: EngineSettings,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub reachable: bool,
    pub latency_ms: u64,
}

/// The retry and reputation settings write operations run under.
#[derive(Debug, Serialize)]
pub struct EngineSettings {
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub operation_timeout_ms: u64,
    pub reverse_on_withdraw: bool,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// GET /health -- 200 when the database answers, 503 otherwise.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let started = Instant::now();
    let reachable = matches!(
        tokio::time::timeout(PING_TIMEOUT, campusqa_db::health_check(&state.pool)).await,
        Ok(Ok(()))
    );
    let latency_ms = millis(started.elapsed());
    if !reachable {
        tracing::warn!(latency_ms, "Health check could not reach the database");
    }

    let engine = state.engine.config();
    let report = HealthReport {
        status: if reachable { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: DatabaseHealth {
            reachable,
            latency_ms,
        },
        engine: EngineSettings {
            max_attempts: engine.max_attempts,
            retry_backoff_ms: millis(engine.retry_backoff),
            operation_timeout_ms: millis(engine.operation_timeout),
            reverse_on_withdraw: engine.policy.reverse_on_withdraw,
        },
    };
    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
