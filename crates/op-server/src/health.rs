//! Health checks
//!
//! Reports on the persistence backend and the attachment storage directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use op_db::Database;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy | Self::Degraded)
    }

    /// The worse of two statuses
    fn and(self, other: HealthStatus) -> HealthStatus {
        match (self, other) {
            (Self::Unhealthy, _) | (_, Self::Unhealthy) => Self::Unhealthy,
            (Self::Degraded, _) | (_, Self::Degraded) => Self::Degraded,
            _ => Self::Healthy,
        }
    }
}

/// Individual component health
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// Overall health report
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: Vec<ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthReport {
    pub fn http_status(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub check_timeout: Duration,
    pub cache_duration: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_timeout: Duration::from_secs(5),
            cache_duration: Duration::from_secs(10),
        }
    }
}

struct CachedHealth {
    report: HealthReport,
    cached_at: Instant,
}

/// Health checker service
pub struct HealthChecker {
    config: HealthConfig,
    start_time: Instant,
    cache: RwLock<Option<CachedHealth>>,
    database: Option<Database>,
    attachments_path: Option<PathBuf>,
}

impl HealthChecker {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            cache: RwLock::new(None),
            database: None,
            attachments_path: None,
        }
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_attachments_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments_path = Some(path.into());
        self
    }

    /// Cached report, refreshed once `cache_duration` has passed
    pub async fn check(&self) -> HealthReport {
        if let Some(ref cached) = *self.cache.read().await {
            if cached.cached_at.elapsed() < self.config.cache_duration {
                debug!("Returning cached health report");
                return cached.report.clone();
            }
        }

        let report = self.perform_checks().await;

        *self.cache.write().await = Some(CachedHealth {
            report: report.clone(),
            cached_at: Instant::now(),
        });

        report
    }

    async fn perform_checks(&self) -> HealthReport {
        let components = vec![self.check_database().await, self.check_attachments().await];
        let status = components
            .iter()
            .fold(HealthStatus::Healthy, |status, component| status.and(component.status));

        HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            components,
            timestamp: chrono::Utc::now(),
        }
    }

    async fn check_database(&self) -> ComponentHealth {
        let start = Instant::now();

        let (status, message) = match self.database {
            // The in-memory store keeps the service usable without Postgres
            None => (HealthStatus::Degraded, "in-memory store".to_string()),
            Some(ref database) => match tokio::time::timeout(self.config.check_timeout, database.ping()).await {
                Ok(Ok(())) => (HealthStatus::Healthy, "connected".to_string()),
                Ok(Err(e)) => {
                    warn!(error = %e, "database health check failed");
                    (HealthStatus::Unhealthy, e.to_string())
                }
                Err(_) => (HealthStatus::Unhealthy, "timed out".to_string()),
            },
        };

        ComponentHealth {
            name: "database",
            status,
            message: Some(message),
            response_time_ms: elapsed_ms(start),
        }
    }

    async fn check_attachments(&self) -> ComponentHealth {
        let start = Instant::now();

        let (status, message) = match self.attachments_path {
            None => (HealthStatus::Healthy, "in-memory storage".to_string()),
            Some(ref path) => match tokio::fs::metadata(path).await {
                Ok(meta) if meta.is_dir() => (HealthStatus::Healthy, path.display().to_string()),
                Ok(_) => (HealthStatus::Unhealthy, format!("{} is not a directory", path.display())),
                Err(e) => (HealthStatus::Degraded, format!("{}: {}", path.display(), e)),
            },
        };

        ComponentHealth {
            name: "attachments",
            status,
            message: Some(message),
            response_time_ms: elapsed_ms(start),
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Liveness probe
pub async fn liveness() -> &'static str {
    "OK"
}

/// Readiness probe with the full report
pub async fn readiness(State(health): State<Arc<HealthChecker>>) -> (StatusCode, Json<HealthReport>) {
    let report = health.check().await;
    (report.http_status(), Json(report))
}
