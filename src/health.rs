//! Health check
//!
//! Backs the `/health` endpoint used by monitoring to confirm the service is
//! up and to read its version and uptime.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Health check response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always "healthy" if responding
    pub status: String,

    /// Seconds since Unix epoch
    pub timestamp: u64,

    pub version: String,

    pub uptime_seconds: u64,

    /// Service name and instance id
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct HealthChecker {
    start_time: SystemTime,
    version: String,
    service_name: String,
    instance_id: String,
}

impl HealthChecker {
    /// Create a checker; uptime counts from this call.
    pub fn new(service_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            start_time: SystemTime::now(),
            version: version.into(),
            service_name: service_name.into(),
            instance_id: crate::logging::generate_instance_id(),
        }
    }

    /// Unique id of this server instance, also logged at startup.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Current status with uptime in whole seconds.
    pub fn get_status(&self) -> HealthStatus {
        let now = SystemTime::now();
        let timestamp = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let uptime_seconds = now
            .duration_since(self.start_time)
            .unwrap_or_default()
            .as_secs();

        HealthStatus {
            status: "healthy".to_string(),
            timestamp,
            version: self.version.clone(),
            uptime_seconds,
            metadata: Some(serde_json::json!({
                "service_name": self.service_name,
                "instance_id": self.instance_id,
            })),
        }
    }

    /// The status as JSON, ready for an HTTP response.
    pub fn get_json_status(&self) -> serde_json::Value {
        serde_json::to_value(self.get_status()).unwrap_or_else(|_| {
            serde_json::json!({
                "status": "error",
                "message": "Failed to serialize health status"
            })
        })
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}
