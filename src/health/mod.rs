//! Advisory liveness probe of the backing service.
//!
//! The monitor never schedules itself; the host decides how often to call
//! [`HealthMonitor::probe`]. Probes go straight to the API, bypassing the
//! request coordinators, so they never block or cancel other calls.

use crate::client::ContractApi;
use crate::models::HealthStatus;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

pub struct HealthMonitor {
    api: Arc<dyn ContractApi>,
    last: Mutex<Option<HealthStatus>>,
}

impl HealthMonitor {
    pub fn new(api: Arc<dyn ContractApi>) -> Self {
        Self {
            api,
            last: Mutex::new(None),
        }
    }

    /// Probe `GET /actuator/health` once. 2xx is healthy; anything else is not.
    pub async fn probe(&self) -> HealthStatus {
        let status = match self.api.health().await {
            Ok(()) => {
                info!("API gateway is healthy");
                HealthStatus::Healthy
            }
            Err(e) => {
                warn!("API gateway health check failed: {}", e);
                HealthStatus::Unhealthy(e.to_string())
            }
        };

        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(status.clone());
        status
    }

    /// The outcome of the most recent probe, if any has run.
    pub fn last_status(&self) -> Option<HealthStatus> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
