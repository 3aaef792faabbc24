use crate::dto::HealthRes;
use chrono::Utc;

/// Simple health service used by the REST API
///
/// This service provides a standardised way to check that the filedock service is up.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy, stamped with the current time.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "filedock is alive".into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
