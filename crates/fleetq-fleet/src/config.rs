//! Fleet configuration.

use crate::error::{FleetError, FleetResult};

/// Fleet configuration.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Auto Scaling group this instance belongs to
    pub group_name: String,
    /// Lifecycle hook completed once the pool is running
    pub startup_hook: String,
    /// Lifecycle hook completed once every worker has drained
    pub termination_hook: String,
    /// Instance id override; discovered from instance metadata when unset
    pub instance_id: Option<String>,
}

impl FleetConfig {
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            startup_hook: "start_hook".to_string(),
            termination_hook: "terminate_hook".to_string(),
            instance_id: None,
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> FleetResult<Self> {
        let group_name = std::env::var("ASG_NAME")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| FleetError::config_error("ASG_NAME not set"))?;

        Ok(Self {
            group_name,
            startup_hook: std::env::var("ASG_STARTUP_HOOK")
                .unwrap_or_else(|_| "start_hook".to_string()),
            termination_hook: std::env::var("ASG_TERMINATION_HOOK")
                .unwrap_or_else(|_| "terminate_hook".to_string()),
            instance_id: std::env::var("INSTANCE_ID").ok().filter(|s| !s.is_empty()),
        })
    }
}
