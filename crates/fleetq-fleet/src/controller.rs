//! Lifecycle controller contract and the Auto Scaling implementation.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_autoscaling::error::DisplayErrorContext;
use aws_sdk_autoscaling::Client;
use fleetq_models::{LifecycleActionResult, LifecycleHook, LifecycleState};
use tracing::{debug, info};

use crate::config::FleetConfig;
use crate::error::{FleetError, FleetResult};

/// External fleet controller that owns this instance's lifecycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LifecycleController: Send + Sync {
    /// Current lifecycle state of this instance, or `None` when the
    /// instance is not a member of the fleet.
    async fn describe_state(&self) -> FleetResult<Option<LifecycleState>>;

    /// Signal that the given lifecycle hook has been satisfied.
    async fn complete_action(
        &self,
        hook: LifecycleHook,
        result: LifecycleActionResult,
    ) -> FleetResult<()>;
}

/// Lifecycle controller backed by an EC2 Auto Scaling group.
#[derive(Clone, Debug)]
pub struct AutoScalingController {
    client: Client,
    group_name: String,
    instance_id: String,
    startup_hook: String,
    termination_hook: String,
}

impl AutoScalingController {
    pub fn new(aws_config: &SdkConfig, config: &FleetConfig, instance_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(aws_config),
            group_name: config.group_name.clone(),
            instance_id: instance_id.into(),
            startup_hook: config.startup_hook.clone(),
            termination_hook: config.termination_hook.clone(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn hook_name(&self, hook: LifecycleHook) -> &str {
        match hook {
            LifecycleHook::Startup => &self.startup_hook,
            LifecycleHook::Termination => &self.termination_hook,
        }
    }
}

#[async_trait]
impl LifecycleController for AutoScalingController {
    async fn describe_state(&self) -> FleetResult<Option<LifecycleState>> {
        let response = self
            .client
            .describe_auto_scaling_instances()
            .instance_ids(&self.instance_id)
            .send()
            .await
            .map_err(|e| FleetError::describe_failed(DisplayErrorContext(&e).to_string()))?;

        let state = response
            .auto_scaling_instances()
            .first()
            .map(|details| LifecycleState::parse(details.lifecycle_state().unwrap_or_default()));

        debug!(instance_id = %self.instance_id, state = ?state, "Described lifecycle state");
        Ok(state)
    }

    async fn complete_action(
        &self,
        hook: LifecycleHook,
        result: LifecycleActionResult,
    ) -> FleetResult<()> {
        let hook_name = self.hook_name(hook);

        self.client
            .complete_lifecycle_action()
            .lifecycle_hook_name(hook_name)
            .auto_scaling_group_name(&self.group_name)
            .lifecycle_action_result(result.as_str())
            .instance_id(&self.instance_id)
            .send()
            .await
            .map_err(|e| FleetError::complete_action_failed(DisplayErrorContext(&e).to_string()))?;

        info!(
            instance_id = %self.instance_id,
            group = %self.group_name,
            hook = %hook_name,
            result = result.as_str(),
            "Completed lifecycle action"
        );
        Ok(())
    }
}
