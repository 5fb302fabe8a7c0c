//! Fleet membership and lifecycle handshakes.
//!
//! Membership is decided once, at startup. A standalone monitor never
//! drains on its own and never performs a handshake.

use std::sync::Arc;

use fleetq_models::{LifecycleActionResult, LifecycleHook, LifecycleState};
use tracing::{debug, info, warn};

use crate::controller::LifecycleController;
use crate::error::FleetResult;

/// Read-only view of this instance's fleet lifecycle.
#[derive(Clone, Default)]
pub struct FleetMonitor {
    controller: Option<Arc<dyn LifecycleController>>,
}

impl FleetMonitor {
    /// A monitor for an instance outside any fleet.
    pub fn standalone() -> Self {
        Self { controller: None }
    }

    /// Ask the controller whether this instance is a fleet member.
    ///
    /// A failed lookup is an error; the caller decides whether to abort.
    pub async fn detect(controller: Arc<dyn LifecycleController>) -> FleetResult<Self> {
        match controller.describe_state().await? {
            Some(state) => {
                info!(state = %state, "Instance is a fleet member");
                Ok(Self {
                    controller: Some(controller),
                })
            }
            None => {
                info!("Instance is not a fleet member, running standalone");
                Ok(Self::standalone())
            }
        }
    }

    pub fn is_managed(&self) -> bool {
        self.controller.is_some()
    }

    /// True when the controller has asked this instance to terminate.
    ///
    /// Lookup failures are logged and answered with `false`; the next poll
    /// asks again.
    pub async fn should_drain(&self) -> bool {
        let Some(controller) = &self.controller else {
            return false;
        };

        match controller.describe_state().await {
            Ok(Some(LifecycleState::TerminatingWait)) => true,
            Ok(_) => false,
            Err(e) => {
                warn!(error = %e, "Lifecycle state lookup failed, continuing");
                false
            }
        }
    }

    /// Complete the startup hook if the instance is waiting on it.
    /// Returns whether the action was sent.
    pub async fn complete_startup(&self) -> FleetResult<bool> {
        self.complete_from(LifecycleState::PendingWait, LifecycleHook::Startup)
            .await
    }

    /// Complete the termination hook if the instance is waiting on it.
    /// Returns whether the action was sent.
    pub async fn complete_termination(&self) -> FleetResult<bool> {
        self.complete_from(LifecycleState::TerminatingWait, LifecycleHook::Termination)
            .await
    }

    async fn complete_from(&self, expected: LifecycleState, hook: LifecycleHook) -> FleetResult<bool> {
        let Some(controller) = &self.controller else {
            return Ok(false);
        };

        let state = controller.describe_state().await?;
        if state.as_ref() != Some(&expected) {
            debug!(hook = ?hook, state = ?state, "Hook not pending, skipping");
            return Ok(false);
        }

        controller
            .complete_action(hook, LifecycleActionResult::Continue)
            .await?;
        info!(hook = ?hook, from = %expected, "Lifecycle hook completed");
        Ok(true)
    }
}

impl std::fmt::Debug for FleetMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetMonitor")
            .field("managed", &self.is_managed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::MockLifecycleController;
    use crate::error::FleetError;
    use mockall::predicate::eq;

    fn state_once(mock: &mut MockLifecycleController, state: Option<LifecycleState>) {
        mock.expect_describe_state()
            .times(1)
            .return_once(move || Ok(state));
    }

    #[tokio::test]
    async fn test_detect_non_member_is_standalone() {
        let mut mock = MockLifecycleController::new();
        state_once(&mut mock, None);

        let monitor = FleetMonitor::detect(Arc::new(mock)).await.unwrap();
        assert!(!monitor.is_managed());
        assert!(!monitor.should_drain().await);
        assert!(!monitor.complete_startup().await.unwrap());
        assert!(!monitor.complete_termination().await.unwrap());
    }

    #[tokio::test]
    async fn test_detect_propagates_lookup_failure() {
        let mut mock = MockLifecycleController::new();
        mock.expect_describe_state()
            .return_once(|| Err(FleetError::describe_failed("throttled")));

        assert!(FleetMonitor::detect(Arc::new(mock)).await.is_err());
    }

    #[tokio::test]
    async fn test_should_drain_only_when_terminating() {
        let mut mock = MockLifecycleController::new();
        let mut seq = mockall::Sequence::new();
        for state in [
            Some(LifecycleState::InService),
            Some(LifecycleState::InService),
            Some(LifecycleState::PendingWait),
            Some(LifecycleState::TerminatingWait),
        ] {
            mock.expect_describe_state()
                .times(1)
                .in_sequence(&mut seq)
                .return_once(move || Ok(state));
        }

        let monitor = FleetMonitor::detect(Arc::new(mock)).await.unwrap();
        assert!(!monitor.should_drain().await);
        assert!(!monitor.should_drain().await);
        assert!(monitor.should_drain().await);
    }

    #[tokio::test]
    async fn test_should_drain_swallows_lookup_errors() {
        let mut mock = MockLifecycleController::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_describe_state()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|| Ok(Some(LifecycleState::InService)));
        mock.expect_describe_state()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|| Err(FleetError::describe_failed("timeout")));

        let monitor = FleetMonitor::detect(Arc::new(mock)).await.unwrap();
        assert!(!monitor.should_drain().await);
    }

    #[tokio::test]
    async fn test_startup_completed_from_pending_wait() {
        let mut mock = MockLifecycleController::new();
        mock.expect_describe_state()
            .times(2)
            .returning(|| Ok(Some(LifecycleState::PendingWait)));
        mock.expect_complete_action()
            .with(eq(LifecycleHook::Startup), eq(LifecycleActionResult::Continue))
            .times(1)
            .returning(|_, _| Ok(()));

        let monitor = FleetMonitor::detect(Arc::new(mock)).await.unwrap();
        assert!(monitor.complete_startup().await.unwrap());
    }

    #[tokio::test]
    async fn test_startup_skipped_when_in_service() {
        let mut mock = MockLifecycleController::new();
        mock.expect_describe_state()
            .times(2)
            .returning(|| Ok(Some(LifecycleState::InService)));
        mock.expect_complete_action().never();

        let monitor = FleetMonitor::detect(Arc::new(mock)).await.unwrap();
        assert!(!monitor.complete_startup().await.unwrap());
    }

    #[tokio::test]
    async fn test_termination_completed_from_terminating_wait() {
        let mut mock = MockLifecycleController::new();
        mock.expect_describe_state()
            .times(2)
            .returning(|| Ok(Some(LifecycleState::TerminatingWait)));
        mock.expect_complete_action()
            .with(eq(LifecycleHook::Termination), eq(LifecycleActionResult::Continue))
            .times(1)
            .returning(|_, _| Ok(()));

        let monitor = FleetMonitor::detect(Arc::new(mock)).await.unwrap();
        assert!(monitor.complete_termination().await.unwrap());
    }

    #[tokio::test]
    async fn test_termination_skipped_when_in_service() {
        let mut mock = MockLifecycleController::new();
        mock.expect_describe_state()
            .times(2)
            .returning(|| Ok(Some(LifecycleState::InService)));
        mock.expect_complete_action().never();

        let monitor = FleetMonitor::detect(Arc::new(mock)).await.unwrap();
        assert!(!monitor.complete_termination().await.unwrap());
    }

    #[tokio::test]
    async fn test_complete_action_failure_propagates() {
        let mut mock = MockLifecycleController::new();
        mock.expect_describe_state()
            .returning(|| Ok(Some(LifecycleState::PendingWait)));
        mock.expect_complete_action()
            .returning(|_, _| Err(FleetError::complete_action_failed("denied")));

        let monitor = FleetMonitor::detect(Arc::new(mock)).await.unwrap();
        assert!(monitor.complete_startup().await.is_err());
    }
}
