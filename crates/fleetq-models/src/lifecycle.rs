//! Fleet lifecycle states and hooks.

use std::fmt;

/// Lifecycle state of this instance as reported by the fleet controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Launched, waiting for the startup hook to be completed
    PendingWait,
    /// Serving traffic
    InService,
    /// Scale-in started, waiting for the termination hook to be completed
    TerminatingWait,
    /// Gone
    Terminated,
    /// Any other controller state (`Standby`, `Detaching`, ...)
    Other(String),
}

impl LifecycleState {
    /// Parse the controller's state string.
    pub fn parse(state: &str) -> Self {
        match state {
            "Pending:Wait" => Self::PendingWait,
            "InService" => Self::InService,
            "Terminating:Wait" => Self::TerminatingWait,
            "Terminated" => Self::Terminated,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PendingWait => "Pending:Wait",
            Self::InService => "InService",
            Self::TerminatingWait => "Terminating:Wait",
            Self::Terminated => "Terminated",
            Self::Other(state) => state,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the instance lifetime a lifecycle action completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    Startup,
    Termination,
}

impl LifecycleHook {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Termination => "termination",
        }
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result sent when completing a lifecycle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleActionResult {
    Continue,
}

impl LifecycleActionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "CONTINUE",
        }
    }
}
