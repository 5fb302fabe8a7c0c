//! Fleet lifecycle coordination.
//!
//! This crate provides:
//! - The `LifecycleController` contract (describe state, complete action)
//! - An Auto Scaling implementation
//! - Instance identity discovery
//! - `FleetMonitor`, the read-only drain predicate and the two handshakes

pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod monitor;

pub use config::FleetConfig;
pub use controller::{AutoScalingController, LifecycleController};
pub use error::{FleetError, FleetResult};
pub use identity::resolve_instance_id;
pub use monitor::FleetMonitor;
