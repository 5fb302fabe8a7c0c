//! Instance identity discovery.

use aws_config::imds;
use tracing::info;

use crate::config::FleetConfig;
use crate::error::{FleetError, FleetResult};

const INSTANCE_ID_PATH: &str = "/latest/meta-data/instance-id";

/// Resolve this instance's id: the configured override, else instance metadata.
pub async fn resolve_instance_id(config: &FleetConfig) -> FleetResult<String> {
    if let Some(id) = &config.instance_id {
        info!(instance_id = %id, "Using configured instance id");
        return Ok(id.clone());
    }

    let client = imds::Client::builder().build();
    let token = client
        .get(INSTANCE_ID_PATH)
        .await
        .map_err(|e| FleetError::instance_identity(e.to_string()))?;

    let id: &str = token.as_ref();
    if id.is_empty() {
        return Err(FleetError::instance_identity("instance metadata returned an empty id"));
    }

    info!(instance_id = %id, "Discovered instance id from metadata");
    Ok(id.to_string())
}
