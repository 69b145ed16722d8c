//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

/// Request for POST /api/nonces/provision
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    pub count: u32,
}

/// Response for POST /api/nonces/provision
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionResponse {
    pub nonce_addresses: Vec<String>,
}

/// Response for GET /api/nonces/status
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatusResponse {
    pub available: i64,
    pub total: i64,
}
