use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Liveness of the presence relay
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
