use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::{openapi, JsonSchema};

use crate::error::StoreError;

/// JSON body of every non-document response.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Status {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

pub fn error_status(error: &StoreError) -> Json<Status> {
    Json(Status {
        message: error.to_string(),
        kind: Some(error.kind().to_string()),
        id: error.resource_id().map(str::to_string),
    })
}

/// Liveness report returned by `GET /api/status`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ServiceStatus {
    pub status: String,
    pub message: String,
}

#[openapi]
#[get("/api/status")]
pub async fn get_status() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: "OK".to_string(),
        message: "content store is ready".to_string(),
    })
}
