//! Glue between the synchronous store and Rocket handlers.

use std::sync::Arc;

use okapi::openapi3::Responses;
use rocket::http::{ContentType, Header};
use rocket::response::status::Custom;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::util::add_schema_response;
use serde_json::Value;

use crate::error::StoreError;
use crate::status_messages::{error_status, Status};
use crate::store::cache::CachedDocument;
use crate::store::ContentStore;

pub type SharedStore = Arc<ContentStore>;

pub const DATA_SOURCE_HEADER: &str = "X-Data-Source";

/// Run a store operation on the blocking worker pool.
pub async fn run_blocking<T, F>(store: &SharedStore, operation: F) -> Result<T, StoreError>
where
    F: FnOnce(&ContentStore) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    rocket::tokio::task::spawn_blocking(move || operation(&store))
        .await
        .map_err(|e| StoreError::Worker(e.to_string()))?
}

/// 201 for a newly created document, 200 for an update.
pub fn saved_response(created: bool, document: Value) -> Custom<Json<Value>> {
    let status = if created {
        rocket::http::Status::Created
    } else {
        rocket::http::Status::Ok
    };
    Custom(status, Json(document))
}

/// A [`StoreError`] rendered as a JSON [`Status`] with the mapped HTTP status.
#[derive(Debug)]
pub struct ApiError(pub StoreError);

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        ApiError(error)
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.0.status();
        if status.code >= 500 {
            log::error!("{} {} failed: {}", request.method(), request.uri(), self.0);
        } else {
            log::debug!("{} {} -> {}: {}", request.method(), request.uri(), status, self.0);
        }
        (status, error_status(&self.0)).respond_to(request)
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();
        for code in [202, 400, 404, 409, 500] {
            add_schema_response(&mut responses, code, "application/json", gen.json_schema::<Status>())?;
        }
        Ok(responses)
    }
}

/// A reference-data document plus the header telling where it came from.
pub struct ReferenceDocument(pub CachedDocument);

impl<'r> Responder<'r, 'static> for ReferenceDocument {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let body = serde_json::to_string(self.0.document.as_ref()).map_err(|e| {
            log::error!("cannot serialize cached reference data: {}", e);
            rocket::http::Status::InternalServerError
        })?;
        let mut response = (ContentType::JSON, body).respond_to(request)?;
        response.set_header(Header::new(DATA_SOURCE_HEADER, self.0.origin.as_str()));
        Ok(response)
    }
}

impl OpenApiResponderInner for ReferenceDocument {
    fn responses(gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        <Json<Value>>::responses(gen)
    }
}
