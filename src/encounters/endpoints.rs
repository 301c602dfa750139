use rocket::response::status::{Custom, NoContent};
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use serde_json::Value;

use super::EncounterSummary;
use crate::responses::{run_blocking, saved_response, ApiError, SharedStore};
use crate::store::parse_body;

#[openapi]
#[get("/api/encounters")]
pub async fn list_encounters(
    store: &State<SharedStore>,
) -> Result<Json<Vec<EncounterSummary>>, ApiError> {
    let summaries = run_blocking(store, |s| s.encounters().list()).await?;
    Ok(Json(summaries))
}

#[openapi]
#[get("/api/encounters/<id>")]
pub async fn get_encounter(store: &State<SharedStore>, id: &str) -> Result<Json<Value>, ApiError> {
    let id = id.to_string();
    let document = run_blocking(store, move |s| s.encounters().get(&id)).await?;
    Ok(Json(document))
}

/// Save an encounter under an id derived from its name. Every referenced
/// monster must exist; otherwise nothing is written.
#[openapi]
#[post("/api/encounters", data = "<body>")]
pub async fn create_encounter(
    store: &State<SharedStore>,
    body: String,
) -> Result<Custom<Json<Value>>, ApiError> {
    let outcome = run_blocking(store, move |s| s.encounters().save(None, parse_body(&body)?)).await?;
    Ok(saved_response(outcome.created, outcome.document))
}

#[openapi]
#[put("/api/encounters/<id>", data = "<body>")]
pub async fn put_encounter(
    store: &State<SharedStore>,
    id: &str,
    body: String,
) -> Result<Custom<Json<Value>>, ApiError> {
    let id = id.to_string();
    let outcome =
        run_blocking(store, move |s| s.encounters().save(Some(&id), parse_body(&body)?)).await?;
    Ok(saved_response(outcome.created, outcome.document))
}

#[openapi]
#[delete("/api/encounters/<id>")]
pub async fn delete_encounter(store: &State<SharedStore>, id: &str) -> Result<NoContent, ApiError> {
    let id = id.to_string();
    run_blocking(store, move |s| s.encounters().delete(&id)).await?;
    Ok(NoContent)
}
