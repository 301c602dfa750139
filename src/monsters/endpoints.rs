use rocket::response::status::{Custom, NoContent};
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use serde_json::Value;

use super::MonsterSummary;
use crate::responses::{run_blocking, saved_response, ApiError, SharedStore};
use crate::store::ids::{derive_id, IdTarget};
use crate::store::parse_body;

/// Summaries of every monster, completed and uncompleted.
#[openapi]
#[get("/api/monsters")]
pub async fn list_monsters(
    store: &State<SharedStore>,
) -> Result<Json<Vec<MonsterSummary>>, ApiError> {
    let summaries = run_blocking(store, |s| s.monsters().list()).await?;
    Ok(Json(summaries))
}

#[openapi]
#[get("/api/monsters/<id>")]
pub async fn get_monster(store: &State<SharedStore>, id: &str) -> Result<Json<Value>, ApiError> {
    let id = id.to_string();
    let document = run_blocking(store, move |s| s.monsters().get(&id)).await?;
    Ok(Json(document))
}

/// Upsert a monster. The id comes from the body's `id` field or, failing
/// that, from `basics.name`.
#[openapi]
#[post("/api/monsters", data = "<body>")]
pub async fn create_monster(
    store: &State<SharedStore>,
    body: String,
) -> Result<Custom<Json<Value>>, ApiError> {
    let outcome = run_blocking(store, move |s| {
        let document = parse_body(&body)?;
        let id = match document.get("id").and_then(Value::as_str) {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => derive_id(IdTarget::Monster, &document, s.template_id_policy())?,
        };
        s.monsters().save(&id, document)
    })
    .await?;
    Ok(saved_response(outcome.created, outcome.document))
}

/// Upsert a monster under an explicit id.
#[openapi]
#[put("/api/monsters/<id>", data = "<body>")]
pub async fn put_monster(
    store: &State<SharedStore>,
    id: &str,
    body: String,
) -> Result<Custom<Json<Value>>, ApiError> {
    let id = id.to_string();
    let outcome = run_blocking(store, move |s| s.monsters().save(&id, parse_body(&body)?)).await?;
    Ok(saved_response(outcome.created, outcome.document))
}

#[openapi]
#[delete("/api/monsters/<id>")]
pub async fn delete_monster(store: &State<SharedStore>, id: &str) -> Result<NoContent, ApiError> {
    let id = id.to_string();
    run_blocking(store, move |s| s.monsters().delete(&id)).await?;
    Ok(NoContent)
}
