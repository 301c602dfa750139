use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::responses::{run_blocking, ApiError, ReferenceDocument, SharedStore};

pub const SPELLS_FILE: &str = "spells.json";

#[openapi]
#[get("/api/dnddata")]
pub async fn list_reference_files(
    store: &State<SharedStore>,
) -> Result<Json<Vec<String>>, ApiError> {
    let names = run_blocking(store, |s| s.reference_data().list()).await?;
    Ok(Json(names))
}

/// Reference data by filename. The `X-Data-Source` header is `cache` or
/// `file`; a 202 means another request is loading the file right now.
#[openapi]
#[get("/api/dnddata/<filename>")]
pub async fn get_reference_file(
    store: &State<SharedStore>,
    filename: &str,
) -> Result<ReferenceDocument, ApiError> {
    let filename = filename.to_string();
    let cached = run_blocking(store, move |s| s.reference_data().get(&filename)).await?;
    Ok(ReferenceDocument(cached))
}

#[openapi]
#[get("/api/spells")]
pub async fn get_spells(store: &State<SharedStore>) -> Result<ReferenceDocument, ApiError> {
    let cached = run_blocking(store, |s| s.reference_data().get(SPELLS_FILE)).await?;
    Ok(ReferenceDocument(cached))
}
