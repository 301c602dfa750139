use rocket::response::status::{Created, NoContent};
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use serde_json::Value;

use super::TemplateSummary;
use crate::responses::{run_blocking, ApiError, SharedStore};
use crate::store::{parse_body, TemplateType};

/// Template types are one of `trait`, `attackRoll`, `savingThrow`, `other`.
#[openapi]
#[get("/api/templates/<template_type>")]
pub async fn list_templates(
    store: &State<SharedStore>,
    template_type: &str,
) -> Result<Json<Vec<TemplateSummary>>, ApiError> {
    let template_type: TemplateType = template_type.parse()?;
    let summaries = run_blocking(store, move |s| s.templates(template_type).list()).await?;
    Ok(Json(summaries))
}

#[openapi]
#[get("/api/templates/<template_type>/<id>")]
pub async fn get_template(
    store: &State<SharedStore>,
    template_type: &str,
    id: &str,
) -> Result<Json<Value>, ApiError> {
    let template_type: TemplateType = template_type.parse()?;
    let id = id.to_string();
    let document = run_blocking(store, move |s| s.templates(template_type).get(&id)).await?;
    Ok(Json(document))
}

/// Create a template. Its id is derived from the content; an existing id is
/// answered with 409 Conflict.
#[openapi]
#[post("/api/templates/<template_type>", data = "<body>")]
pub async fn create_template(
    store: &State<SharedStore>,
    template_type: &str,
    body: String,
) -> Result<Created<Json<Value>>, ApiError> {
    let template_type: TemplateType = template_type.parse()?;
    let document =
        run_blocking(store, move |s| s.templates(template_type).create(parse_body(&body)?)).await?;
    let location = format!(
        "/api/templates/{}/{}",
        template_type,
        document.get("id").and_then(Value::as_str).unwrap_or_default()
    );
    Ok(Created::new(location).body(Json(document)))
}

#[openapi]
#[put("/api/templates/<template_type>/<id>", data = "<body>")]
pub async fn update_template(
    store: &State<SharedStore>,
    template_type: &str,
    id: &str,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let template_type: TemplateType = template_type.parse()?;
    let id = id.to_string();
    let document = run_blocking(store, move |s| {
        s.templates(template_type).update(&id, parse_body(&body)?)
    })
    .await?;
    Ok(Json(document))
}

#[openapi]
#[delete("/api/templates/<template_type>/<id>")]
pub async fn delete_template(
    store: &State<SharedStore>,
    template_type: &str,
    id: &str,
) -> Result<NoContent, ApiError> {
    let template_type: TemplateType = template_type.parse()?;
    let id = id.to_string();
    run_blocking(store, move |s| s.templates(template_type).delete(&id)).await?;
    Ok(NoContent)
}
