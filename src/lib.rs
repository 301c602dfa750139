//! # Tabletop Content Store
//!
//! A file-backed store for a tabletop-game aid: monsters, encounters,
//! reusable statblock templates and static reference data, each kept as one
//! pretty-printed JSON document on disk.
//!
//! ## Overview
//!
//! The [`store::ContentStore`] maps `(collection, id)` pairs to files inside
//! its root and never lets an identifier escape it. Resource repositories
//! ([`monsters`], [`encounters`], [`templates`], [`reference_data`]) implement
//! list / get / save / delete on top of it. Encounters are enriched at save
//! time with a snapshot of every referenced monster (average hit points,
//! initiative bonus, challenge rating) and a difficulty rating.
//!
//! ## Architecture
//!
//! The API is built using the Rocket web framework with OpenAPI documentation
//! support. The store is shared between requests as an `Arc<ContentStore>`;
//! filesystem work runs on the blocking worker pool, writers of the same id
//! are serialized and every write goes through a temp file and a rename.

// Rocket makes this a bit tricky to support
#![allow(clippy::module_name_repetitions)]
#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::AdHoc;
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{make_swagger_ui, SwaggerUIConfig};

pub mod config;
pub mod encounters;
pub mod error;
pub mod monsters;
pub mod reference_data;
pub mod responses;
pub mod status_messages;
pub mod store;
pub mod templates;

pub use crate::config::StoreConfig;
pub use crate::error::{Result, StoreError};
pub use crate::store::ContentStore;

/// Builds the Rocket application with settings read from the environment.
///
/// # Example
///
/// ```no_run
/// use tabletop_content_store::rocket_initialize;
///
/// #[rocket::main]
/// async fn main() {
///     rocket_initialize().launch().await.expect("Failed to launch rocket");
/// }
/// ```
pub fn rocket_initialize() -> rocket::Rocket<rocket::Build> {
    rocket_with_config(StoreConfig::from_env())
}

/// Builds the Rocket application for an explicit [`StoreConfig`].
///
/// The store is opened when Rocket ignites; if its root cannot be created
/// the launch is aborted.
pub fn rocket_with_config(config: StoreConfig) -> rocket::Rocket<rocket::Build> {
    use crate::encounters::*;
    use crate::monsters::*;
    use crate::reference_data::*;
    use crate::status_messages::{get_status, okapi_add_operation_for_get_status_};
    use crate::templates::*;

    let _ = env_logger::try_init();

    let body_limit = config.max_body_bytes.bytes();
    let figment = rocket::Config::figment().merge((
        "limits",
        Limits::default()
            .limit("string", body_limit)
            .limit("json", body_limit),
    ));

    rocket::custom(figment)
        .mount(
            "/",
            openapi_get_routes![
                get_status,
                list_monsters,
                get_monster,
                create_monster,
                put_monster,
                delete_monster,
                list_encounters,
                get_encounter,
                create_encounter,
                put_encounter,
                delete_encounter,
                list_templates,
                get_template,
                create_template,
                update_template,
                delete_template,
                list_reference_files,
                get_reference_file,
                get_spells,
            ],
        )
        .mount("/swagger", make_swagger_ui(&get_docs()))
        .attach(AdHoc::try_on_ignite("content-store", move |rocket| async move {
            match ContentStore::open(&config) {
                Ok(store) => Ok(rocket.manage(Arc::new(store))),
                Err(e) => {
                    log::error!("cannot open the content store: {}", e);
                    Err(rocket)
                }
            }
        }))
}

fn get_docs() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}
