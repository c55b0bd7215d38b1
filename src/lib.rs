use std::sync::Arc;

use log::*;
use serde_json::json;
use tide::http::headers::HeaderValue;
use tide::security::{CorsMiddleware, Origin};
use tide::utils::After;
use tide::{Response, Server, StatusCode};

pub mod api_models;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;
pub mod tally;

use crate::config::Config;
use crate::models::TripCatalog;
use crate::store::VoteStore;

/**
 * Struct for carrying application state into tide request handlers
 */
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: VoteStore,
    pub trips: Arc<TripCatalog>,
}

impl AppState {
    pub fn new(store: VoteStore, trips: TripCatalog) -> Self {
        Self {
            store,
            trips: Arc::new(trips),
        }
    }
}

/**
 * Assemble the tide server with every route and middleware mounted
 *
 * The admin routes only exist when an admin password is configured.
 */
pub fn build_app(state: AppState, config: &Config) -> tide::Result<Server<AppState>> {
    let mut app = tide::with_state(state);

    let cors = CorsMiddleware::new()
        .allow_methods("GET, POST, DELETE, OPTIONS".parse::<HeaderValue>()?)
        .allow_origin(Origin::from(config.cors_origin.as_str()))
        .allow_credentials(false);
    app.with(cors);
    app.with(After(render_errors));

    app.at("/healthz").get(routes::healthz);
    app.at("/trip-options").get(routes::trips::list);
    app.at("/votes")
        .get(routes::votes::list)
        .post(routes::votes::create);
    app.at("/results").get(routes::results::get);

    match &config.admin_password {
        Some(password) => {
            app.at("/admin/clear-votes")
                .with(routes::admin::AdminGuard::new(password.as_str()))
                .delete(routes::admin::clear_votes);
        }
        None => info!("ADMIN_PASSWORD is not set, admin routes are disabled"),
    }

    Ok(app)
}

/**
 * Give every failed response a `{"error": ...}` body
 */
async fn render_errors(mut res: Response) -> tide::Result {
    if let Some(message) = res.error().map(|err| err.to_string()) {
        res.set_body(json!({ "error": message }));
    } else if res.status() == StatusCode::NotFound {
        res.set_body(json!({ "error": "Not found" }));
    }
    Ok(res)
}
