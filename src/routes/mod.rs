pub mod api;
pub mod downloads;
pub mod pages;

use axum::response::Redirect;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db::PortalStore;
use crate::state::AppState;

pub fn router<S: PortalStore>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/pio/submissions") }))
        .route("/pio/submissions", get(pages::submissions_page::<S>))
        .route("/pio/api/researchers", get(api::researchers::<S>))
        .route("/pio/api/submission", get(api::submission_detail::<S>))
        .route("/pio/api/submissions", get(api::list_submissions::<S>))
        .route(
            "/pio/api/payment-status",
            post(api::update_payment_status::<S>).fallback(api::method_not_allowed),
        )
        .route(
            "/pio/api/submission-status",
            post(api::update_submission_status::<S>).fallback(api::method_not_allowed),
        )
        .route("/pio/files/:file_id", get(downloads::download_file::<S>))
        .route(
            "/pio/submissions/:submission_id/download_all",
            get(downloads::download_all::<S>),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
