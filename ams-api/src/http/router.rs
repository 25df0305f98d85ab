use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::http::handlers::{
    amend_upgrade_request, approve_upgrade_request, artisans_by_specialty, featured_artisans,
    get_artisan_profile, get_upgrade_request, health, list_upgrade_requests,
    reject_upgrade_request, search_artisans, set_profile_verification, submit_upgrade_request,
    top_artisans, update_own_profile, upgrade_request_status,
};
use crate::state::AppState;

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/artisans", artisan_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn artisan_router() -> Router<AppState> {
    Router::new()
        .route(
            "/upgrade-request",
            post(submit_upgrade_request).patch(amend_upgrade_request),
        )
        .route("/upgrade-request/status", get(upgrade_request_status))
        .route("/admin/upgrade-requests", get(list_upgrade_requests))
        .route("/admin/upgrade-requests/:id", get(get_upgrade_request))
        .route(
            "/admin/upgrade-requests/:id/approve",
            post(approve_upgrade_request),
        )
        .route(
            "/admin/upgrade-requests/:id/reject",
            post(reject_upgrade_request),
        )
        .route("/admin/verify/:profile_id", patch(set_profile_verification))
        .route("/search", get(search_artisans))
        .route("/top", get(top_artisans))
        .route("/featured", get(featured_artisans))
        .route("/specialty/:specialty", get(artisans_by_specialty))
        .route("/profile", patch(update_own_profile))
        .route("/profile/:id", get(get_artisan_profile))
}
