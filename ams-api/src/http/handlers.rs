use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use ams_core::domain::{ArtisanProfile, Page, ProfilePatch, UpgradeRequest};

use crate::app::upgrade_workflow::{ApprovalOutcome, RequestStatusView, RequestWithApplicant};
use crate::http::auth::Identity;
use crate::http::models::{
    LimitQuery, ListRequestsQuery, ReviewBody, SearchQuery, UpgradeRequestBody, VerifyBody,
};
use crate::http::response::{ApiResponse, ApiResult};
use crate::state::AppState;

pub async fn health() -> impl IntoResponse {
    "OK"
}

// --- upgrade-request lifecycle (caller-facing) ---

pub async fn submit_upgrade_request(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<UpgradeRequestBody>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UpgradeRequest>>)> {
    let request = state
        .workflow
        .submit(identity.user_id, body.into_draft())
        .await?;
    Ok(ApiResponse::created("upgrade request submitted", request))
}

pub async fn amend_upgrade_request(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<UpgradeRequestBody>,
) -> ApiResult<Json<ApiResponse<UpgradeRequest>>> {
    let request = state
        .workflow
        .amend(identity.user_id, body.into_draft())
        .await?;
    Ok(ApiResponse::ok("upgrade request updated", request))
}

pub async fn upgrade_request_status(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<ApiResponse<RequestStatusView>>> {
    let status = state.workflow.status(identity.user_id).await?;
    Ok(ApiResponse::ok("upgrade request status", status))
}

// --- admin review ---

pub async fn list_upgrade_requests(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<ListRequestsQuery>,
) -> ApiResult<Json<ApiResponse<Page<RequestWithApplicant>>>> {
    identity.require_admin()?;
    let status = query.status_filter()?;
    let page = state.workflow.list(status, query.page, query.limit).await?;
    Ok(ApiResponse::ok("upgrade requests", page))
}

pub async fn get_upgrade_request(
    State(state): State<AppState>,
    identity: Identity,
    Path(request_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<RequestWithApplicant>>> {
    identity.require_admin()?;
    let request = state.workflow.get(request_id).await?;
    Ok(ApiResponse::ok("upgrade request", request))
}

pub async fn approve_upgrade_request(
    State(state): State<AppState>,
    identity: Identity,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ReviewBody>,
) -> ApiResult<Json<ApiResponse<ApprovalOutcome>>> {
    identity.require_admin()?;
    let outcome = state
        .workflow
        .approve(request_id, identity.user_id, body.admin_notes)
        .await?;
    Ok(ApiResponse::ok("upgrade request approved", outcome))
}

pub async fn reject_upgrade_request(
    State(state): State<AppState>,
    identity: Identity,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ReviewBody>,
) -> ApiResult<Json<ApiResponse<UpgradeRequest>>> {
    identity.require_admin()?;
    let request = state
        .workflow
        .reject(
            request_id,
            identity.user_id,
            body.admin_notes.as_deref().unwrap_or(""),
        )
        .await?;
    Ok(ApiResponse::ok("upgrade request rejected", request))
}

pub async fn set_profile_verification(
    State(state): State<AppState>,
    identity: Identity,
    Path(profile_id): Path<Uuid>,
    Json(body): Json<VerifyBody>,
) -> ApiResult<Json<ApiResponse<ArtisanProfile>>> {
    identity.require_admin()?;
    let profile = state
        .directory
        .set_verification(profile_id, body.is_verified)
        .await?;
    Ok(ApiResponse::ok("profile verification updated", profile))
}

// --- public discovery ---

pub async fn search_artisans(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<ApiResponse<Page<ArtisanProfile>>>> {
    let (filters, page, limit) = query.into_filters()?;
    let results = state.directory.search(filters, page, limit).await?;
    Ok(ApiResponse::ok("artisan search results", results))
}

pub async fn top_artisans(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<ApiResponse<Vec<ArtisanProfile>>>> {
    let profiles = state.directory.top(query.limit).await?;
    Ok(ApiResponse::ok("top artisans", profiles))
}

pub async fn featured_artisans(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<ArtisanProfile>>>> {
    let profiles = state.directory.featured().await?;
    Ok(ApiResponse::ok("featured artisans", profiles))
}

pub async fn artisans_by_specialty(
    State(state): State<AppState>,
    Path(specialty): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<ApiResponse<Vec<ArtisanProfile>>>> {
    let profiles = state.directory.by_specialty(&specialty, query.limit).await?;
    Ok(ApiResponse::ok("artisans by specialty", profiles))
}

pub async fn get_artisan_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<ArtisanProfile>>> {
    let profile = state.directory.profile(profile_id).await?;
    Ok(ApiResponse::ok("artisan profile", profile))
}

pub async fn update_own_profile(
    State(state): State<AppState>,
    identity: Identity,
    Json(patch): Json<ProfilePatch>,
) -> ApiResult<Json<ApiResponse<ArtisanProfile>>> {
    let profile = state
        .directory
        .update_own_profile(identity.user_id, patch)
        .await?;
    Ok(ApiResponse::ok("profile updated", profile))
}
