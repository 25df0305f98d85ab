//! The upgrade-request lifecycle: `none -> pending -> {approved, rejected}`.
//!
//! Pending is the only mutable state. Every transition re-reads and re-writes
//! through the store; the engine keeps no state between calls. The approve
//! side effects (role promotion + profile creation) are delegated to the
//! store's atomic `apply_approval`.

use ams_core::common::error::{codes, MarketError, Result};
use ams_core::domain::*;
use ams_core::storage::Storage;
use ams_core::validation;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{clamp_paging, DEFAULT_PAGE_SIZE};

/// Answer to "does this user have an upgrade request, and where does it
/// stand?". Absence is a normal answer, not an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatusView {
    pub has_request: bool,
    pub request: Option<UpgradeRequest>,
}

/// A request joined with its owner's public identity, for admin review.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWithApplicant {
    #[serde(flatten)]
    pub request: UpgradeRequest,
    pub applicant: Option<PublicUser>,
}

/// Everything a successful approval produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalOutcome {
    pub request: UpgradeRequest,
    pub profile: ArtisanProfile,
}

#[derive(Clone)]
pub struct UpgradeWorkflow {
    storage: Arc<dyn Storage>,
}

impl UpgradeWorkflow {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn submit(&self, user_id: Uuid, draft: UpgradeRequestDraft) -> Result<UpgradeRequest> {
        validation::validate_draft(&draft)?;

        let user = self
            .storage
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| MarketError::not_found(codes::USER_NOT_FOUND, "user not found"))?;

        if self
            .storage
            .get_pending_request_for_user(user_id)
            .await?
            .is_some()
        {
            return Err(MarketError::conflict(
                codes::DUPLICATE_PENDING_REQUEST,
                "an upgrade request is already pending for this user",
            ));
        }
        if self
            .storage
            .get_profile_by_user_id(user_id)
            .await?
            .is_some()
        {
            return Err(MarketError::conflict(
                codes::PROFILE_ALREADY_EXISTS,
                "this user already has an artisan profile",
            ));
        }

        let mut request = UpgradeRequest::from_draft(user_id, draft, Utc::now());
        self.storage.create_upgrade_request(&mut request).await?;

        info!(
            "User {} ({}) submitted upgrade request {}",
            user.display_name,
            user_id,
            request.id.unwrap_or_else(Uuid::nil)
        );
        Ok(request)
    }

    pub async fn amend(&self, user_id: Uuid, draft: UpgradeRequestDraft) -> Result<UpgradeRequest> {
        validation::validate_draft(&draft)?;

        let mut request = self
            .storage
            .get_pending_request_for_user(user_id)
            .await?
            .ok_or_else(|| {
                MarketError::not_found(
                    codes::UPGRADE_REQUEST_NOT_FOUND,
                    "no pending upgrade request to amend",
                )
            })?;

        request.apply_draft(draft, Utc::now());
        self.storage.update_upgrade_request(&request).await?;

        info!(
            "User {} amended upgrade request {}",
            user_id,
            request.id.unwrap_or_else(Uuid::nil)
        );
        Ok(request)
    }

    pub async fn status(&self, user_id: Uuid) -> Result<RequestStatusView> {
        let request = self.storage.get_latest_request_for_user(user_id).await?;
        Ok(RequestStatusView {
            has_request: request.is_some(),
            request,
        })
    }

    pub async fn approve(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
        notes: Option<String>,
    ) -> Result<ApprovalOutcome> {
        let request = self.load_reviewable(request_id).await?;

        if self
            .storage
            .get_profile_by_user_id(request.user_id)
            .await?
            .is_some()
        {
            return Err(MarketError::conflict(
                codes::PROFILE_ALREADY_EXISTS,
                "an artisan profile already exists for this user",
            ));
        }

        let now = Utc::now();
        let mut approved = request;
        approved.status = RequestStatus::Approved;
        approved.reviewed_by = Some(admin_id);
        approved.review_notes = notes.and_then(normalize_notes);
        approved.reviewed_at = Some(now);
        approved.updated_at = now;

        let mut profile = ArtisanProfile::from_approved_request(&approved, now);
        self.storage.apply_approval(&approved, &mut profile).await?;

        info!(
            "Admin {} approved upgrade request {}; profile {} created",
            admin_id,
            request_id,
            profile.id.unwrap_or_else(Uuid::nil)
        );
        Ok(ApprovalOutcome {
            request: approved,
            profile,
        })
    }

    pub async fn reject(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
        notes: &str,
    ) -> Result<UpgradeRequest> {
        // Mandatory at the boundary, not only in the request schema.
        let notes = normalize_notes(notes.to_string()).ok_or_else(|| {
            MarketError::validation("admin notes are required when rejecting an upgrade request")
        })?;

        let request = self.load_reviewable(request_id).await?;

        let now = Utc::now();
        let mut rejected = request;
        rejected.status = RequestStatus::Rejected;
        rejected.reviewed_by = Some(admin_id);
        rejected.review_notes = Some(notes);
        rejected.reviewed_at = Some(now);
        rejected.updated_at = now;

        self.storage.apply_rejection(&rejected).await?;

        info!("Admin {} rejected upgrade request {}", admin_id, request_id);
        Ok(rejected)
    }

    pub async fn list(
        &self,
        status: Option<RequestStatus>,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Page<RequestWithApplicant>> {
        let (page, limit) = clamp_paging(
            page.unwrap_or(1),
            limit.unwrap_or(DEFAULT_PAGE_SIZE),
        );
        let offset = (page - 1) * limit;

        let (requests, total) = self
            .storage
            .list_upgrade_requests(status, offset, limit)
            .await?;

        let applicants = self.load_applicants(&requests).await?;
        let items = requests
            .into_iter()
            .map(|request| {
                let applicant = applicants.get(&request.user_id).cloned();
                RequestWithApplicant { request, applicant }
            })
            .collect();

        Ok(Page::new(items, total, page, limit))
    }

    pub async fn get(&self, request_id: Uuid) -> Result<RequestWithApplicant> {
        let request = self
            .storage
            .get_upgrade_request_by_id(request_id)
            .await?
            .ok_or_else(|| {
                MarketError::not_found(codes::UPGRADE_REQUEST_NOT_FOUND, "upgrade request not found")
            })?;

        let applicants = self.load_applicants(std::slice::from_ref(&request)).await?;
        let applicant = applicants.get(&request.user_id).cloned();
        Ok(RequestWithApplicant { request, applicant })
    }

    async fn load_reviewable(&self, request_id: Uuid) -> Result<UpgradeRequest> {
        let request = self
            .storage
            .get_upgrade_request_by_id(request_id)
            .await?
            .ok_or_else(|| {
                MarketError::not_found(codes::UPGRADE_REQUEST_NOT_FOUND, "upgrade request not found")
            })?;

        if request.status.is_terminal() {
            return Err(MarketError::invalid_state(
                "upgrade request has already been reviewed",
            ));
        }
        Ok(request)
    }

    async fn load_applicants(
        &self,
        requests: &[UpgradeRequest],
    ) -> Result<HashMap<Uuid, PublicUser>> {
        let mut user_ids: Vec<Uuid> = Vec::new();
        for request in requests {
            if !user_ids.contains(&request.user_id) {
                user_ids.push(request.user_id);
            }
        }

        let users = self.storage.get_users_by_ids(user_ids).await?;
        Ok(users
            .iter()
            .filter_map(|user| user.id.map(|id| (id, PublicUser::from(user))))
            .collect())
    }
}

fn normalize_notes(notes: String) -> Option<String> {
    let trimmed = notes.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
