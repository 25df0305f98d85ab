use crate::common::error::Result;
use crate::domain::*;
use async_trait::async_trait;
use uuid::Uuid;

/// Storage trait for persisting marketplace data (users, upgrade requests,
/// and artisan profiles). The store is the single source of truth: workflow
/// services hold no state between calls.
#[async_trait]
pub trait Storage: Send + Sync {
    // User operations
    async fn create_user(&self, user: &mut User) -> Result<()>;
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;
    async fn get_users_by_ids(&self, user_ids: Vec<Uuid>) -> Result<Vec<User>>;

    // Upgrade request operations
    //
    // `create_upgrade_request` must refuse a second pending request for the
    // same user with a Conflict error, even under concurrent submission.
    async fn create_upgrade_request(&self, request: &mut UpgradeRequest) -> Result<()>;
    async fn get_upgrade_request_by_id(&self, request_id: Uuid) -> Result<Option<UpgradeRequest>>;
    async fn get_pending_request_for_user(&self, user_id: Uuid) -> Result<Option<UpgradeRequest>>;
    async fn get_latest_request_for_user(&self, user_id: Uuid) -> Result<Option<UpgradeRequest>>;
    async fn update_upgrade_request(&self, request: &UpgradeRequest) -> Result<()>;
    /// One page of requests, newest first (created_at desc, id desc), plus the
    /// total count for the filter.
    async fn list_upgrade_requests(
        &self,
        status: Option<RequestStatus>,
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<UpgradeRequest>, u64)>;

    // Workflow transitions. Both are conditional on the stored request still
    // being pending; a lost race surfaces as InvalidState, never a blind
    // overwrite.
    //
    // `apply_approval` writes the reviewed request, promotes the owning user
    // to the artisan role, and creates `profile` as one atomic unit. On any
    // failure none of the three writes is observable.
    async fn apply_approval(
        &self,
        request: &UpgradeRequest,
        profile: &mut ArtisanProfile,
    ) -> Result<()>;
    async fn apply_rejection(&self, request: &UpgradeRequest) -> Result<()>;

    // Artisan profile operations
    async fn get_profile_by_id(&self, profile_id: Uuid) -> Result<Option<ArtisanProfile>>;
    async fn get_profile_by_user_id(&self, user_id: Uuid) -> Result<Option<ArtisanProfile>>;
    async fn update_profile(&self, profile: &ArtisanProfile) -> Result<()>;
    async fn get_all_profiles(&self) -> Result<Vec<ArtisanProfile>>;
}
