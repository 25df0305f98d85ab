use crate::common::error::{codes, MarketError, Result};
use crate::domain::*;
use crate::storage::traits::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct StoreState {
    users: HashMap<Uuid, User>,
    requests: HashMap<Uuid, UpgradeRequest>,
    profiles: HashMap<Uuid, ArtisanProfile>,
}

/// In-memory storage implementation for development/testing.
///
/// A single mutex guards the whole store, so the multi-write workflow
/// transitions are atomic the same way the database transaction makes them.
#[derive(Default)]
pub struct InMemoryStorage {
    state: Mutex<StoreState>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: &mut User) -> Result<()> {
        let id = user.id.unwrap_or_else(Uuid::new_v4);
        user.id = Some(id);

        let mut state = self.state.lock().unwrap();
        state.users.insert(id, user.clone());

        debug!("Created user: {} with id {}", user.display_name, id);
        Ok(())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.get(&user_id).cloned())
    }

    async fn get_users_by_ids(&self, user_ids: Vec<Uuid>) -> Result<Vec<User>> {
        let state = self.state.lock().unwrap();
        Ok(user_ids
            .into_iter()
            .filter_map(|id| state.users.get(&id).cloned())
            .collect())
    }

    async fn create_upgrade_request(&self, request: &mut UpgradeRequest) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        let has_pending = state
            .requests
            .values()
            .any(|r| r.user_id == request.user_id && r.status == RequestStatus::Pending);
        if has_pending {
            return Err(MarketError::conflict(
                codes::DUPLICATE_PENDING_REQUEST,
                "an upgrade request is already pending for this user",
            ));
        }

        let id = request.id.unwrap_or_else(Uuid::new_v4);
        request.id = Some(id);
        state.requests.insert(id, request.clone());

        debug!("Created upgrade request {} for user {}", id, request.user_id);
        Ok(())
    }

    async fn get_upgrade_request_by_id(&self, request_id: Uuid) -> Result<Option<UpgradeRequest>> {
        let state = self.state.lock().unwrap();
        Ok(state.requests.get(&request_id).cloned())
    }

    async fn get_pending_request_for_user(&self, user_id: Uuid) -> Result<Option<UpgradeRequest>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .requests
            .values()
            .find(|r| r.user_id == user_id && r.status == RequestStatus::Pending)
            .cloned())
    }

    async fn get_latest_request_for_user(&self, user_id: Uuid) -> Result<Option<UpgradeRequest>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .requests
            .values()
            .filter(|r| r.user_id == user_id)
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .cloned())
    }

    async fn update_upgrade_request(&self, request: &UpgradeRequest) -> Result<()> {
        let request_id = request.id.ok_or_else(|| {
            MarketError::database("cannot update an upgrade request without an id")
        })?;

        let mut state = self.state.lock().unwrap();
        if !state.requests.contains_key(&request_id) {
            return Err(MarketError::not_found(
                codes::UPGRADE_REQUEST_NOT_FOUND,
                "upgrade request not found",
            ));
        }
        state.requests.insert(request_id, request.clone());
        Ok(())
    }

    async fn list_upgrade_requests(
        &self,
        status: Option<RequestStatus>,
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<UpgradeRequest>, u64)> {
        let state = self.state.lock().unwrap();

        let mut requests: Vec<UpgradeRequest> = state
            .requests
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();

        // Newest first; id as the stable tiebreak so pagination stays
        // deterministic across pages.
        requests.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = requests.len() as u64;
        let offset = offset as usize;
        let end = std::cmp::min(offset + limit as usize, requests.len());
        let page = requests.get(offset..end).unwrap_or(&[]).to_vec();

        Ok((page, total))
    }

    async fn apply_approval(
        &self,
        request: &UpgradeRequest,
        profile: &mut ArtisanProfile,
    ) -> Result<()> {
        let request_id = request
            .id
            .ok_or_else(|| MarketError::database("cannot approve a request without an id"))?;

        let mut state = self.state.lock().unwrap();

        // Run every check before the first mutation so a failure leaves the
        // store untouched.
        match state.requests.get(&request_id) {
            None => {
                return Err(MarketError::not_found(
                    codes::UPGRADE_REQUEST_NOT_FOUND,
                    "upgrade request not found",
                ))
            }
            Some(stored) if stored.status.is_terminal() => {
                return Err(MarketError::invalid_state(
                    "upgrade request has already been reviewed",
                ))
            }
            Some(_) => {}
        }
        if !state.users.contains_key(&request.user_id) {
            return Err(MarketError::not_found(
                codes::USER_NOT_FOUND,
                "request owner no longer exists",
            ));
        }
        if state
            .profiles
            .values()
            .any(|p| p.user_id == request.user_id)
        {
            return Err(MarketError::conflict(
                codes::PROFILE_ALREADY_EXISTS,
                "an artisan profile already exists for this user",
            ));
        }

        let profile_id = profile.id.unwrap_or_else(Uuid::new_v4);
        profile.id = Some(profile_id);

        state.requests.insert(request_id, request.clone());
        if let Some(user) = state.users.get_mut(&request.user_id) {
            user.role = UserRole::Artisan;
        }
        state.profiles.insert(profile_id, profile.clone());

        debug!(
            "Approved upgrade request {} and created profile {}",
            request_id, profile_id
        );
        Ok(())
    }

    async fn apply_rejection(&self, request: &UpgradeRequest) -> Result<()> {
        let request_id = request
            .id
            .ok_or_else(|| MarketError::database("cannot reject a request without an id"))?;

        let mut state = self.state.lock().unwrap();

        match state.requests.get(&request_id) {
            None => {
                return Err(MarketError::not_found(
                    codes::UPGRADE_REQUEST_NOT_FOUND,
                    "upgrade request not found",
                ))
            }
            Some(stored) if stored.status.is_terminal() => {
                return Err(MarketError::invalid_state(
                    "upgrade request has already been reviewed",
                ))
            }
            Some(_) => {}
        }

        state.requests.insert(request_id, request.clone());
        debug!("Rejected upgrade request {}", request_id);
        Ok(())
    }

    async fn get_profile_by_id(&self, profile_id: Uuid) -> Result<Option<ArtisanProfile>> {
        let state = self.state.lock().unwrap();
        Ok(state.profiles.get(&profile_id).cloned())
    }

    async fn get_profile_by_user_id(&self, user_id: Uuid) -> Result<Option<ArtisanProfile>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .profiles
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn update_profile(&self, profile: &ArtisanProfile) -> Result<()> {
        let profile_id = profile
            .id
            .ok_or_else(|| MarketError::database("cannot update a profile without an id"))?;

        let mut state = self.state.lock().unwrap();
        if !state.profiles.contains_key(&profile_id) {
            return Err(MarketError::not_found(
                codes::PROFILE_NOT_FOUND,
                "artisan profile not found",
            ));
        }
        state.profiles.insert(profile_id, profile.clone());
        Ok(())
    }

    async fn get_all_profiles(&self) -> Result<Vec<ArtisanProfile>> {
        let state = self.state.lock().unwrap();
        Ok(state.profiles.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(name: &str) -> User {
        User {
            id: None,
            display_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role: UserRole::User,
            created_at: Utc::now(),
        }
    }

    fn pending_request(user_id: Uuid) -> UpgradeRequest {
        let draft = UpgradeRequestDraft {
            shop: ShopDetails {
                shop_name: "Clay Works".to_string(),
                description: None,
                specialties: vec!["pottery".to_string()],
                experience_years: None,
                website: None,
                social_links: SocialLinks::default(),
            },
            evidence: Evidence::default(),
            reason: None,
        };
        UpgradeRequest::from_draft(user_id, draft, Utc::now())
    }

    #[tokio::test]
    async fn second_pending_request_is_rejected() {
        let storage = InMemoryStorage::new();
        let mut owner = user("Mara");
        storage.create_user(&mut owner).await.unwrap();
        let user_id = owner.id.unwrap();

        let mut first = pending_request(user_id);
        storage.create_upgrade_request(&mut first).await.unwrap();

        let mut second = pending_request(user_id);
        let err = storage
            .create_upgrade_request(&mut second)
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::DUPLICATE_PENDING_REQUEST);
    }

    #[tokio::test]
    async fn approval_with_existing_profile_leaves_store_untouched() {
        let storage = InMemoryStorage::new();
        let mut owner = user("Mara");
        storage.create_user(&mut owner).await.unwrap();
        let user_id = owner.id.unwrap();

        let mut request = pending_request(user_id);
        storage.create_upgrade_request(&mut request).await.unwrap();

        // Seed a conflicting profile to induce a partial failure.
        let now = Utc::now();
        let mut existing = ArtisanProfile::from_approved_request(&request, now);
        existing.id = Some(Uuid::new_v4());
        {
            let mut state = storage.state.lock().unwrap();
            state.profiles.insert(existing.id.unwrap(), existing);
        }

        let mut approved = request.clone();
        approved.status = RequestStatus::Approved;
        let mut profile = ArtisanProfile::from_approved_request(&approved, now);
        let err = storage
            .apply_approval(&approved, &mut profile)
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::PROFILE_ALREADY_EXISTS);

        // No partial promotion: request still pending, role unchanged.
        let stored = storage
            .get_upgrade_request_by_id(request.id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, RequestStatus::Pending);
        let stored_user = storage.get_user_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(stored_user.role, UserRole::User);
    }

    #[tokio::test]
    async fn listing_is_newest_first_with_totals() {
        let storage = InMemoryStorage::new();
        for i in 0..3 {
            let mut owner = user(&format!("user{i}"));
            storage.create_user(&mut owner).await.unwrap();
            let mut request = pending_request(owner.id.unwrap());
            request.created_at = Utc::now() + chrono::Duration::seconds(i);
            storage.create_upgrade_request(&mut request).await.unwrap();
        }

        let (page, total) = storage
            .list_upgrade_requests(Some(RequestStatus::Pending), 0, 2)
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert!(page[0].created_at >= page[1].created_at);
    }
}
