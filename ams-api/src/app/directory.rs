//! Discovery reads over the artisan profile store, plus the profile mutators
//! that keep the discovery data live (self-service edits, verification,
//! review and sales aggregates).

use ams_core::common::error::{codes, MarketError, Result};
use ams_core::domain::*;
use ams_core::storage::Storage;
use ams_core::validation;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{clamp_paging, DEFAULT_PAGE_SIZE};

pub const FEATURED_LIMIT: usize = 8;
pub const DEFAULT_DISCOVERY_LIMIT: u32 = 10;
pub const MAX_DISCOVERY_LIMIT: u32 = 50;

#[derive(Clone)]
pub struct ArtisanDirectory {
    storage: Arc<dyn Storage>,
}

impl ArtisanDirectory {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Filtered, sorted, paginated profile search. Filters AND together; the
    /// free-text term matches shop name, description, or owner display name.
    pub async fn search(
        &self,
        filters: SearchFilters,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Page<ArtisanProfile>> {
        let profiles = self.storage.get_all_profiles().await?;
        let owner_names = self.load_owner_names(&profiles).await?;

        let needle = filters
            .search
            .as_deref()
            .map(str::to_lowercase)
            .filter(|s| !s.is_empty());

        let mut matches: Vec<ArtisanProfile> = profiles
            .into_iter()
            .filter(|profile| {
                if let Some(needle) = &needle {
                    let owner = owner_names
                        .get(&profile.user_id)
                        .map(String::as_str)
                        .unwrap_or("");
                    let hit = profile.shop.shop_name.to_lowercase().contains(needle)
                        || profile
                            .shop
                            .description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(needle))
                        || owner.to_lowercase().contains(needle);
                    if !hit {
                        return false;
                    }
                }
                if !filters.specialties.is_empty() {
                    let hit = profile.shop.specialties.iter().any(|have| {
                        filters
                            .specialties
                            .iter()
                            .any(|want| want.eq_ignore_ascii_case(have))
                    });
                    if !hit {
                        return false;
                    }
                }
                if let Some(min) = filters.min_rating {
                    // A profile with no reviews yet never matches a rating floor.
                    match profile.rating {
                        Some(rating) if rating >= min => {}
                        _ => return false,
                    }
                }
                true
            })
            .collect();

        sort_profiles(&mut matches, filters.sort);

        let total = matches.len() as u64;
        let (page, limit) = clamp_paging(page.unwrap_or(1), limit.unwrap_or(DEFAULT_PAGE_SIZE));
        let offset = ((page - 1) * limit) as usize;
        let end = std::cmp::min(offset + limit as usize, matches.len());
        let items = matches.get(offset..end).unwrap_or(&[]).to_vec();

        Ok(Page::new(items, total, page, limit))
    }

    /// Verified profiles with at least one review, best rated first.
    pub async fn top(&self, limit: Option<u32>) -> Result<Vec<ArtisanProfile>> {
        let mut profiles: Vec<ArtisanProfile> = self
            .storage
            .get_all_profiles()
            .await?
            .into_iter()
            .filter(|p| p.is_verified && p.rating.is_some())
            .collect();

        profiles.sort_by(|a, b| {
            cmp_rating(b.rating, a.rating)
                .then_with(|| b.review_count.cmp(&a.review_count))
                .then_with(|| b.follower_count.cmp(&a.follower_count))
                .then_with(|| b.id.cmp(&a.id))
        });

        profiles.truncate(discovery_limit(limit));
        Ok(profiles)
    }

    /// Verified profiles whose specialty set contains `specialty`.
    pub async fn by_specialty(
        &self,
        specialty: &str,
        limit: Option<u32>,
    ) -> Result<Vec<ArtisanProfile>> {
        let mut profiles: Vec<ArtisanProfile> = self
            .storage
            .get_all_profiles()
            .await?
            .into_iter()
            .filter(|p| {
                p.is_verified
                    && p.shop
                        .specialties
                        .iter()
                        .any(|have| have.eq_ignore_ascii_case(specialty))
            })
            .collect();

        profiles.sort_by(|a, b| {
            cmp_rating(b.rating, a.rating)
                .then_with(|| b.review_count.cmp(&a.review_count))
                .then_with(|| b.id.cmp(&a.id))
        });

        profiles.truncate(discovery_limit(limit));
        Ok(profiles)
    }

    /// The storefront strip: verified profiles with the largest following.
    pub async fn featured(&self) -> Result<Vec<ArtisanProfile>> {
        let mut profiles: Vec<ArtisanProfile> = self
            .storage
            .get_all_profiles()
            .await?
            .into_iter()
            .filter(|p| p.is_verified)
            .collect();

        profiles.sort_by(|a, b| {
            b.follower_count
                .cmp(&a.follower_count)
                .then_with(|| cmp_rating(b.rating, a.rating))
                .then_with(|| b.id.cmp(&a.id))
        });

        profiles.truncate(FEATURED_LIMIT);
        Ok(profiles)
    }

    pub async fn profile(&self, profile_id: Uuid) -> Result<ArtisanProfile> {
        self.storage
            .get_profile_by_id(profile_id)
            .await?
            .ok_or_else(|| {
                MarketError::not_found(codes::PROFILE_NOT_FOUND, "artisan profile not found")
            })
    }

    /// Self-service edit of the caller's own profile.
    pub async fn update_own_profile(
        &self,
        user_id: Uuid,
        patch: ProfilePatch,
    ) -> Result<ArtisanProfile> {
        validation::validate_profile_patch(&patch)?;

        let mut profile = self
            .storage
            .get_profile_by_user_id(user_id)
            .await?
            .ok_or_else(|| {
                MarketError::not_found(codes::PROFILE_NOT_FOUND, "this user has no artisan profile")
            })?;

        if let Some(shop_name) = patch.shop_name {
            profile.shop.shop_name = shop_name;
        }
        if let Some(description) = patch.description {
            profile.shop.description = Some(description);
        }
        if let Some(specialties) = patch.specialties {
            profile.shop.specialties = specialties;
        }
        if let Some(experience_years) = patch.experience_years {
            profile.shop.experience_years = Some(experience_years);
        }
        if let Some(website) = patch.website {
            profile.shop.website = Some(website);
        }
        if let Some(social_links) = patch.social_links {
            profile.shop.social_links = social_links;
        }
        if let Some(template_ref) = patch.template_ref {
            profile.template_ref = Some(template_ref);
        }

        self.storage.update_profile(&profile).await?;
        Ok(profile)
    }

    /// Admin verification toggle.
    pub async fn set_verification(
        &self,
        profile_id: Uuid,
        is_verified: bool,
    ) -> Result<ArtisanProfile> {
        let mut profile = self.profile(profile_id).await?;
        profile.is_verified = is_verified;
        self.storage.update_profile(&profile).await?;

        info!(
            "Profile {} verification set to {}",
            profile_id, is_verified
        );
        Ok(profile)
    }

    /// Review collaborator hook: fold one more review into the running
    /// average.
    pub async fn record_review(&self, profile_id: Uuid, rating: u8) -> Result<ArtisanProfile> {
        if !(1..=5).contains(&rating) {
            return Err(MarketError::validation("rating must be between 1 and 5"));
        }

        let mut profile = self.profile(profile_id).await?;
        let count = profile.review_count;
        let sum = profile.rating.unwrap_or(0.0) * count as f64 + rating as f64;
        profile.review_count = count + 1;
        profile.rating = Some(sum / (count + 1) as f64);

        self.storage.update_profile(&profile).await?;
        Ok(profile)
    }

    /// Order collaborator hook: one completed sale.
    pub async fn record_sale(&self, profile_id: Uuid) -> Result<ArtisanProfile> {
        let mut profile = self.profile(profile_id).await?;
        profile.total_sales += 1;
        self.storage.update_profile(&profile).await?;
        Ok(profile)
    }

    async fn load_owner_names(
        &self,
        profiles: &[ArtisanProfile],
    ) -> Result<HashMap<Uuid, String>> {
        let mut user_ids: Vec<Uuid> = Vec::new();
        for profile in profiles {
            if !user_ids.contains(&profile.user_id) {
                user_ids.push(profile.user_id);
            }
        }

        let users = self.storage.get_users_by_ids(user_ids).await?;
        Ok(users
            .iter()
            .filter_map(|user| user.id.map(|id| (id, user.display_name.clone())))
            .collect())
    }
}

fn discovery_limit(limit: Option<u32>) -> usize {
    limit
        .unwrap_or(DEFAULT_DISCOVERY_LIMIT)
        .clamp(1, MAX_DISCOVERY_LIMIT) as usize
}

fn sort_profiles(profiles: &mut [ArtisanProfile], key: SortKey) {
    profiles.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Rating => cmp_rating(b.rating, a.rating),
            SortKey::ReviewCount => b.review_count.cmp(&a.review_count),
            SortKey::CreatedAt => b.created_at.cmp(&a.created_at),
            SortKey::FollowerCount => b.follower_count.cmp(&a.follower_count),
        };
        // id keeps equal keys in a stable order across pages
        ordering.then_with(|| b.id.cmp(&a.id))
    });
}

fn cmp_rating(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}
