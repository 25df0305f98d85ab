use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Artisan,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Artisan => "artisan",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "user" => Some(UserRole::User),
            "artisan" => Some(UserRole::Artisan),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Option<Uuid>,
    pub display_name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// The subset of a user shown to other callers (applicant identity on admin
/// listings, owner identity in search).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub display_name: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        PublicUser {
            id: user.id.unwrap_or_else(Uuid::nil),
            display_name: user.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }

    /// Pending is the only state a request can still be changed in.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinks {
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
}

/// Shop metadata a user supplies when applying, mirrored onto the profile on
/// approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopDetails {
    pub shop_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    pub experience_years: Option<u32>,
    pub website: Option<String>,
    #[serde(default)]
    pub social_links: SocialLinks,
}

/// Supporting evidence attached to an upgrade request: references into the
/// media store, never the media itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    #[serde(default)]
    pub work_images: Vec<String>,
    #[serde(default)]
    pub certificates: Vec<String>,
    pub identity_proof: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub shop: ShopDetails,
    #[serde(flatten)]
    pub evidence: Evidence,
    pub reason: Option<String>,
    pub status: RequestStatus,
    pub reviewed_by: Option<Uuid>,
    pub review_notes: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable payload of an upgrade request: everything the owner controls while
/// the request is pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequestDraft {
    pub shop: ShopDetails,
    pub evidence: Evidence,
    pub reason: Option<String>,
}

impl UpgradeRequest {
    /// A fresh pending request from a validated draft.
    pub fn from_draft(user_id: Uuid, draft: UpgradeRequestDraft, now: DateTime<Utc>) -> Self {
        UpgradeRequest {
            id: None,
            user_id,
            shop: draft.shop,
            evidence: draft.evidence,
            reason: draft.reason,
            status: RequestStatus::Pending,
            reviewed_by: None,
            review_notes: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the owner-mutable fields in place; id, status and creation
    /// time are untouched.
    pub fn apply_draft(&mut self, draft: UpgradeRequestDraft, now: DateTime<Utc>) {
        self.shop = draft.shop;
        self.evidence = draft.evidence;
        self.reason = draft.reason;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtisanProfile {
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub shop: ShopDetails,
    pub is_verified: bool,
    pub rating: Option<f64>,
    pub review_count: u32,
    pub total_sales: u64,
    pub follower_count: u32,
    pub template_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ArtisanProfile {
    /// The profile created as the side effect of approving `request`. Never
    /// constructed from user input directly.
    pub fn from_approved_request(request: &UpgradeRequest, now: DateTime<Utc>) -> Self {
        ArtisanProfile {
            id: None,
            user_id: request.user_id,
            shop: request.shop.clone(),
            is_verified: false,
            rating: None,
            review_count: 0,
            total_sales: 0,
            follower_count: 0,
            template_ref: None,
            created_at: now,
        }
    }
}

/// Owner-editable profile fields; `None` means "leave unchanged".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub shop_name: Option<String>,
    pub description: Option<String>,
    pub specialties: Option<Vec<String>>,
    pub experience_years: Option<u32>,
    pub website: Option<String>,
    pub social_links: Option<SocialLinks>,
    pub template_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Rating,
    ReviewCount,
    #[default]
    CreatedAt,
    FollowerCount,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rating" => Some(SortKey::Rating),
            "reviewCount" => Some(SortKey::ReviewCount),
            "createdAt" => Some(SortKey::CreatedAt),
            "followerCount" => Some(SortKey::FollowerCount),
            _ => None,
        }
    }
}

/// Directory search filters; filters combine with logical AND.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Case-insensitive substring match over shop name, description, or owner
    /// display name.
    pub search: Option<String>,
    /// At-least-one-match semantics against the profile's specialty set.
    pub specialties: Vec<String>,
    pub min_rating: Option<f64>,
    pub sort: SortKey,
}

/// One page of results plus the metadata callers need to paginate further.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64) as u32
        };
        Page {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_is_ceil_of_total_over_limit() {
        assert_eq!(Page::<u8>::new(vec![], 0, 1, 10).total_pages, 0);
        assert_eq!(Page::<u8>::new(vec![], 1, 1, 10).total_pages, 1);
        assert_eq!(Page::<u8>::new(vec![], 10, 1, 10).total_pages, 1);
        assert_eq!(Page::<u8>::new(vec![], 11, 1, 10).total_pages, 2);
        assert_eq!(Page::<u8>::new(vec![], 25, 2, 7).total_pages, 4);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RequestStatus::parse("bogus"), None);
    }

    #[test]
    fn only_pending_is_mutable() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }
}
