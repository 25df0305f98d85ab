//! Request bodies and query strings for the artisan endpoints.

use ams_core::common::error::{MarketError, Result};
use ams_core::domain::{
    Evidence, RequestStatus, SearchFilters, ShopDetails, SocialLinks, SortKey, UpgradeRequestDraft,
};
use serde::Deserialize;

/// Flat submission/amendment payload, folded into the domain draft.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequestBody {
    pub shop_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    pub experience_years: Option<u32>,
    pub website: Option<String>,
    #[serde(default)]
    pub social_links: SocialLinks,
    #[serde(default)]
    pub work_images: Vec<String>,
    #[serde(default)]
    pub certificates: Vec<String>,
    pub identity_proof: Option<String>,
    pub reason: Option<String>,
}

impl UpgradeRequestBody {
    pub fn into_draft(self) -> UpgradeRequestDraft {
        UpgradeRequestDraft {
            shop: ShopDetails {
                shop_name: self.shop_name,
                description: self.description,
                specialties: self.specialties,
                experience_years: self.experience_years,
                website: self.website,
                social_links: self.social_links,
            },
            evidence: Evidence {
                work_images: self.work_images,
                certificates: self.certificates,
                identity_proof: self.identity_proof,
            },
            reason: self.reason,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyBody {
    pub is_verified: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequestsQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListRequestsQuery {
    pub fn status_filter(&self) -> Result<Option<RequestStatus>> {
        match self.status.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => RequestStatus::parse(raw).map(Some).ok_or_else(|| {
                MarketError::validation(format!("unknown status filter: {raw}"))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub search: Option<String>,
    /// Comma-separated list, e.g. `specialties=pottery,weaving`.
    pub specialties: Option<String>,
    pub min_rating: Option<f64>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SearchQuery {
    pub fn into_filters(self) -> Result<(SearchFilters, Option<u32>, Option<u32>)> {
        let sort = match self.sort.as_deref() {
            None | Some("") => SortKey::default(),
            Some(raw) => SortKey::parse(raw)
                .ok_or_else(|| MarketError::validation(format!("unknown sort key: {raw}")))?,
        };

        let specialties = self
            .specialties
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if let Some(min) = self.min_rating {
            if !(0.0..=5.0).contains(&min) {
                return Err(MarketError::validation("minRating must be between 0 and 5"));
            }
        }

        let filters = SearchFilters {
            search: self.search,
            specialties,
            min_rating: self.min_rating,
            sort,
        };
        Ok((filters, self.page, self.limit))
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specialties_split_on_commas_and_drop_blanks() {
        let query = SearchQuery {
            search: None,
            specialties: Some("pottery, weaving,,  ".to_string()),
            min_rating: None,
            sort: None,
            page: None,
            limit: None,
        };
        let (filters, _, _) = query.into_filters().unwrap();
        assert_eq!(filters.specialties, vec!["pottery", "weaving"]);
        assert_eq!(filters.sort, SortKey::CreatedAt);
    }

    #[test]
    fn unknown_sort_key_is_a_validation_error() {
        let query = SearchQuery {
            search: None,
            specialties: None,
            min_rating: None,
            sort: Some("bogus".to_string()),
            page: None,
            limit: None,
        };
        assert!(query.into_filters().is_err());
    }

    #[test]
    fn status_filter_parses_known_values() {
        let query = ListRequestsQuery {
            status: Some("approved".to_string()),
            page: None,
            limit: None,
        };
        assert_eq!(
            query.status_filter().unwrap(),
            Some(RequestStatus::Approved)
        );

        let query = ListRequestsQuery {
            status: Some("weird".to_string()),
            page: None,
            limit: None,
        };
        assert!(query.status_filter().is_err());
    }
}
