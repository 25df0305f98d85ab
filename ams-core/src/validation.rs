//! Field-level validation for caller-supplied payloads.
//!
//! Schema-shaped checks (required fields, bounded lengths) live here so every
//! entry point into the workflow enforces the same rules.

use crate::common::error::{MarketError, Result};
use crate::domain::{ProfilePatch, ShopDetails, SocialLinks, UpgradeRequestDraft};

pub const MAX_SHOP_NAME_LEN: usize = 120;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_SPECIALTIES: usize = 10;
pub const MAX_SPECIALTY_LEN: usize = 50;
pub const MAX_EXPERIENCE_YEARS: u32 = 80;
pub const MAX_URL_LEN: usize = 200;
pub const MAX_EVIDENCE_ITEMS: usize = 12;
pub const MAX_EVIDENCE_REF_LEN: usize = 300;
pub const MAX_REASON_LEN: usize = 1000;

pub fn validate_draft(draft: &UpgradeRequestDraft) -> Result<()> {
    validate_shop_details(&draft.shop)?;

    check_list(
        "workImages",
        &draft.evidence.work_images,
        MAX_EVIDENCE_ITEMS,
        MAX_EVIDENCE_REF_LEN,
    )?;
    check_list(
        "certificates",
        &draft.evidence.certificates,
        MAX_EVIDENCE_ITEMS,
        MAX_EVIDENCE_REF_LEN,
    )?;
    check_len(
        "identityProof",
        draft.evidence.identity_proof.as_deref(),
        MAX_EVIDENCE_REF_LEN,
    )?;
    check_len("reason", draft.reason.as_deref(), MAX_REASON_LEN)?;
    Ok(())
}

pub fn validate_shop_details(shop: &ShopDetails) -> Result<()> {
    if shop.shop_name.trim().is_empty() {
        return Err(MarketError::validation("shop name is required"));
    }
    check_len("shopName", Some(&shop.shop_name), MAX_SHOP_NAME_LEN)?;
    check_len(
        "description",
        shop.description.as_deref(),
        MAX_DESCRIPTION_LEN,
    )?;
    validate_specialties(&shop.specialties)?;
    if let Some(years) = shop.experience_years {
        if years > MAX_EXPERIENCE_YEARS {
            return Err(MarketError::validation(format!(
                "experienceYears must be at most {MAX_EXPERIENCE_YEARS}"
            )));
        }
    }
    check_len("website", shop.website.as_deref(), MAX_URL_LEN)?;
    validate_social_links(&shop.social_links)?;
    Ok(())
}

pub fn validate_profile_patch(patch: &ProfilePatch) -> Result<()> {
    if let Some(name) = &patch.shop_name {
        if name.trim().is_empty() {
            return Err(MarketError::validation("shop name must not be empty"));
        }
        check_len("shopName", Some(name), MAX_SHOP_NAME_LEN)?;
    }
    check_len(
        "description",
        patch.description.as_deref(),
        MAX_DESCRIPTION_LEN,
    )?;
    if let Some(specialties) = &patch.specialties {
        validate_specialties(specialties)?;
    }
    if let Some(years) = patch.experience_years {
        if years > MAX_EXPERIENCE_YEARS {
            return Err(MarketError::validation(format!(
                "experienceYears must be at most {MAX_EXPERIENCE_YEARS}"
            )));
        }
    }
    check_len("website", patch.website.as_deref(), MAX_URL_LEN)?;
    if let Some(links) = &patch.social_links {
        validate_social_links(links)?;
    }
    check_len("templateRef", patch.template_ref.as_deref(), MAX_URL_LEN)?;
    Ok(())
}

fn validate_specialties(specialties: &[String]) -> Result<()> {
    if specialties.len() > MAX_SPECIALTIES {
        return Err(MarketError::validation(format!(
            "at most {MAX_SPECIALTIES} specialties are allowed"
        )));
    }
    for specialty in specialties {
        if specialty.trim().is_empty() {
            return Err(MarketError::validation("specialties must not be empty"));
        }
        check_len("specialties", Some(specialty), MAX_SPECIALTY_LEN)?;
    }
    Ok(())
}

fn validate_social_links(links: &SocialLinks) -> Result<()> {
    check_len("socialLinks.instagram", links.instagram.as_deref(), MAX_URL_LEN)?;
    check_len("socialLinks.facebook", links.facebook.as_deref(), MAX_URL_LEN)?;
    check_len("socialLinks.twitter", links.twitter.as_deref(), MAX_URL_LEN)?;
    Ok(())
}

fn check_len(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(MarketError::validation(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

fn check_list(field: &str, values: &[String], max_items: usize, max_len: usize) -> Result<()> {
    if values.len() > max_items {
        return Err(MarketError::validation(format!(
            "{field} must contain at most {max_items} entries"
        )));
    }
    for value in values {
        check_len(field, Some(value), max_len)?;
    }
    Ok(())
}
