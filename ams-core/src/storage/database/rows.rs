use crate::common::error::{MarketError, Result};
use crate::domain::*;
use uuid::Uuid;

/// Helper functions for serializing and deserializing domain records to/from
/// database rows. The `id` column is authoritative and overrides whatever the
/// stored payload carries.

pub(super) fn user_to_row_data(user: &User) -> Result<String> {
    serde_json::to_string(user).map_err(|e| MarketError::Database {
        message: format!("Failed to serialize user: {e}"),
    })
}

pub(super) fn row_data_to_user(id: &str, data: &str) -> Result<User> {
    let mut user: User = serde_json::from_str(data).map_err(|e| MarketError::Database {
        message: format!("Failed to deserialize user: {e}"),
    })?;
    user.id = Some(parse_id(id, "user")?);
    Ok(user)
}

pub(super) fn request_to_row_data(request: &UpgradeRequest) -> Result<String> {
    serde_json::to_string(request).map_err(|e| MarketError::Database {
        message: format!("Failed to serialize upgrade request: {e}"),
    })
}

pub(super) fn row_data_to_request(id: &str, data: &str) -> Result<UpgradeRequest> {
    let mut request: UpgradeRequest =
        serde_json::from_str(data).map_err(|e| MarketError::Database {
            message: format!("Failed to deserialize upgrade request: {e}"),
        })?;
    request.id = Some(parse_id(id, "upgrade request")?);
    Ok(request)
}

pub(super) fn profile_to_row_data(profile: &ArtisanProfile) -> Result<String> {
    serde_json::to_string(profile).map_err(|e| MarketError::Database {
        message: format!("Failed to serialize artisan profile: {e}"),
    })
}

pub(super) fn row_data_to_profile(id: &str, data: &str) -> Result<ArtisanProfile> {
    let mut profile: ArtisanProfile =
        serde_json::from_str(data).map_err(|e| MarketError::Database {
            message: format!("Failed to deserialize artisan profile: {e}"),
        })?;
    profile.id = Some(parse_id(id, "artisan profile")?);
    Ok(profile)
}

fn parse_id(id: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|e| MarketError::Database {
        message: format!("Invalid {what} UUID: {e}"),
    })
}
