use crate::common::error::{codes, MarketError, Result};
use crate::database::DatabaseManager;
use crate::domain::*;
use crate::storage::traits::Storage;
use async_trait::async_trait;
use libsql::Transaction;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

mod rows;

/// Database storage implementation using Turso/libSQL.
pub struct DatabaseStorage {
    db: Arc<DatabaseManager>,
}

impl DatabaseStorage {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db: Arc::new(db) }
    }

    fn map_db_err(context: &str, e: libsql::Error) -> MarketError {
        MarketError::Database {
            message: format!("{context}: {e}"),
        }
    }

    fn is_unique_violation(e: &libsql::Error) -> bool {
        e.to_string().contains("UNIQUE constraint failed")
    }

    async fn read_single(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Option<(String, String)>> {
        let conn = self.db.get_connection().await?;
        let mut result = conn
            .query(sql, params)
            .await
            .map_err(|e| Self::map_db_err("Failed to query row", e))?;

        if let Some(row) = result
            .next()
            .await
            .map_err(|e| Self::map_db_err("Failed to read row", e))?
        {
            let id: String = row
                .get(0)
                .map_err(|e| Self::map_db_err("Failed to get id", e))?;
            let data: String = row
                .get(1)
                .map_err(|e| Self::map_db_err("Failed to get data", e))?;
            Ok(Some((id, data)))
        } else {
            Ok(None)
        }
    }

    /// Whether a request row with this id exists, read inside the transaction
    /// so a compare-and-swap miss can be told apart from a missing row.
    async fn request_exists(tx: &Transaction, request_id: Uuid) -> Result<bool> {
        let mut result = tx
            .query(
                "SELECT id FROM upgrade_requests WHERE id = ?1",
                libsql::params![request_id.to_string()],
            )
            .await
            .map_err(|e| Self::map_db_err("Failed to query upgrade request", e))?;
        let row = result
            .next()
            .await
            .map_err(|e| Self::map_db_err("Failed to read row", e))?;
        Ok(row.is_some())
    }

    /// Conditional status flip: succeeds only while the stored row is still
    /// pending. Returns InvalidState when a concurrent reviewer won the race.
    async fn cas_request_update(tx: &Transaction, request: &UpgradeRequest) -> Result<Uuid> {
        let request_id = request.id.ok_or_else(|| {
            MarketError::database("cannot update an upgrade request without an id")
        })?;
        let data = rows::request_to_row_data(request)?;

        let affected = tx
            .execute(
                "UPDATE upgrade_requests SET status = ?2, data = ?3, updated_at = ?4
                 WHERE id = ?1 AND status = 'pending'",
                libsql::params![
                    request_id.to_string(),
                    request.status.as_str(),
                    data,
                    request.updated_at.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| Self::map_db_err("Failed to update upgrade request", e))?;

        if affected == 0 {
            if Self::request_exists(tx, request_id).await? {
                return Err(MarketError::invalid_state(
                    "upgrade request has already been reviewed",
                ));
            }
            return Err(MarketError::not_found(
                codes::UPGRADE_REQUEST_NOT_FOUND,
                "upgrade request not found",
            ));
        }
        Ok(request_id)
    }
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn create_user(&self, user: &mut User) -> Result<()> {
        let id = user.id.unwrap_or_else(Uuid::new_v4);
        user.id = Some(id);

        let conn = self.db.get_connection().await?;
        let data = rows::user_to_row_data(user)?;
        conn.execute(
            "INSERT INTO users (id, email, role, data, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            libsql::params![
                id.to_string(),
                user.email.clone(),
                user.role.as_str(),
                data,
                user.created_at.to_rfc3339()
            ],
        )
        .await
        .map_err(|e| Self::map_db_err("Failed to insert user", e))?;

        info!("Created user: {} with id {}", user.display_name, id);
        Ok(())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = self
            .read_single(
                "SELECT id, data FROM users WHERE id = ?1",
                libsql::params![user_id.to_string()],
            )
            .await?;
        row.map(|(id, data)| rows::row_data_to_user(&id, &data))
            .transpose()
    }

    async fn get_users_by_ids(&self, user_ids: Vec<Uuid>) -> Result<Vec<User>> {
        let mut users = Vec::new();
        for user_id in user_ids {
            if let Some(user) = self.get_user_by_id(user_id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    async fn create_upgrade_request(&self, request: &mut UpgradeRequest) -> Result<()> {
        let id = request.id.unwrap_or_else(Uuid::new_v4);
        request.id = Some(id);

        let conn = self.db.get_connection().await?;
        let data = rows::request_to_row_data(request)?;
        conn.execute(
            "INSERT INTO upgrade_requests (id, user_id, status, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            libsql::params![
                id.to_string(),
                request.user_id.to_string(),
                request.status.as_str(),
                data,
                request.created_at.to_rfc3339(),
                request.updated_at.to_rfc3339()
            ],
        )
        .await
        .map_err(|e| {
            // The partial unique index backstops the one-pending-per-user
            // invariant under concurrent submission.
            if Self::is_unique_violation(&e) {
                MarketError::conflict(
                    codes::DUPLICATE_PENDING_REQUEST,
                    "an upgrade request is already pending for this user",
                )
            } else {
                Self::map_db_err("Failed to insert upgrade request", e)
            }
        })?;

        info!(
            "Created upgrade request {} for user {}",
            id, request.user_id
        );
        Ok(())
    }

    async fn get_upgrade_request_by_id(&self, request_id: Uuid) -> Result<Option<UpgradeRequest>> {
        let row = self
            .read_single(
                "SELECT id, data FROM upgrade_requests WHERE id = ?1",
                libsql::params![request_id.to_string()],
            )
            .await?;
        row.map(|(id, data)| rows::row_data_to_request(&id, &data))
            .transpose()
    }

    async fn get_pending_request_for_user(&self, user_id: Uuid) -> Result<Option<UpgradeRequest>> {
        let row = self
            .read_single(
                "SELECT id, data FROM upgrade_requests WHERE user_id = ?1 AND status = 'pending'",
                libsql::params![user_id.to_string()],
            )
            .await?;
        row.map(|(id, data)| rows::row_data_to_request(&id, &data))
            .transpose()
    }

    async fn get_latest_request_for_user(&self, user_id: Uuid) -> Result<Option<UpgradeRequest>> {
        let row = self
            .read_single(
                "SELECT id, data FROM upgrade_requests WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT 1",
                libsql::params![user_id.to_string()],
            )
            .await?;
        row.map(|(id, data)| rows::row_data_to_request(&id, &data))
            .transpose()
    }

    async fn update_upgrade_request(&self, request: &UpgradeRequest) -> Result<()> {
        let request_id = request.id.ok_or_else(|| {
            MarketError::database("cannot update an upgrade request without an id")
        })?;

        let conn = self.db.get_connection().await?;
        let data = rows::request_to_row_data(request)?;
        let affected = conn
            .execute(
                "UPDATE upgrade_requests SET status = ?2, data = ?3, updated_at = ?4 WHERE id = ?1",
                libsql::params![
                    request_id.to_string(),
                    request.status.as_str(),
                    data,
                    request.updated_at.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| Self::map_db_err("Failed to update upgrade request", e))?;

        if affected == 0 {
            return Err(MarketError::not_found(
                codes::UPGRADE_REQUEST_NOT_FOUND,
                "upgrade request not found",
            ));
        }

        debug!("Updated upgrade request {}", request_id);
        Ok(())
    }

    async fn list_upgrade_requests(
        &self,
        status: Option<RequestStatus>,
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<UpgradeRequest>, u64)> {
        let conn = self.db.get_connection().await?;

        let (count_sql, page_sql) = match status {
            Some(_) => (
                "SELECT COUNT(*) FROM upgrade_requests WHERE status = ?1",
                "SELECT id, data FROM upgrade_requests WHERE status = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            ),
            None => (
                "SELECT COUNT(*) FROM upgrade_requests",
                "SELECT id, data FROM upgrade_requests
                 ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            ),
        };

        let mut count_rows = match status {
            Some(s) => conn.query(count_sql, libsql::params![s.as_str()]).await,
            None => conn.query(count_sql, libsql::params![]).await,
        }
        .map_err(|e| Self::map_db_err("Failed to count upgrade requests", e))?;

        let total: u64 = match count_rows
            .next()
            .await
            .map_err(|e| Self::map_db_err("Failed to read row", e))?
        {
            Some(row) => row
                .get::<i64>(0)
                .map_err(|e| Self::map_db_err("Failed to get count", e))? as u64,
            None => 0,
        };

        let mut page_rows = match status {
            Some(s) => {
                conn.query(
                    page_sql,
                    libsql::params![s.as_str(), limit as i64, offset as i64],
                )
                .await
            }
            None => {
                conn.query(page_sql, libsql::params![limit as i64, offset as i64])
                    .await
            }
        }
        .map_err(|e| Self::map_db_err("Failed to query upgrade requests", e))?;

        let mut requests = Vec::new();
        while let Some(row) = page_rows
            .next()
            .await
            .map_err(|e| Self::map_db_err("Failed to read row", e))?
        {
            let id: String = row
                .get(0)
                .map_err(|e| Self::map_db_err("Failed to get id", e))?;
            let data: String = row
                .get(1)
                .map_err(|e| Self::map_db_err("Failed to get data", e))?;
            requests.push(rows::row_data_to_request(&id, &data)?);
        }

        Ok((requests, total))
    }

    async fn apply_approval(
        &self,
        request: &UpgradeRequest,
        profile: &mut ArtisanProfile,
    ) -> Result<()> {
        let conn = self.db.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| Self::map_db_err("Failed to begin transaction", e))?;

        // (a) request -> approved, conditional on it still being pending
        let request_id = Self::cas_request_update(&tx, request).await?;

        // (b) promote the owning user
        let mut user_rows = tx
            .query(
                "SELECT id, data FROM users WHERE id = ?1",
                libsql::params![request.user_id.to_string()],
            )
            .await
            .map_err(|e| Self::map_db_err("Failed to query user", e))?;
        let user_row = user_rows
            .next()
            .await
            .map_err(|e| Self::map_db_err("Failed to read row", e))?;
        let Some(user_row) = user_row else {
            return Err(MarketError::not_found(
                codes::USER_NOT_FOUND,
                "request owner no longer exists",
            ));
        };
        let id: String = user_row
            .get(0)
            .map_err(|e| Self::map_db_err("Failed to get id", e))?;
        let data: String = user_row
            .get(1)
            .map_err(|e| Self::map_db_err("Failed to get data", e))?;
        let mut user = rows::row_data_to_user(&id, &data)?;
        user.role = UserRole::Artisan;
        let user_data = rows::user_to_row_data(&user)?;
        tx.execute(
            "UPDATE users SET role = ?2, data = ?3 WHERE id = ?1",
            libsql::params![id, user.role.as_str(), user_data],
        )
        .await
        .map_err(|e| Self::map_db_err("Failed to update user role", e))?;

        // (c) create the profile from the approved request
        let profile_id = profile.id.unwrap_or_else(Uuid::new_v4);
        profile.id = Some(profile_id);
        let profile_data = rows::profile_to_row_data(profile)?;
        tx.execute(
            "INSERT INTO artisan_profiles (id, user_id, data, created_at) VALUES (?1, ?2, ?3, ?4)",
            libsql::params![
                profile_id.to_string(),
                profile.user_id.to_string(),
                profile_data,
                profile.created_at.to_rfc3339()
            ],
        )
        .await
        .map_err(|e| {
            if Self::is_unique_violation(&e) {
                MarketError::conflict(
                    codes::PROFILE_ALREADY_EXISTS,
                    "an artisan profile already exists for this user",
                )
            } else {
                Self::map_db_err("Failed to insert artisan profile", e)
            }
        })?;

        // Dropping the transaction on any error path above rolls all three
        // writes back.
        tx.commit()
            .await
            .map_err(|e| Self::map_db_err("Failed to commit approval", e))?;

        info!(
            "Approved upgrade request {} and created profile {} for user {}",
            request_id, profile_id, profile.user_id
        );
        Ok(())
    }

    async fn apply_rejection(&self, request: &UpgradeRequest) -> Result<()> {
        let conn = self.db.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| Self::map_db_err("Failed to begin transaction", e))?;

        let request_id = Self::cas_request_update(&tx, request).await?;

        tx.commit()
            .await
            .map_err(|e| Self::map_db_err("Failed to commit rejection", e))?;

        info!("Rejected upgrade request {}", request_id);
        Ok(())
    }

    async fn get_profile_by_id(&self, profile_id: Uuid) -> Result<Option<ArtisanProfile>> {
        let row = self
            .read_single(
                "SELECT id, data FROM artisan_profiles WHERE id = ?1",
                libsql::params![profile_id.to_string()],
            )
            .await?;
        row.map(|(id, data)| rows::row_data_to_profile(&id, &data))
            .transpose()
    }

    async fn get_profile_by_user_id(&self, user_id: Uuid) -> Result<Option<ArtisanProfile>> {
        let row = self
            .read_single(
                "SELECT id, data FROM artisan_profiles WHERE user_id = ?1",
                libsql::params![user_id.to_string()],
            )
            .await?;
        row.map(|(id, data)| rows::row_data_to_profile(&id, &data))
            .transpose()
    }

    async fn update_profile(&self, profile: &ArtisanProfile) -> Result<()> {
        let profile_id = profile
            .id
            .ok_or_else(|| MarketError::database("cannot update a profile without an id"))?;

        let conn = self.db.get_connection().await?;
        let data = rows::profile_to_row_data(profile)?;
        let affected = conn
            .execute(
                "UPDATE artisan_profiles SET data = ?2 WHERE id = ?1",
                libsql::params![profile_id.to_string(), data],
            )
            .await
            .map_err(|e| Self::map_db_err("Failed to update artisan profile", e))?;

        if affected == 0 {
            return Err(MarketError::not_found(
                codes::PROFILE_NOT_FOUND,
                "artisan profile not found",
            ));
        }

        debug!("Updated artisan profile {}", profile_id);
        Ok(())
    }

    async fn get_all_profiles(&self) -> Result<Vec<ArtisanProfile>> {
        let conn = self.db.get_connection().await?;
        let mut result = conn
            .query("SELECT id, data FROM artisan_profiles", libsql::params![])
            .await
            .map_err(|e| Self::map_db_err("Failed to query artisan profiles", e))?;

        let mut profiles = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| Self::map_db_err("Failed to read row", e))?
        {
            let id: String = row
                .get(0)
                .map_err(|e| Self::map_db_err("Failed to get id", e))?;
            let data: String = row
                .get(1)
                .map_err(|e| Self::map_db_err("Failed to get data", e))?;
            profiles.push(rows::row_data_to_profile(&id, &data)?);
        }

        Ok(profiles)
    }
}
