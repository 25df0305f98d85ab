#![allow(dead_code)]

use std::sync::Arc;

use ams_api::app::{ArtisanDirectory, UpgradeWorkflow};
use ams_core::domain::*;
use ams_core::storage::{InMemoryStorage, Storage};
use chrono::Utc;
use uuid::Uuid;

pub struct TestContext {
    pub storage: Arc<dyn Storage>,
    pub workflow: UpgradeWorkflow,
    pub directory: ArtisanDirectory,
}

pub fn setup() -> TestContext {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    TestContext {
        workflow: UpgradeWorkflow::new(storage.clone()),
        directory: ArtisanDirectory::new(storage.clone()),
        storage,
    }
}

pub async fn create_user(storage: &Arc<dyn Storage>, name: &str) -> Uuid {
    let mut user = User {
        id: None,
        display_name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        role: UserRole::User,
        created_at: Utc::now(),
    };
    storage.create_user(&mut user).await.unwrap();
    user.id.unwrap()
}

pub fn draft(shop_name: &str, specialties: &[&str]) -> UpgradeRequestDraft {
    UpgradeRequestDraft {
        shop: ShopDetails {
            shop_name: shop_name.to_string(),
            description: None,
            specialties: specialties.iter().map(|s| s.to_string()).collect(),
            experience_years: None,
            website: None,
            social_links: SocialLinks::default(),
        },
        evidence: Evidence::default(),
        reason: None,
    }
}

/// Walk a user through submit -> approve and hand back the created profile.
pub async fn promote(
    ctx: &TestContext,
    name: &str,
    shop_name: &str,
    specialties: &[&str],
) -> ArtisanProfile {
    let user_id = create_user(&ctx.storage, name).await;
    let request = ctx
        .workflow
        .submit(user_id, draft(shop_name, specialties))
        .await
        .unwrap();
    let outcome = ctx
        .workflow
        .approve(request.id.unwrap(), Uuid::new_v4(), None)
        .await
        .unwrap();
    outcome.profile
}
