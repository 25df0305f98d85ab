mod common;

use ams_core::common::error::{codes, MarketError};
use ams_core::domain::*;
use anyhow::Result;
use uuid::Uuid;

use common::{create_user, draft, setup};

#[tokio::test]
async fn submit_creates_a_pending_request() -> Result<()> {
    let ctx = setup();
    let user_id = create_user(&ctx.storage, "Mara Holt").await;

    let request = ctx
        .workflow
        .submit(user_id, draft("Clay Works", &["pottery"]))
        .await?;

    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.user_id, user_id);
    assert!(request.id.is_some());
    assert!(request.reviewed_by.is_none());
    Ok(())
}

#[tokio::test]
async fn submit_for_unknown_user_is_not_found() {
    let ctx = setup();
    let err = ctx
        .workflow
        .submit(Uuid::new_v4(), draft("Clay Works", &[]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::USER_NOT_FOUND);
}

#[tokio::test]
async fn submit_with_blank_shop_name_is_rejected() {
    let ctx = setup();
    let user_id = create_user(&ctx.storage, "Mara Holt").await;
    let err = ctx
        .workflow
        .submit(user_id, draft("   ", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Validation { .. }));
}

#[tokio::test]
async fn second_pending_submission_conflicts() -> Result<()> {
    let ctx = setup();
    let user_id = create_user(&ctx.storage, "Mara Holt").await;

    ctx.workflow
        .submit(user_id, draft("Clay Works", &["pottery"]))
        .await?;
    let err = ctx
        .workflow
        .submit(user_id, draft("Clay Works Again", &[]))
        .await
        .unwrap_err();

    assert_eq!(err.code(), codes::DUPLICATE_PENDING_REQUEST);
    Ok(())
}

#[tokio::test]
async fn resubmission_after_rejection_succeeds() -> Result<()> {
    let ctx = setup();
    let user_id = create_user(&ctx.storage, "Mara Holt").await;
    let admin_id = Uuid::new_v4();

    let first = ctx
        .workflow
        .submit(user_id, draft("Clay Works", &["pottery"]))
        .await?;
    ctx.workflow
        .reject(first.id.unwrap(), admin_id, "insufficient experience")
        .await?;

    let second = ctx
        .workflow
        .submit(user_id, draft("Clay Works", &["pottery"]))
        .await?;
    assert_eq!(second.status, RequestStatus::Pending);
    assert_ne!(second.id, first.id);

    // Invariant: still at most one pending request for the user.
    let (pending, total) = ctx
        .storage
        .list_upgrade_requests(Some(RequestStatus::Pending), 0, 10)
        .await?;
    assert_eq!(total, 1);
    assert_eq!(pending[0].id, second.id);
    Ok(())
}

#[tokio::test]
async fn submit_after_approval_conflicts_with_existing_profile() -> Result<()> {
    let ctx = setup();
    let user_id = create_user(&ctx.storage, "Mara Holt").await;

    let request = ctx
        .workflow
        .submit(user_id, draft("Clay Works", &["pottery"]))
        .await?;
    ctx.workflow
        .approve(request.id.unwrap(), Uuid::new_v4(), None)
        .await?;

    let err = ctx
        .workflow
        .submit(user_id, draft("Second Shop", &[]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::PROFILE_ALREADY_EXISTS);
    Ok(())
}

#[tokio::test]
async fn amend_overwrites_fields_but_not_status_or_id() -> Result<()> {
    let ctx = setup();
    let user_id = create_user(&ctx.storage, "Mara Holt").await;

    let original = ctx
        .workflow
        .submit(user_id, draft("Clay Works", &["pottery"]))
        .await?;

    let mut amended_draft = draft("Clay Works", &["pottery"]);
    amended_draft.shop.experience_years = Some(5);
    let amended = ctx.workflow.amend(user_id, amended_draft).await?;

    assert_eq!(amended.id, original.id);
    assert_eq!(amended.status, RequestStatus::Pending);
    assert_eq!(amended.shop.shop_name, "Clay Works");
    assert_eq!(amended.shop.experience_years, Some(5));
    assert_eq!(amended.created_at, original.created_at);
    Ok(())
}

#[tokio::test]
async fn amend_without_a_pending_request_is_not_found() {
    let ctx = setup();
    let user_id = create_user(&ctx.storage, "Mara Holt").await;
    let err = ctx
        .workflow
        .amend(user_id, draft("Clay Works", &[]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::UPGRADE_REQUEST_NOT_FOUND);
}

#[tokio::test]
async fn status_reports_absence_as_success_not_error() -> Result<()> {
    let ctx = setup();
    let user_id = create_user(&ctx.storage, "Mara Holt").await;

    let view = ctx.workflow.status(user_id).await?;
    assert!(!view.has_request);
    assert!(view.request.is_none());

    ctx.workflow
        .submit(user_id, draft("Clay Works", &["pottery"]))
        .await?;
    let view = ctx.workflow.status(user_id).await?;
    assert!(view.has_request);
    assert_eq!(view.request.unwrap().status, RequestStatus::Pending);
    Ok(())
}

#[tokio::test]
async fn clay_works_lifecycle_end_to_end() -> Result<()> {
    let ctx = setup();
    let user_id = create_user(&ctx.storage, "Mara Holt").await;
    let admin_id = Uuid::new_v4();

    // submit(shopName="Clay Works", specialties=["pottery"])
    let request = ctx
        .workflow
        .submit(user_id, draft("Clay Works", &["pottery"]))
        .await?;

    // amend(experience=5) leaves status and shop name alone
    let mut amended = draft("Clay Works", &["pottery"]);
    amended.shop.experience_years = Some(5);
    let request = ctx.workflow.amend(user_id, amended).await?;
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.shop.shop_name, "Clay Works");
    assert_eq!(request.shop.experience_years, Some(5));

    // approve(adminId)
    let outcome = ctx
        .workflow
        .approve(request.id.unwrap(), admin_id, None)
        .await?;

    assert_eq!(outcome.request.status, RequestStatus::Approved);
    assert_eq!(outcome.request.reviewed_by, Some(admin_id));
    assert!(outcome.request.reviewed_at.is_some());

    let profile = outcome.profile;
    assert_eq!(profile.shop.shop_name, "Clay Works");
    assert!(!profile.is_verified);
    assert_eq!(profile.total_sales, 0);
    assert_eq!(profile.rating, None);

    // Atomicity, observed from the outside: request approved <=> profile
    // exists <=> role promoted.
    let stored_request = ctx
        .storage
        .get_upgrade_request_by_id(request.id.unwrap())
        .await?
        .unwrap();
    assert_eq!(stored_request.status, RequestStatus::Approved);
    let stored_profile = ctx.storage.get_profile_by_user_id(user_id).await?.unwrap();
    assert_eq!(stored_profile.id, profile.id);
    let user = ctx.storage.get_user_by_id(user_id).await?.unwrap();
    assert_eq!(user.role, UserRole::Artisan);
    Ok(())
}

#[tokio::test]
async fn review_on_a_terminal_request_is_invalid_state() -> Result<()> {
    let ctx = setup();
    let user_id = create_user(&ctx.storage, "Mara Holt").await;
    let admin_id = Uuid::new_v4();

    let request = ctx
        .workflow
        .submit(user_id, draft("Clay Works", &["pottery"]))
        .await?;
    let request_id = request.id.unwrap();

    let outcome = ctx
        .workflow
        .approve(request_id, admin_id, Some("solid portfolio".to_string()))
        .await?;

    // A second approve and a late reject both lose.
    let err = ctx
        .workflow
        .approve(request_id, Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidState { .. }));

    let err = ctx
        .workflow
        .reject(request_id, Uuid::new_v4(), "changed my mind")
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidState { .. }));

    // The first review's metadata is untouched.
    let stored = ctx
        .storage
        .get_upgrade_request_by_id(request_id)
        .await?
        .unwrap();
    assert_eq!(stored.status, RequestStatus::Approved);
    assert_eq!(stored.reviewed_by, Some(admin_id));
    assert_eq!(stored.review_notes, outcome.request.review_notes);
    Ok(())
}

#[tokio::test]
async fn reject_requires_notes() -> Result<()> {
    let ctx = setup();
    let user_id = create_user(&ctx.storage, "Mara Holt").await;
    let admin_id = Uuid::new_v4();

    let request = ctx
        .workflow
        .submit(user_id, draft("Clay Works", &["pottery"]))
        .await?;
    let request_id = request.id.unwrap();

    for empty in ["", "   "] {
        let err = ctx
            .workflow
            .reject(request_id, admin_id, empty)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Validation { .. }));
    }

    // The request is still pending after the failed attempts.
    let stored = ctx
        .storage
        .get_upgrade_request_by_id(request_id)
        .await?
        .unwrap();
    assert_eq!(stored.status, RequestStatus::Pending);

    let rejected = ctx
        .workflow
        .reject(request_id, admin_id, "insufficient experience")
        .await?;
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(
        rejected.review_notes.as_deref(),
        Some("insufficient experience")
    );
    assert_eq!(rejected.reviewed_by, Some(admin_id));

    // No profile appears on rejection.
    assert!(ctx
        .storage
        .get_profile_by_user_id(user_id)
        .await?
        .is_none());
    Ok(())
}

#[tokio::test]
async fn listing_paginates_newest_first_with_applicants() -> Result<()> {
    let ctx = setup();

    let mut submitted = Vec::new();
    for name in ["Ana Reyes", "Ben Okafor", "Cleo Marsh"] {
        let user_id = create_user(&ctx.storage, name).await;
        let request = ctx
            .workflow
            .submit(user_id, draft(&format!("{name} Studio"), &[]))
            .await?;
        submitted.push(request);
    }

    let page = ctx
        .workflow
        .list(Some(RequestStatus::Pending), Some(1), Some(2))
        .await?;
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 2);
    for item in &page.items {
        let applicant = item.applicant.as_ref().expect("applicant attached");
        assert!(!applicant.display_name.is_empty());
    }
    // Newest first across the page boundary.
    assert!(page.items[0].request.created_at >= page.items[1].request.created_at);

    let last = ctx
        .workflow
        .list(Some(RequestStatus::Pending), Some(2), Some(2))
        .await?;
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.total_pages, 2);
    Ok(())
}

#[tokio::test]
async fn listing_with_no_matches_has_zero_pages() -> Result<()> {
    let ctx = setup();

    let page = ctx
        .workflow
        .list(Some(RequestStatus::Approved), None, None)
        .await?;
    assert_eq!(page.total, 0);
    assert_eq!(page.total_pages, 0);
    assert!(page.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn get_returns_not_found_for_unknown_id() {
    let ctx = setup();
    let err = ctx.workflow.get(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.code(), codes::UPGRADE_REQUEST_NOT_FOUND);
}
