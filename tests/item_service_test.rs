mod common;

use atelier_api::errors::ServiceError;
use atelier_api::services::items::{CreateItemInput, ItemListQuery, UpdateItemInput, DEFAULT_UNIT};
use common::TestApp;

fn input(code: &str, name: &str) -> CreateItemInput {
    CreateItemInput {
        code: code.to_string(),
        name: name.to_string(),
        description: None,
        unit: None,
        category: None,
        stock_min: None,
        active: None,
    }
}

#[tokio::test]
async fn create_applies_defaults() {
    let app = TestApp::new().await;

    let item = app.state.items.create(input("USB001", "USB key")).await.unwrap();

    assert_eq!(item.unit, DEFAULT_UNIT);
    assert_eq!(item.stock_min, 0);
    assert!(item.active);
    assert!(item.deleted_at.is_none());
    assert_eq!(item.description, None);
}

#[tokio::test]
async fn create_rejects_duplicate_code_case_insensitively() {
    let app = TestApp::new().await;

    app.state.items.create(input("USB001", "USB key")).await.unwrap();
    let err = app
        .state
        .items
        .create(input("usb001", "Other"))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(msg) if msg.contains("usb001")));
}

#[tokio::test]
async fn archived_item_frees_its_code() {
    let app = TestApp::new().await;

    let item = app.state.items.create(input("USB001", "USB key")).await.unwrap();
    app.state.items.remove(item.id).await.unwrap();

    // The code only has to be unique among live items.
    app.state.items.create(input("USB001", "Replacement")).await.unwrap();
}

#[tokio::test]
async fn find_one_hides_archived_items() {
    let app = TestApp::new().await;

    let item = app.state.items.create(input("USB001", "USB key")).await.unwrap();
    app.state.items.remove(item.id).await.unwrap();

    let err = app.state.items.find_one(item.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn update_touches_only_present_fields() {
    let app = TestApp::new().await;

    let item = app
        .state
        .items
        .create(CreateItemInput {
            description: Some("original description".to_string()),
            category: Some("IT".to_string()),
            ..input("USB001", "USB key")
        })
        .await
        .unwrap();

    let updated = app
        .state
        .items
        .update(
            item.id,
            UpdateItemInput {
                name: Some("USB key 3.0".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "USB key 3.0");
    assert_eq!(updated.code, "USB001");
    assert_eq!(updated.description, Some("original description".to_string()));
    assert_eq!(updated.category, Some("IT".to_string()));
}

#[tokio::test]
async fn update_with_explicit_null_clears_nullable_fields() {
    let app = TestApp::new().await;

    let item = app
        .state
        .items
        .create(CreateItemInput {
            description: Some("something".to_string()),
            ..input("USB001", "USB key")
        })
        .await
        .unwrap();

    let updated = app
        .state
        .items
        .update(
            item.id,
            UpdateItemInput {
                description: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.description, None);
}

#[tokio::test]
async fn update_rejects_code_taken_by_another_item() {
    let app = TestApp::new().await;

    app.state.items.create(input("USB001", "USB key")).await.unwrap();
    let other = app.state.items.create(input("HDD001", "Hard drive")).await.unwrap();

    let err = app
        .state
        .items
        .update(
            other.id,
            UpdateItemInput {
                code: Some("usb001".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    // Re-submitting its own code is not a collision.
    app.state
        .items
        .update(
            other.id,
            UpdateItemInput {
                code: Some("HDD001".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn remove_then_restore_round_trips_the_flags() {
    let app = TestApp::new().await;

    let item = app.state.items.create(input("USB001", "USB key")).await.unwrap();

    let removed = app.state.items.remove(item.id).await.unwrap();
    assert!(!removed.active);
    assert!(removed.deleted_at.is_some());

    let restored = app.state.items.restore(item.id).await.unwrap();
    assert!(restored.active);
    assert!(restored.deleted_at.is_none());
}

#[tokio::test]
async fn restore_fails_on_live_and_unknown_items() {
    let app = TestApp::new().await;

    let item = app.state.items.create(input("USB001", "USB key")).await.unwrap();

    let err = app.state.items.restore(item.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let err = app.state.items.restore(9999).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn check_code_exists_is_case_insensitive_and_supports_exclusion() {
    let app = TestApp::new().await;

    let item = app.state.items.create(input("USB001", "USB key")).await.unwrap();

    assert!(app.state.items.check_code_exists("usb001", None).await.unwrap());
    assert!(!app
        .state
        .items
        .check_code_exists("usb001", Some(item.id))
        .await
        .unwrap());
    assert!(!app.state.items.check_code_exists("HDD001", None).await.unwrap());

    // Archived items no longer hold their code.
    app.state.items.remove(item.id).await.unwrap();
    assert!(!app.state.items.check_code_exists("USB001", None).await.unwrap());
}

#[tokio::test]
async fn list_orders_active_first_then_by_code() {
    let app = TestApp::new().await;

    app.state.items.create(input("CCC", "Third")).await.unwrap();
    app.state
        .items
        .create(CreateItemInput {
            active: Some(false),
            ..input("AAA", "Inactive first code")
        })
        .await
        .unwrap();
    app.state.items.create(input("BBB", "Second")).await.unwrap();

    let page = app.state.items.find_all(ItemListQuery::default()).await.unwrap();
    let codes: Vec<&str> = page.data.iter().map(|i| i.code.as_str()).collect();
    assert_eq!(codes, vec!["BBB", "CCC", "AAA"]);
}

#[tokio::test]
async fn list_search_matches_name_and_code_case_insensitively() {
    let app = TestApp::new().await;

    app.state.items.create(input("USB001", "Flash drive")).await.unwrap();
    app.state.items.create(input("HDD001", "usb adapter")).await.unwrap();
    app.state.items.create(input("MON001", "Monitor")).await.unwrap();

    let page = app
        .state
        .items
        .find_all(ItemListQuery {
            search: Some("USB".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.data.len(), 2);
    assert_eq!(page.pagination.total, 2);
}

#[tokio::test]
async fn list_filters_by_category_exactly_but_case_insensitively() {
    let app = TestApp::new().await;

    app.state
        .items
        .create(CreateItemInput {
            category: Some("Informatique".to_string()),
            ..input("USB001", "USB key")
        })
        .await
        .unwrap();
    app.state
        .items
        .create(CreateItemInput {
            category: Some("Office".to_string()),
            ..input("PEN001", "Pen")
        })
        .await
        .unwrap();

    let page = app
        .state
        .items
        .find_all(ItemListQuery {
            category: Some("informatique".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].code, "USB001");
}

#[tokio::test]
async fn list_hides_archived_unless_asked() {
    let app = TestApp::new().await;

    let item = app.state.items.create(input("USB001", "USB key")).await.unwrap();
    app.state.items.create(input("HDD001", "Hard drive")).await.unwrap();
    app.state.items.remove(item.id).await.unwrap();

    let page = app.state.items.find_all(ItemListQuery::default()).await.unwrap();
    assert_eq!(page.data.len(), 1);

    let page = app
        .state
        .items
        .find_all(ItemListQuery {
            include_archived: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.data.len(), 2);
}

#[tokio::test]
async fn list_paginates_with_correct_metadata() {
    let app = TestApp::new().await;

    for i in 0..5 {
        app.state
            .items
            .create(input(&format!("ITM{:03}", i), "Item"))
            .await
            .unwrap();
    }

    let page = app
        .state
        .items
        .find_all(ItemListQuery {
            page: 2,
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.data.len(), 2);
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.total_pages, 3);
    assert!(page.pagination.has_next);
    assert!(page.pagination.has_previous);

    // A page past the end is empty, not an error.
    let page = app
        .state
        .items
        .find_all(ItemListQuery {
            page: 4,
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(page.data.is_empty());
    assert!(!page.pagination.has_next);
}
