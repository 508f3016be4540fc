mod common;

use std::time::Duration;

use serde_json::{Value, json};

use common::{MockBackend, Reply, page, signed_in, state_with};
use secov_admin::api::models::Brand;
use secov_admin::cli::{self, Commands};
use secov_admin::config::Config;
use secov_admin::entity::{EntityKind, descriptor};
use secov_admin::error::AppError;
use secov_admin::list::{ListController, SortDirection};
use secov_admin::notify::Inbox;

fn drivers() -> Value {
    json!([
        {"id": 1, "name": "Ana", "document_number": "12345678"},
        {"id": 2, "name": "Luis", "document_number": "87654321"}
    ])
}

fn list(entity: EntityKind) -> Commands {
    Commands::List {
        entity,
        page: 1,
        per_page: None,
        search: String::new(),
        sort: SortDirection::Desc,
        parent: None,
    }
}

#[tokio::test]
async fn driver_operator_lists_drivers_but_not_cars() {
    let backend = MockBackend::start(|_| Reply::ok(page(drivers(), 1))).await;
    let state = signed_in(&backend, &["driver.index"]).await;
    let inbox = Inbox::new();

    let output = cli::execute(&state, list(EntityKind::Driver), &inbox)
        .await
        .unwrap();
    assert!(output.contains("#1 Ana"));
    assert!(output.contains("Drivers page 1 of 1"));

    let hits = backend.hits();
    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.path, "/api/getDrivers");
    assert_eq!(hit.query["page"], "1");
    assert_eq!(hit.query["perPage"], "10");
    assert_eq!(hit.query["sort"], "desc");
    assert_eq!(hit.query["search"], "");
    assert_eq!(hit.authorization.as_deref(), Some("Bearer token-123"));

    let err = cli::execute(&state, list(EntityKind::Car), &inbox)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(backend.hits().len(), 1);
}

#[tokio::test]
async fn signed_out_users_cannot_list() {
    let backend = MockBackend::start(|_| Reply::ok(page(drivers(), 1))).await;
    let state = common::state_for(&backend);

    let err = cli::execute(&state, list(EntityKind::Driver), &Inbox::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(backend.hits().is_empty());
}

#[tokio::test]
async fn out_of_range_pages_are_ignored() {
    let backend = MockBackend::start(|_| Reply::ok(page(drivers(), 3))).await;
    let state = signed_in(&backend, &["driver.index"]).await;
    let controller =
        ListController::<Value>::for_entity(state.client.clone(), &descriptor(EntityKind::Driver), 10, None);

    controller.load().await.unwrap();
    assert!(!controller.handle_page_change(5).await.unwrap());
    assert!(!controller.handle_page_change(0).await.unwrap());
    assert!(!controller.handle_page_change(1).await.unwrap());
    assert_eq!(backend.hits().len(), 1);

    assert!(controller.handle_page_change(3).await.unwrap());
    let hits = backend.hits();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[1].query["page"], "3");
    assert_eq!(controller.query().page, 3);
}

#[tokio::test]
async fn typing_does_not_search_until_submitted() {
    let backend = MockBackend::start(|_| Reply::ok(page(drivers(), 4))).await;
    let state = signed_in(&backend, &["driver.index"]).await;
    let controller =
        ListController::<Value>::for_entity(state.client.clone(), &descriptor(EntityKind::Driver), 10, None);
    controller.load().await.unwrap();
    controller.handle_page_change(2).await.unwrap();

    controller.set_draft_search("ana");
    controller.set_draft_search("ana m");
    assert_eq!(backend.hits().len(), 2);
    assert_eq!(controller.snapshot().draft_search, "ana m");

    assert!(controller.submit_search().await.unwrap());
    let hits = backend.hits();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[2].query["search"], "ana m");
    assert_eq!(hits[2].query["page"], "1");

    assert!(controller.clear_search().await.unwrap());
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.draft_search, "");
    assert_eq!(snapshot.query.search, "");
    assert_eq!(backend.hits().len(), 4);
    assert!(!controller.clear_search().await.unwrap());
}

#[tokio::test]
async fn sort_and_page_size_changes_refetch() {
    let backend = MockBackend::start(|_| Reply::ok(page(json!([]), 1))).await;
    let state = signed_in(&backend, &["brand.index"]).await;
    let controller = ListController::<Value>::new(state.client.clone(), "getBrands", 10);
    controller.load().await.unwrap();

    assert!(!controller.set_sort(SortDirection::Desc).await.unwrap());
    assert!(controller.set_sort(SortDirection::Asc).await.unwrap());
    assert!(controller.set_per_page(25).await.unwrap());
    controller.refresh().await.unwrap();

    let hits = backend.hits();
    assert_eq!(hits.len(), 4);
    assert_eq!(hits[1].query["sort"], "asc");
    assert_eq!(hits[2].query["perPage"], "25");
}

#[tokio::test]
async fn stale_responses_are_discarded() {
    let backend = MockBackend::start(|hit| {
        if hit.query.get("search").map(String::as_str) == Some("") {
            Reply::ok(page(json!([{"id": 1, "name": "old"}]), 1)).after(Duration::from_millis(400))
        } else {
            Reply::ok(page(json!([{"id": 2, "name": "new"}]), 1))
        }
    })
    .await;
    let state = signed_in(&backend, &["brand.index"]).await;
    let controller = ListController::<Value>::new(state.client.clone(), "getBrands", 10);

    let (first, second) = tokio::join!(controller.load(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.set_draft_search("new");
        controller.submit_search().await
    });
    first.unwrap();
    second.unwrap();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.result.rows, vec![json!({"id": 2, "name": "new"})]);
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let backend =
        MockBackend::start(|_| Reply::ok(page(json!([]), 1)).after(Duration::from_secs(3))).await;
    let mut config = Config::new(backend.url());
    config.request_timeout_secs = 1;
    let state = state_with(config);
    let controller = ListController::<Value>::new(state.client.clone(), "getBrands", 10);

    let err = controller.load().await.unwrap_err();
    assert!(matches!(err, AppError::Timeout));
    assert!(controller.snapshot().last_error.is_some());
}

#[tokio::test]
async fn rows_decode_into_typed_records() {
    let backend = MockBackend::start(|_| {
        Reply::ok(page(json!([{"id": 5, "name": "Hyundai"}, {"id": 6, "name": "Kia"}]), 2))
    })
    .await;
    let state = signed_in(&backend, &["brand.index"]).await;
    let controller = ListController::<Brand>::for_entity(
        state.client.clone(),
        &descriptor(EntityKind::Brand),
        10,
        None,
    );

    controller.load().await.unwrap();
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.result.total_pages, 2);
    assert_eq!(snapshot.result.rows[1].name, "Kia");
}

#[tokio::test]
async fn car_lists_request_their_relations() {
    let backend = MockBackend::start(|_| Reply::ok(page(json!([]), 1))).await;
    let state = signed_in(&backend, &["car.index", "insurance.index"]).await;
    let inbox = Inbox::new();

    cli::execute(&state, list(EntityKind::Car), &inbox).await.unwrap();
    assert_eq!(backend.hits()[0].query["included"], "brand,driver");

    let err = cli::execute(&state, list(EntityKind::Insurance), &inbox)
        .await
        .unwrap_err();
    assert!(err.field_errors().is_some_and(|f| f.contains_key("parent")));

    let nested = Commands::List {
        entity: EntityKind::Insurance,
        page: 1,
        per_page: Some(5),
        search: String::new(),
        sort: SortDirection::Desc,
        parent: Some("42".to_string()),
    };
    cli::execute(&state, nested, &inbox).await.unwrap();
    let hits = backend.hits();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[1].path, "/api/getInsurances/42");
    assert_eq!(hits[1].query["perPage"], "5");
}

#[tokio::test]
async fn cancelled_fetch_does_not_leave_the_list_loading() {
    let backend = MockBackend::start(|_| {
        Reply::ok(page(json!([{"id": 1, "name": "Toyota"}]), 1)).after(Duration::from_millis(500))
    })
    .await;
    let state = signed_in(&backend, &["brand.index"]).await;
    let controller = ListController::<Value>::new(state.client.clone(), "getBrands", 10);

    let cancelled = tokio::time::timeout(Duration::from_millis(50), controller.load()).await;
    assert!(cancelled.is_err());
    assert!(!controller.snapshot().loading);

    tokio::time::sleep(Duration::from_millis(700)).await;
    let snapshot = controller.snapshot();
    assert!(!snapshot.loading);
    assert!(snapshot.result.rows.is_empty());

    controller.refresh().await.unwrap();
    let snapshot = controller.snapshot();
    assert!(!snapshot.loading);
    assert_eq!(snapshot.result.rows.len(), 1);
}
