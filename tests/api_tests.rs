//! API integration tests
//!
//! Run against a live server with a migrated database:
//! `cargo test -- --ignored`

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique suffix so tests can run repeatedly against one database
fn unique(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}", prefix, std::process::id(), n)
}

async fn create_borrower(client: &Client) -> i64 {
    let username = unique("borrower");
    let response = client
        .post(format!("{}/borrowers", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.org", username),
            "full_name": "Test Borrower"
        }))
        .send()
        .await
        .expect("Failed to create borrower");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse borrower");
    body["id"].as_i64().expect("No borrower ID")
}

async fn create_item(client: &Client, total_copies: i64) -> i64 {
    let isbn = unique("isbn");
    let response = client
        .post(format!("{}/items", BASE_URL))
        .json(&json!({
            "isbn": isbn,
            "title": format!("Title {}", isbn),
            "author": "Test Author",
            "category": "Testing",
            "total_copies": total_copies
        }))
        .send()
        .await
        .expect("Failed to create item");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse item");
    body["id"].as_i64().expect("No item ID")
}

async fn available_copies(client: &Client, item_id: i64) -> i64 {
    let response = client
        .get(format!("{}/items/{}", BASE_URL, item_id))
        .send()
        .await
        .expect("Failed to fetch item");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse item");
    body["available_copies"].as_i64().expect("No counter")
}

async fn borrow(client: &Client, borrower_id: i64, item_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/loans/borrow", BASE_URL))
        .json(&json!({ "borrower_id": borrower_id, "item_id": item_id }))
        .send()
        .await
        .expect("Failed to send borrow request")
}

async fn return_item(client: &Client, borrower_id: i64, item_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/loans/return", BASE_URL))
        .json(&json!({ "borrower_id": borrower_id, "item_id": item_id }))
        .send()
        .await
        .expect("Failed to send return request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_create_get_delete_item() {
    let client = Client::new();
    let item_id = create_item(&client, 3).await;

    let response = client
        .get(format!("{}/items/{}", BASE_URL, item_id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["total_copies"], 3);
    assert_eq!(body["available_copies"], 3);
    assert_eq!(body["status"], "available");

    let response = client
        .delete(format!("{}/items/{}", BASE_URL, item_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_rejected() {
    let client = Client::new();
    let isbn = unique("isbn");
    let payload = json!({
        "isbn": isbn,
        "title": "Twice",
        "author": "Author",
        "category": "Testing",
        "total_copies": 1
    });

    let first = client
        .post(format!("{}/items", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(first.status(), 201);

    let second = client
        .post(format!("{}/items", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_borrow_return_round_trip() {
    let client = Client::new();
    let borrower_id = create_borrower(&client).await;
    let item_id = create_item(&client, 2).await;

    let response = borrow(&client, borrower_id, item_id).await;
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse loan");
    assert_eq!(loan["status"], "active");
    assert_eq!(loan["kind"], "borrow");
    assert_eq!(available_copies(&client, item_id).await, 1);

    let response = return_item(&client, borrower_id, item_id).await;
    assert!(response.status().is_success());
    let loan: Value = response.json().await.expect("Failed to parse loan");
    assert_eq!(loan["status"], "returned");
    assert!(loan["returned_at"].is_string());
    assert_eq!(available_copies(&client, item_id).await, 2);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_borrow_rejected() {
    let client = Client::new();
    let borrower_id = create_borrower(&client).await;
    let item_id = create_item(&client, 3).await;

    assert_eq!(borrow(&client, borrower_id, item_id).await.status(), 201);

    let response = borrow(&client, borrower_id, item_id).await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "DuplicateLoan");
}

#[tokio::test]
#[ignore]
async fn test_return_without_loan_rejected() {
    let client = Client::new();
    let borrower_id = create_borrower(&client).await;
    let item_id = create_item(&client, 1).await;

    let response = return_item(&client, borrower_id, item_id).await;
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "NoActiveLoan");
}

#[tokio::test]
#[ignore]
async fn test_borrow_limit_enforced() {
    let client = Client::new();
    let borrower_id = create_borrower(&client).await;

    for _ in 0..5 {
        let item_id = create_item(&client, 1).await;
        assert_eq!(borrow(&client, borrower_id, item_id).await.status(), 201);
    }

    let sixth = create_item(&client, 1).await;
    let response = borrow(&client, borrower_id, sixth).await;
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "MaxBorrowsReached");
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_of_last_copy() {
    let client = Client::new();
    let first = create_borrower(&client).await;
    let second = create_borrower(&client).await;
    let item_id = create_item(&client, 1).await;

    let (a, b) = tokio::join!(
        borrow(&client, first, item_id),
        borrow(&client, second, item_id)
    );

    let statuses = [a.status().as_u16(), b.status().as_u16()];
    assert!(
        statuses == [201, 409] || statuses == [409, 201],
        "expected exactly one winner, got {:?}",
        statuses
    );
    assert_eq!(available_copies(&client, item_id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_borrow_cancel_return_scenario() {
    // Item with 3 copies; two borrowers; cancel one loan, return the other.
    let client = Client::new();
    let u1 = create_borrower(&client).await;
    let u2 = create_borrower(&client).await;
    let item_id = create_item(&client, 3).await;

    let response = borrow(&client, u1, item_id).await;
    assert_eq!(response.status(), 201);
    let l1: Value = response.json().await.expect("Failed to parse loan");
    assert_eq!(available_copies(&client, item_id).await, 2);

    let response = borrow(&client, u2, item_id).await;
    assert_eq!(response.status(), 201);
    assert_eq!(available_copies(&client, item_id).await, 1);

    let response = client
        .put(format!("{}/loans/{}/cancel", BASE_URL, l1["id"].as_i64().unwrap()))
        .send()
        .await
        .expect("Failed to send cancel request");
    assert!(response.status().is_success());
    let cancelled: Value = response.json().await.expect("Failed to parse loan");
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(available_copies(&client, item_id).await, 2);

    let response = return_item(&client, u2, item_id).await;
    assert!(response.status().is_success());
    assert_eq!(available_copies(&client, item_id).await, 3);

    // no open loans remain on the item
    let response = client
        .get(format!("{}/borrowers/{}/loans/active", BASE_URL, u2))
        .send()
        .await
        .expect("Failed to send request");
    let open: Value = response.json().await.expect("Failed to parse loans");
    assert!(open
        .as_array()
        .unwrap()
        .iter()
        .all(|l| l["item_id"].as_i64() != Some(item_id)));
}

#[tokio::test]
#[ignore]
async fn test_cancel_terminal_loan_rejected() {
    let client = Client::new();
    let borrower_id = create_borrower(&client).await;
    let item_id = create_item(&client, 1).await;

    let response = borrow(&client, borrower_id, item_id).await;
    let loan: Value = response.json().await.expect("Failed to parse loan");
    let loan_id = loan["id"].as_i64().unwrap();

    assert!(return_item(&client, borrower_id, item_id)
        .await
        .status()
        .is_success());

    let response = client
        .put(format!("{}/loans/{}/cancel", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send cancel request");
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "BadTransition");
}

#[tokio::test]
#[ignore]
async fn test_extend_rejects_past_due_date() {
    let client = Client::new();
    let borrower_id = create_borrower(&client).await;
    let item_id = create_item(&client, 1).await;

    let response = borrow(&client, borrower_id, item_id).await;
    let loan: Value = response.json().await.expect("Failed to parse loan");
    let loan_id = loan["id"].as_i64().unwrap();

    let response = client
        .put(format!("{}/loans/{}/extend", BASE_URL, loan_id))
        .json(&json!({ "due_date": "2020-01-01T00:00:00Z" }))
        .send()
        .await
        .expect("Failed to send extend request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_overdue_predicate_and_marking() {
    let client = Client::new();
    let borrower_id = create_borrower(&client).await;
    let item_id = create_item(&client, 1).await;

    let response = borrow(&client, borrower_id, item_id).await;
    let loan: Value = response.json().await.expect("Failed to parse loan");
    let loan_id = loan["id"].as_i64().unwrap();

    // push the due date into the past via the administrative override
    let response = client
        .put(format!("{}/loans/{}", BASE_URL, loan_id))
        .json(&json!({ "due_date": "2020-01-01T00:00:00Z" }))
        .send()
        .await
        .expect("Failed to send update request");
    assert!(response.status().is_success());

    // counted overdue without mark_overdue ever having run
    let response = client
        .get(format!("{}/loans/overdue", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    let overdue: Value = response.json().await.expect("Failed to parse loans");
    assert!(overdue
        .as_array()
        .unwrap()
        .iter()
        .any(|l| l["id"].as_i64() == Some(loan_id)));

    // the informational label still accepts return afterwards
    let response = client
        .put(format!("{}/loans/{}/mark-overdue", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");
    let marked: Value = response.json().await.expect("Failed to parse loan");
    assert_eq!(marked["status"], "overdue");

    let response = return_item(&client, borrower_id, item_id).await;
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_delete_item_with_open_loan_rejected() {
    let client = Client::new();
    let borrower_id = create_borrower(&client).await;
    let item_id = create_item(&client, 1).await;

    assert_eq!(borrow(&client, borrower_id, item_id).await.status(), 201);

    let response = client
        .delete(format!("{}/items/{}", BASE_URL, item_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_set_inventory_validates_counts() {
    let client = Client::new();
    let item_id = create_item(&client, 2).await;

    let response = client
        .put(format!("{}/items/{}/inventory", BASE_URL, item_id))
        .json(&json!({ "total_copies": 2, "available_copies": 5 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "BadInventoryState");

    let response = client
        .put(format!("{}/items/{}/inventory", BASE_URL, item_id))
        .json(&json!({ "total_copies": 5, "available_copies": 4 }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    assert_eq!(available_copies(&client, item_id).await, 4);
}

#[tokio::test]
#[ignore]
async fn test_dashboard_shape() {
    let client = Client::new();

    let response = client
        .get(format!("{}/analytics/dashboard", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["borrowers"]["total"].is_number());
    assert!(body["items"]["total"].is_number());
    assert!(body["loans"]["active"].is_number());
    assert!(body["loans"]["daily_activity"].as_array().unwrap().len() == 7);
    assert!(body["inventory"]["utilization_rate"].is_number());
    assert_eq!(body["system_health"]["status"], "healthy");
}
