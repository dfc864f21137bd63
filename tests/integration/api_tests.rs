//! Live API tests against a running server

use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Register a copy with a fresh ISBN and return its id
async fn create_book(client: &Client) -> String {
    let response = client
        .post(format!("{}/library/books", BASE_URL))
        .json(&json!({
            "isbn": format!("live-{}", Uuid::new_v4()),
            "title": "Live Book",
            "author": "Live Author"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_str().expect("No id in response").to_string()
}

async fn create_borrower(client: &Client) -> String {
    let response = client
        .post(format!("{}/library/borrowers", BASE_URL))
        .json(&json!({
            "name": "Live Borrower",
            "email": format!("{}@example.com", Uuid::new_v4())
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_str().expect("No id in response").to_string()
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
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return() {
    let client = Client::new();
    let book_id = create_book(&client).await;
    let borrower_id = create_borrower(&client).await;

    let response = client
        .post(format!("{}/library/books/{}/borrow/{}", BASE_URL, book_id, borrower_id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/library/books/{}/borrow/{}", BASE_URL, book_id, borrower_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let response = client
        .post(format!("{}/library/books/{}/return", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["returned_at"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_against_server() {
    let client = Client::new();
    let book_id = create_book(&client).await;

    let mut borrower_ids = Vec::new();
    for _ in 0..10 {
        borrower_ids.push(create_borrower(&client).await);
    }

    let mut handles = Vec::new();
    for borrower_id in borrower_ids {
        let client = client.clone();
        let url = format!("{}/library/books/{}/borrow/{}", BASE_URL, book_id, borrower_id);
        handles.push(tokio::spawn(async move {
            client.post(url).send().await.expect("Failed to send request").status()
        }));
    }

    let mut ok = 0;
    for handle in handles {
        let status = handle.await.unwrap();
        if status.is_success() {
            ok += 1;
        } else {
            assert_eq!(status, 409);
        }
    }
    assert_eq!(ok, 1);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_borrower_email() {
    let client = Client::new();
    let email = format!("{}@example.com", Uuid::new_v4());

    for expected in [201, 409] {
        let response = client
            .post(format!("{}/library/borrowers", BASE_URL))
            .json(&json!({ "name": "Live Borrower", "email": email }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), expected);
    }
}
