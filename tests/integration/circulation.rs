//! Engine-level concurrency tests against the in-memory store

use std::sync::Arc;

use circulation_server::{
    config::LoansConfig,
    models::{Book, Borrower, NewBook, NewBorrower},
    repository::MemoryStore,
    services::Services,
    AppError,
};

fn services(store: &MemoryStore) -> Services {
    Services::new(Arc::new(store.clone()), LoansConfig::default())
}

async fn book(services: &Services, isbn: &str) -> Book {
    services
        .catalog
        .register_book(NewBook {
            isbn: isbn.to_string(),
            title: "Concurrent Book".to_string(),
            author: "Concurrent Author".to_string(),
        })
        .await
        .unwrap()
}

async fn borrowers(services: &Services, count: usize) -> Vec<Borrower> {
    let mut created = Vec::with_capacity(count);
    for i in 0..count {
        created.push(
            services
                .borrowers
                .register_borrower(NewBorrower {
                    name: format!("Borrower {i}"),
                    email: format!("borrower{i}@example.com"),
                })
                .await
                .unwrap(),
        );
    }
    created
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_fifty_concurrent_borrowers_one_winner() {
    let store = MemoryStore::new();
    let services = services(&store);
    let book = book(&services, "978-0-00-000000-1").await;
    let borrowers = borrowers(&services, 50).await;

    let mut handles = Vec::new();
    for borrower in borrowers {
        let services = services.clone();
        let book_id = book.id;
        handles.push(tokio::spawn(async move {
            services.loans.borrow_book(book_id, borrower.id).await
        }));
    }

    let mut loans = Vec::new();
    let mut already_borrowed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(loan) => loans.push(loan),
            Err(AppError::BookAlreadyBorrowed(_)) => already_borrowed += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(loans.len(), 1);
    assert_eq!(already_borrowed, 49);

    let history = store.loans_for_book(book.id);
    assert_eq!(history, loans);

    let listed = services.catalog.list_books().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].borrowed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_different_books_are_lent_in_parallel() {
    let store = MemoryStore::new();
    let services = services(&store);
    let borrowers = borrowers(&services, 20).await;

    let mut books = Vec::new();
    for i in 0..20 {
        books.push(book(&services, &format!("isbn-{i}")).await);
    }

    let mut handles = Vec::new();
    for (book, borrower) in books.iter().zip(&borrowers) {
        let services = services.clone();
        let (book_id, borrower_id) = (book.id, borrower.id);
        handles.push(tokio::spawn(async move {
            services.loans.borrow_book(book_id, borrower_id).await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_active());
    }

    let inventory = services.catalog.book_inventory().await.unwrap();
    assert_eq!(inventory.len(), 20);
    assert!(inventory.iter().all(|entry| entry.available_copies == 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_borrow_and_return_race_keeps_state_consistent() {
    let store = MemoryStore::new();
    let services = services(&store);
    let book = book(&services, "978-0-00-000000-2").await;
    let borrowers = borrowers(&services, 10).await;

    let mut handles = Vec::new();
    for borrower in borrowers {
        let services = services.clone();
        let book_id = book.id;
        handles.push(tokio::spawn(async move {
            for _ in 0..5 {
                if services.loans.borrow_book(book_id, borrower.id).await.is_ok() {
                    services.loans.return_book(book_id).await.unwrap();
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let history = store.loans_for_book(book.id);
    assert!(!history.is_empty());
    assert!(history.iter().all(|loan| loan.returned_at.is_some()));
    assert!(!services.catalog.list_books().await.unwrap()[0].borrowed);
}

#[tokio::test]
async fn test_copies_of_one_isbn_are_lent_independently() {
    let store = MemoryStore::new();
    let services = services(&store);
    let first = book(&services, "978-0-00-000000-3").await;
    let second = book(&services, "978-0-00-000000-3").await;
    let borrowers = borrowers(&services, 2).await;

    services.loans.borrow_book(first.id, borrowers[0].id).await.unwrap();
    services.loans.borrow_book(second.id, borrowers[1].id).await.unwrap();

    let inventory = services.catalog.book_inventory().await.unwrap();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].number_of_copies, 2);
    assert_eq!(inventory[0].available_copies, 0);

    services.loans.return_book(first.id).await.unwrap();
    let inventory = services.catalog.book_inventory().await.unwrap();
    assert_eq!(inventory[0].available_copies, 1);
}
