#![allow(dead_code)]

use paydebit::application::debit::DebitService;
use paydebit::domain::account::USERS;
use paydebit::domain::ports::BalanceStore;
use paydebit::domain::transaction::RetryPolicy;
use paydebit::infrastructure::in_memory::InMemoryBalanceStore;
use paydebit::interfaces::http::{self, AppState};
use serde_json::{Value, json};
use std::sync::Arc;

/// An in-memory store holding one `users` record per `(id, balance)` pair.
pub async fn seeded_store(balances: &[(&str, Value)]) -> InMemoryBalanceStore {
    let store = InMemoryBalanceStore::new();
    for (id, balance) in balances {
        let document = json!({ "balance": balance }).as_object().cloned().unwrap();
        store.set(USERS, id, document).await.unwrap();
    }
    store
}

pub async fn balance_of(store: &InMemoryBalanceStore, id: &str) -> Value {
    store.get(USERS, id).await.unwrap().unwrap()["balance"].clone()
}

/// Bind to port 0 and return the endpoint URL.
pub async fn start_server(store: InMemoryBalanceStore, echo_invalid_payload: bool) -> String {
    let service = DebitService::new(Arc::new(store), RetryPolicy::default());
    let state = AppState::new(service, echo_invalid_payload);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        http::serve(listener, state, std::future::pending()).await.unwrap();
    });
    format!("http://{addr}{}", http::PAY_ROUTE)
}
