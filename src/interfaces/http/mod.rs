//! HTTP transport: exposes the debit endpoint over axum.
//!
//! ## Routes
//!
//! - `POST /api/pay`: debit `amount` from the user named by `userId` (or `uid`).
//! - `OPTIONS /api/pay`: CORS preflight, empty `200`.
//! - any other method on `/api/pay`: `405 { "error": ... }`.
//!
//! Every response allows cross-origin calls from any origin.

pub mod handler;
pub mod response;

use axum::Router;
use axum::middleware;
use axum::routing::any;
use std::future::Future;
use tokio::net::TcpListener;

pub use handler::AppState;

pub const PAY_ROUTE: &str = "/api/pay";

/// Build an axum `Router` serving the debit endpoint.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(PAY_ROUTE, any(handler::pay))
        .layer(middleware::map_response(handler::cors))
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
