//! Application layer containing the debit orchestration.
//!
//! This module defines the `DebitService` which runs the conditional balance
//! debit inside a store transaction. It owns no state besides the shared store
//! handle, so one instance serves every request concurrently.

pub mod debit;
