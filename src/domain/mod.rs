//! Domain types and the store contract they are persisted through.

pub mod account;
pub mod ports;
pub mod request;
pub mod transaction;
