//! Database models and query functions.

pub mod connections;
pub mod kv;
pub mod models;
pub mod users;
