//! Web API module for the kindred application.

pub mod admin;
pub mod analysis;
pub mod error;
pub mod matches;
pub mod routes;
pub mod status;

pub use routes::build_router;
