pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
pub mod matching;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod utils;
pub mod web;
