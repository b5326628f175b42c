// Declare all modules
pub mod auth;
pub mod chat;
pub mod client;
pub mod config;
pub mod face;
pub mod utils;

// No re-exports here as they're handled in lib.rs
