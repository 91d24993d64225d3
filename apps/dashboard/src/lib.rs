pub mod api_client;
pub mod auth;
pub mod config;
pub mod errors;
pub mod layout;
pub mod models;
pub mod render;
pub mod services;
pub mod state;
