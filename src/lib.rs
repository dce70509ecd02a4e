pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
