pub mod app;
pub mod config;
pub mod cors;
pub mod models;
pub mod store;
pub mod validation;
