//! Stockroom: desktop administration client for a product catalog
//!
//! The GUI is in [`app`]; everything below it (backend client, read cache,
//! mutations, routes, forms) is plain async Rust usable without a window.

pub mod app;
pub mod backend;
pub mod config;
pub mod debounce;
pub mod forms;
pub mod notify;
pub mod pages;
pub mod query;
pub mod routes;
pub mod table;
pub mod ui;
pub mod upload;
