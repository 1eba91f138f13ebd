pub mod api;
pub mod config;
pub mod error;
pub mod indicators;
pub mod models;
pub mod server;
pub mod signals;
pub mod store;
pub mod workers;
