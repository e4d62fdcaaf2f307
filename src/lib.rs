pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod reconcile;
pub mod schedule;
pub mod store;
pub mod summary;
pub mod tracker;

pub use error::{Error, Result};
