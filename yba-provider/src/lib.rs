//! YugabyteDB Anywhere Provider
//!
//! Manages cloud and on-prem providers, universes, node instances, users,
//! backup schedules and restores through the YBA REST API. Mutating calls
//! return a task that is polled to completion before an operation returns.

pub mod api;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod provider;
pub mod resources;
pub mod schemas;
pub mod tasks;
pub mod version;

#[cfg(test)]
mod testing;

pub use client::YbaClient;
pub use config::ProviderConfig;
pub use provider::YbaProvider;
