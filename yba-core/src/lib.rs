//! YBA Core
//!
//! Core library for managing YugabyteDB Anywhere objects declaratively:
//! resource model, schemas, planning, task polling and list reconciliation.

pub mod differ;
pub mod effect;
pub mod interpreter;
pub mod plan;
pub mod provider;
pub mod reconcile;
pub mod resource;
pub mod schema;
pub mod task;
pub mod timeouts;
