//! YBA State Management
//!
//! Records the YBA objects the `yba` tool manages: their remote UUIDs and
//! last observed attributes. State lives in a local JSON file guarded by a
//! lock file so two runs cannot modify it at once.
//!
//! ```ignore
//! use yba_state::{LocalBackend, StateBackend, StateFile};
//!
//! let backend = LocalBackend::new();
//! let lock = backend.acquire_lock("apply").await?;
//! let mut state = backend.read_state().await?.unwrap_or_default();
//! // ... record applied resources ...
//! state.increment_serial();
//! backend.write_state(&state).await?;
//! backend.release_lock(&lock).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

pub use backend::{BackendError, BackendResult, StateBackend};
pub use backends::LocalBackend;
pub use lock::LockInfo;
pub use state::{ResourceState, StateFile};
