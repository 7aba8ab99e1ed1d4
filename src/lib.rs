//! # ferrous-lifecycle
//!
//! Lazily constructed, dependency-tracked singletons with deterministic teardown.
//!
//! ## Features
//!
//! - **Lazy construction**: each singleton type is built on first access, exactly once
//! - **Dependency capture**: whatever a singleton touches while it is being built becomes its dependency
//! - **Ordered teardown**: dependents are torn down strictly before their dependencies
//! - **Main-thread affinity**: construction always happens on the main thread, wherever it was requested
//! - **Two-phase init**: `on_constructed` may reach back to singletons that depend on this one
//! - **Reentrancy detection**: a singleton requesting itself from its own constructor is an error, not a deadlock
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_lifecycle::{HookResult, Managed, Singleton, SingletonRegistry};
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! impl Managed for Database {
//!     fn on_teardown(&self, _: &SingletonRegistry) -> HookResult {
//!         println!("closing {}", self.url);
//!         Ok(())
//!     }
//! }
//!
//! impl Singleton for Database {
//!     fn construct(_: &SingletonRegistry) -> HookResult<Self> {
//!         Ok(Database { url: "postgres://localhost".to_string() })
//!     }
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl Managed for UserService {}
//!
//! impl Singleton for UserService {
//!     fn construct(registry: &SingletonRegistry) -> HookResult<Self> {
//!         Ok(UserService { db: registry.get::<Database>()? })
//!     }
//! }
//!
//! let registry = SingletonRegistry::new();
//! let users = registry.get_required::<UserService>();
//! assert_eq!(users.db.url, "postgres://localhost");
//!
//! // UserService goes first, then Database
//! let order = registry.teardown_order();
//! assert!(order[0].ends_with("UserService"));
//! assert!(order[1].ends_with("Database"));
//! registry.delete_all();
//! ```
//!
//! ## Singleton Kinds
//!
//! - **[`Singleton`]**: built from nothing on first [`get`](SingletonRegistry::get);
//!   rebuilt (with a warning) if accessed after deletion
//! - **[`ParamSingleton`]**: built from arguments by an explicit
//!   [`init_with`](SingletonRegistry::init_with); accessing it earlier or after
//!   deletion is an error
//! - **[`LockedSingleton`]**: a param singleton without arguments
//!
//! ## Threads
//!
//! The thread that builds the registry is its main thread. When another
//! thread needs a singleton that does not exist yet, the request is handed
//! to the main thread through a [`MainThreadDispatch`] and the caller blocks.
//! With the stock [`MainThreadQueue`], the main thread serves requests from
//! [`run_pending`](MainThreadQueue::run_pending) or
//! [`pump_until`](MainThreadQueue::pump_until).

// Module declarations
pub mod config;
pub mod dispatch;
pub mod error;
pub mod global;
pub mod graph_export;
pub mod key;
pub mod observer;
pub mod ordering;
pub mod registry;
pub mod state;
pub mod traits;

// Internal modules
mod internal;

// Re-export core types
pub use config::RegistryConfig;
pub use dispatch::{MainThreadDispatch, MainThreadJob, MainThreadQueue};
pub use error::{HookError, HookResult, SingletonError, SingletonResult};
pub use graph_export::{
    DefaultGraphExporter, DependencyGraph, ExportFormat, GraphEdge, GraphExporter, GraphMetadata, GraphNode,
};
pub use key::{key_of, Key};
pub use observer::{LoggingObserver, RegistryObserver};
pub use ordering::TeardownPlan;
pub use registry::{RegistryBuilder, SingletonRegistry};
pub use state::{InitState, SingletonKind};
pub use traits::{LockedSingleton, Managed, ParamSingleton, Singleton};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn public_handles_are_thread_safe() {
        assert_send_sync::<SingletonRegistry>();
        assert_send_sync::<MainThreadQueue>();
        assert_send_sync::<SingletonError>();
        assert_send_sync::<LoggingObserver>();
    }
}
