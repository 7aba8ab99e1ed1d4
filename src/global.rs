//! Process-wide registry.
//!
//! Most applications want exactly one registry. This module holds it and
//! forwards the usual accessors to it, so singletons can be reached without
//! threading a [`SingletonRegistry`] through every call.
//!
//! The global registry is built on first use with the default builder, which
//! makes the first calling thread the main thread. Call [`install`] early in
//! `main` to choose the config or dispatcher yourself.
//!
//! # Examples
//!
//! ```
//! use ferrous_lifecycle::{global, HookResult, Managed, Singleton, SingletonRegistry};
//!
//! struct Telemetry;
//! impl Managed for Telemetry {}
//! impl Singleton for Telemetry {
//!     fn construct(_: &SingletonRegistry) -> HookResult<Self> {
//!         Ok(Telemetry)
//!     }
//! }
//!
//! global::get::<Telemetry>().unwrap();
//! assert!(global::exists::<Telemetry>());
//! global::delete_all();
//! ```

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::SingletonResult;
use crate::registry::SingletonRegistry;
use crate::traits::{LockedSingleton, Managed, ParamSingleton, Singleton};

static GLOBAL: OnceCell<SingletonRegistry> = OnceCell::new();

/// Make `registry` the global registry.
///
/// Fails, handing `registry` back, once a global registry exists.
pub fn install(registry: SingletonRegistry) -> Result<(), SingletonRegistry> {
    GLOBAL.set(registry)
}

/// The global registry, built with defaults on first use.
pub fn registry() -> &'static SingletonRegistry {
    GLOBAL.get_or_init(SingletonRegistry::new)
}

pub fn is_installed() -> bool {
    GLOBAL.get().is_some()
}

/// See [`SingletonRegistry::get`].
pub fn get<T: Singleton>() -> SingletonResult<Arc<T>> {
    registry().get::<T>()
}

/// See [`SingletonRegistry::get_required`].
pub fn get_required<T: Singleton>() -> Arc<T> {
    registry().get_required::<T>()
}

/// See [`SingletonRegistry::instance`].
pub fn instance<T: ParamSingleton>() -> SingletonResult<Arc<T>> {
    registry().instance::<T>()
}

/// See [`SingletonRegistry::init_with`].
pub fn init_with<T: ParamSingleton>(args: T::Args) -> SingletonResult<Arc<T>> {
    registry().init_with::<T>(args)
}

/// See [`SingletonRegistry::init`].
pub fn init<T: LockedSingleton>() -> SingletonResult<Arc<T>> {
    registry().init::<T>()
}

pub fn exists<T: Managed>() -> bool {
    registry().exists::<T>()
}

pub fn was_deleted<T: Managed>() -> bool {
    registry().was_deleted::<T>()
}

pub fn delete<T: Managed>() {
    registry().delete::<T>()
}

pub fn cleanup_all() {
    registry().cleanup_all()
}

pub fn delete_all() {
    registry().delete_all()
}
