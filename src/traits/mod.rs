//! Payload traits implemented by singleton types.

mod lifecycle;

pub use lifecycle::{Managed, Singleton, ParamSingleton, LockedSingleton};
