//! Internal implementation details.

pub(crate) mod init_stack;
pub(crate) mod master;
pub(crate) mod slot;

use std::any::Any;

pub(crate) use init_stack::InitStackGuard;
pub(crate) use master::MasterList;
pub(crate) use slot::{ErasedSlot, Slot};

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
