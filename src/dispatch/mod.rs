//! Main-thread affinity for singleton construction.
//!
//! Every first-time construction runs on one designated thread. A request
//! coming from any other thread is handed to that thread through a
//! [`MainThreadDispatch`] and the requester blocks until it completes. Since
//! no two threads ever hold two "under construction" slots at once, mutually
//! dependent singletons requested from different threads cannot deadlock.

mod queue;

pub use queue::MainThreadQueue;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{SingletonError, SingletonResult};

/// A unit of work sent to the main thread.
pub type MainThreadJob = Box<dyn FnOnce() + Send + 'static>;

/// Runs callables on the designated main thread.
///
/// Implementations must run the job inline when `run_blocking` is called on
/// the main thread itself, and otherwise block the caller (without spinning)
/// until the main thread has run the job. A dispatcher that has to give up
/// on a job may drop it unrun; the registry reports that to the requester as
/// [`SingletonError::DispatchFailed`].
///
/// # Examples
///
/// ```
/// use ferrous_lifecycle::dispatch::{MainThreadDispatch, MainThreadJob};
/// use std::thread::{self, ThreadId};
///
/// /// Treats one fixed thread as main and refuses everything else.
/// struct MainOnly(ThreadId);
///
/// impl MainThreadDispatch for MainOnly {
///     fn is_main_thread(&self) -> bool {
///         thread::current().id() == self.0
///     }
///
///     fn run_blocking(&self, job: MainThreadJob) {
///         if self.is_main_thread() {
///             job();
///         }
///     }
/// }
///
/// let dispatch = MainOnly(thread::current().id());
/// assert!(dispatch.is_main_thread());
/// ```
pub trait MainThreadDispatch: Send + Sync + 'static {
    /// Whether the calling thread is the main thread.
    fn is_main_thread(&self) -> bool;

    /// Run `job` on the main thread and return once it has finished.
    fn run_blocking(&self, job: MainThreadJob);
}

/// Run `f` on the main thread and hand its result back to the caller.
///
/// A panic inside `f` is resumed on the calling thread. `name` identifies
/// the singleton in the error returned when the dispatcher drops the job.
pub fn call_on_main<R, F>(dispatch: &dyn MainThreadDispatch, name: &'static str, f: F) -> SingletonResult<R>
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    if dispatch.is_main_thread() {
        return Ok(f());
    }

    let outcome: Arc<Mutex<Option<std::thread::Result<R>>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&outcome);
    dispatch.run_blocking(Box::new(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(f));
        *sink.lock() = Some(result);
    }));

    let result = outcome.lock().take();
    match result {
        Some(Ok(value)) => Ok(value),
        Some(Err(payload)) => panic::resume_unwind(payload),
        None => Err(SingletonError::DispatchFailed(name)),
    }
}
