//! Job queue pumped by the main thread.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::{MainThreadDispatch, MainThreadJob};

/// Completion signal shared between a requester and the main thread.
#[derive(Default)]
struct Completion {
    done: Mutex<bool>,
    signal: Condvar,
}

impl Completion {
    fn finish(&self) {
        *self.done.lock() = true;
        self.signal.notify_all();
    }

    fn wait(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.signal.wait(&mut done);
        }
    }
}

struct Pending {
    job: MainThreadJob,
    completion: Arc<Completion>,
}

impl Pending {
    fn run(self) {
        // the requester is released even if the job unwinds
        let _finish = FinishOnDrop(self.completion);
        (self.job)();
    }
}

struct FinishOnDrop(Arc<Completion>);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.0.finish();
    }
}

#[derive(Default)]
struct QueueState {
    jobs: VecDeque<Pending>,
    closed: bool,
}

/// Stock [`MainThreadDispatch`]: a job queue drained by the main thread.
///
/// The thread that creates the queue is the main thread. Other threads
/// calling [`run_blocking`](MainThreadDispatch::run_blocking) enqueue their
/// job and park until the main thread runs it from [`run_pending`],
/// [`wait_and_run`] or [`pump_until`]. The main thread must keep pumping
/// while other threads may request construction; a stalled main thread
/// stalls every pending first-use request.
///
/// [`run_pending`]: MainThreadQueue::run_pending
/// [`wait_and_run`]: MainThreadQueue::wait_and_run
/// [`pump_until`]: MainThreadQueue::pump_until
///
/// # Examples
///
/// ```
/// use ferrous_lifecycle::dispatch::{MainThreadDispatch, MainThreadQueue};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::thread;
///
/// let queue = Arc::new(MainThreadQueue::new());
/// let finished = Arc::new(AtomicBool::new(false));
///
/// let worker = {
///     let queue = Arc::clone(&queue);
///     let finished = Arc::clone(&finished);
///     thread::spawn(move || {
///         queue.run_blocking(Box::new(|| println!("on the main thread")));
///         finished.store(true, Ordering::SeqCst);
///     })
/// };
///
/// queue.pump_until(|| finished.load(Ordering::SeqCst));
/// worker.join().unwrap();
/// ```
pub struct MainThreadQueue {
    main: ThreadId,
    state: Mutex<QueueState>,
    job_ready: Condvar,
}

impl MainThreadQueue {
    /// Create a queue whose main thread is the calling thread.
    pub fn new() -> Self {
        Self::for_thread(thread::current().id())
    }

    /// Create a queue for an explicitly chosen main thread.
    pub fn for_thread(main: ThreadId) -> Self {
        Self {
            main,
            state: Mutex::new(QueueState::default()),
            job_ready: Condvar::new(),
        }
    }

    pub fn main_thread(&self) -> ThreadId {
        self.main
    }

    /// Number of requests waiting for the main thread.
    pub fn pending(&self) -> usize {
        self.state.lock().jobs.len()
    }

    /// Run every queued job. Returns how many ran.
    ///
    /// Does nothing when called off the main thread.
    pub fn run_pending(&self) -> usize {
        if !self.is_main_thread() {
            debug_assert!(false, "MainThreadQueue pumped off the main thread");
            return 0;
        }
        let mut ran = 0;
        // Jobs run with the queue unlocked; they may enqueue further work.
        while let Some(pending) = self.next_job() {
            pending.run();
            ran += 1;
        }
        ran
    }

    /// Wait up to `timeout` for work to arrive, then run everything queued.
    pub fn wait_and_run(&self, timeout: Duration) -> usize {
        {
            let deadline = Instant::now() + timeout;
            let mut state = self.state.lock();
            while state.jobs.is_empty() && !state.closed {
                if self.job_ready.wait_until(&mut state, deadline).timed_out() {
                    break;
                }
            }
        }
        self.run_pending()
    }

    /// Keep serving requests until `done` returns true.
    pub fn pump_until(&self, mut done: impl FnMut() -> bool) {
        while !done() {
            self.wait_and_run(Duration::from_millis(5));
        }
        self.run_pending();
    }

    /// Refuse new requests and release every waiting requester unrun.
    pub fn close(&self) {
        let drained: Vec<Pending> = {
            let mut state = self.state.lock();
            state.closed = true;
            state.jobs.drain(..).collect()
        };
        self.job_ready.notify_all();
        for pending in drained {
            pending.completion.finish();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn next_job(&self) -> Option<Pending> {
        self.state.lock().jobs.pop_front()
    }
}

impl Default for MainThreadQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MainThreadDispatch for MainThreadQueue {
    fn is_main_thread(&self) -> bool {
        thread::current().id() == self.main
    }

    fn run_blocking(&self, job: MainThreadJob) {
        if self.is_main_thread() {
            job();
            return;
        }

        let completion = Arc::new(Completion::default());
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.jobs.push_back(Pending {
                job,
                completion: Arc::clone(&completion),
            });
        }
        self.job_ready.notify_one();
        completion.wait();
    }
}
