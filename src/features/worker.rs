//! Single-threaded FIFO load worker.
//!
//! All archive loads scheduled by one provider run on one thread, so at
//! most one decompress-and-parse is ever in flight. Tasks hand back a
//! [`TaskHandle`] supporting a bounded wait; shutting the worker down
//! cancels queued tasks and interrupts the in-flight one through a shared
//! flag its work closure is expected to poll.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::Error;

/// Why a task produced no value.
#[derive(Debug, Clone)]
pub(crate) enum TaskError {
    /// The worker was shut down before or while the task ran.
    Cancelled,
    /// The task itself failed; the error is shared between all waiters.
    Failed(Arc<Error>),
}

/// Why a bounded wait produced no value.
#[derive(Debug, Clone)]
pub(crate) enum WaitError {
    Timeout,
    Cancelled,
    Failed(Arc<Error>),
}

enum State<T> {
    Pending,
    Done(Result<Arc<T>, TaskError>),
}

struct Shared<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> Shared<T> {
    fn complete(&self, outcome: Result<Arc<T>, TaskError>) {
        let mut state = self.state.lock().expect("task state poisoned");
        if matches!(*state, State::Pending) {
            *state = State::Done(outcome);
            self.ready.notify_all();
        }
    }
}

/// Handle to a task's eventual result. The result (success or failure) is
/// computed once and shared by every waiter.
pub(crate) struct TaskHandle<T> {
    shared: Arc<Shared<T>>,
}

impl<T> TaskHandle<T> {
    fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Pending),
                ready: Condvar::new(),
            }),
        }
    }

    /// Waits for the task to settle, up to `timeout`. Never blocks past
    /// the deadline.
    pub fn wait(&self, timeout: Duration) -> Result<Arc<T>, WaitError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock().expect("task state poisoned");
        loop {
            if let State::Done(outcome) = &*state {
                return outcome.clone().map_err(|e| match e {
                    TaskError::Cancelled => WaitError::Cancelled,
                    TaskError::Failed(err) => WaitError::Failed(err),
                });
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(WaitError::Timeout);
            }
            let (guard, _) = self
                .shared
                .ready
                .wait_timeout(state, deadline - now)
                .expect("task state poisoned");
            state = guard;
        }
    }
}

/// A queued unit of work. If the job is dropped without running (worker
/// shut down, channel torn down) its handle settles as cancelled.
struct Job {
    run: Option<Box<dyn FnOnce(&AtomicBool) + Send>>,
    abort: Option<Box<dyn FnOnce() + Send>>,
}

impl Job {
    fn run(mut self, cancel: &AtomicBool) {
        self.abort = None;
        if let Some(run) = self.run.take() {
            run(cancel);
        }
    }
}

impl Drop for Job {
    fn drop(&mut self) {
        if let Some(abort) = self.abort.take() {
            abort();
        }
    }
}

pub(crate) struct Worker {
    tx: Mutex<Option<mpsc::Sender<Job>>>,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
    cancel: Arc<AtomicBool>,
}

impl Worker {
    /// Spawns the worker thread.
    pub fn new(name: &str) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    if flag.load(Ordering::Acquire) {
                        // Drained after shutdown; the drop marks it cancelled.
                        drop(job);
                        continue;
                    }
                    job.run(&flag);
                }
            })?;
        Ok(Self {
            tx: Mutex::new(Some(tx)),
            thread: Mutex::new(Some(thread)),
            cancel,
        })
    }

    /// Enqueues `work` and returns a handle to its eventual result.
    ///
    /// The closure receives the worker's shutdown flag and should poll it
    /// at safe points so cancellation is timely. A task whose closure
    /// fails after the flag was raised settles as cancelled, not failed.
    pub fn submit<T, F>(&self, work: F) -> TaskHandle<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce(&AtomicBool) -> Result<T, Error> + Send + 'static,
    {
        let handle = TaskHandle::new();
        let shared = Arc::clone(&handle.shared);
        let aborted = Arc::clone(&handle.shared);
        let job = Job {
            run: Some(Box::new(move |cancel: &AtomicBool| {
                let outcome = match work(cancel) {
                    Ok(value) => Ok(Arc::new(value)),
                    Err(_) if cancel.load(Ordering::Acquire) => Err(TaskError::Cancelled),
                    Err(err) => Err(TaskError::Failed(Arc::new(err))),
                };
                shared.complete(outcome);
            })),
            abort: Some(Box::new(move || {
                aborted.complete(Err(TaskError::Cancelled));
            })),
        };

        let tx = self.tx.lock().expect("worker sender poisoned");
        match tx.as_ref() {
            // A send failure means the thread is gone; dropping the job
            // settles the handle as cancelled.
            Some(tx) => drop(tx.send(job)),
            None => drop(job),
        }
        handle
    }

    /// Stops the worker: raises the shutdown flag, closes the queue, and
    /// joins the thread. Queued tasks settle as cancelled; the in-flight
    /// task is interrupted at its next flag check. Idempotent.
    pub fn shutdown(&self) {
        self.cancel.store(true, Ordering::Release);
        if let Some(tx) = self.tx.lock().expect("worker sender poisoned").take() {
            drop(tx);
        }
        if let Some(thread) = self.thread.lock().expect("worker thread poisoned").take() {
            debug!("shutting down load worker");
            if thread.join().is_err() {
                debug!("load worker panicked before shutdown");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    fn worker() -> Worker {
        Worker::new("test-worker").unwrap()
    }

    #[test]
    fn runs_tasks_in_order() {
        let w = worker();
        let (tx, rx) = channel();
        for i in 0..4 {
            let tx = tx.clone();
            w.submit(move |_| {
                tx.send(i).unwrap();
                Ok(i)
            });
        }
        let order: Vec<i32> = (0..4).map(|_| rx.recv().unwrap()).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn propagates_results_and_failures() {
        let w = worker();
        let ok = w.submit(|_| Ok(41 + 1));
        let err = w.submit::<u32, _>(|_| Err(Error::ProviderDisposed));

        assert_eq!(*ok.wait(Duration::from_secs(5)).unwrap(), 42);
        match err.wait(Duration::from_secs(5)) {
            Err(WaitError::Failed(e)) => assert!(matches!(*e, Error::ProviderDisposed)),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn failure_is_cached_for_repeat_waits() {
        let w = worker();
        let handle = w.submit::<u32, _>(|_| Err(Error::ProviderDisposed));
        assert!(matches!(
            handle.wait(Duration::from_secs(5)),
            Err(WaitError::Failed(_))
        ));
        assert!(matches!(
            handle.wait(Duration::from_millis(1)),
            Err(WaitError::Failed(_))
        ));
    }

    #[test]
    fn bounded_wait_times_out() {
        let w = worker();
        let (_block_tx, block_rx) = channel::<()>();
        let handle = w.submit(move |_| {
            // Hold the worker until the test ends.
            let _ = block_rx.recv();
            Ok(0u32)
        });
        assert!(matches!(
            handle.wait(Duration::from_millis(50)),
            Err(WaitError::Timeout)
        ));
    }

    #[test]
    fn shutdown_cancels_queued_and_in_flight_tasks() {
        let w = worker();
        let (started_tx, started_rx) = channel();

        // Occupies the worker until the shutdown flag is raised, the way a
        // load polls for interruption between reads.
        let in_flight = w.submit::<u32, _>(move |cancel: &AtomicBool| {
            started_tx.send(()).unwrap();
            while !cancel.load(Ordering::Acquire) {
                thread::sleep(Duration::from_millis(1));
            }
            Err(Error::ProviderDisposed)
        });
        let queued = w.submit(|_| Ok(2u32));

        started_rx.recv().unwrap();
        w.shutdown();

        assert!(matches!(
            in_flight.wait(Duration::from_secs(5)),
            Err(WaitError::Cancelled)
        ));
        assert!(matches!(
            queued.wait(Duration::from_secs(5)),
            Err(WaitError::Cancelled)
        ));
    }

    #[test]
    fn submit_after_shutdown_is_cancelled() {
        let w = worker();
        w.shutdown();
        let handle = w.submit(|_| Ok(7u32));
        assert!(matches!(
            handle.wait(Duration::from_secs(5)),
            Err(WaitError::Cancelled)
        ));
    }
}
