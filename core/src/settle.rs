//! One-shot settlement shared by the racers of a single request.
//!
//! The timer and the transport task each try to `claim` the settlement;
//! exactly one succeeds and receives the sender for the caller's outcome.
//! The other's result is dropped. Claims may come from different worker
//! threads.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;

use crate::error::NO_STATUS;

pub(crate) struct Settlement<T> {
    settled: AtomicBool,
    sender: Mutex<Option<oneshot::Sender<T>>>,
    status: AtomicI32,
}

impl<T> Settlement<T> {
    pub(crate) fn new() -> (Arc<Self>, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let settlement = Arc::new(Self {
            settled: AtomicBool::new(false),
            sender: Mutex::new(Some(tx)),
            status: AtomicI32::new(NO_STATUS),
        });
        (settlement, rx)
    }

    /// Flip the latch. Returns the sender only for the first caller.
    pub(crate) fn claim(&self) -> Option<oneshot::Sender<T>> {
        if self
            .settled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        self.sender.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    /// Record the status of a response as soon as it arrives.
    pub(crate) fn observe_status(&self, status: u16) {
        self.status.store(i32::from(status), Ordering::Release);
    }

    /// Last observed status, or `NO_STATUS`.
    pub(crate) fn status(&self) -> i32 {
        self.status.load(Ordering::Acquire)
    }
}
