//! Observable update status with filtered subscriptions

use std::sync::{Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::version::types::UpdateStatus;

const TRANSITIONS_CAPACITY: usize = 16;

/// Holds the current [`UpdateStatus`] and broadcasts every distinct
/// transition in publication order.
///
/// Subscription tasks run on `runtime` and end once `cancel` fires, so
/// subscribing works from threads outside the runtime.
pub struct StatusPublisher {
    current: watch::Sender<UpdateStatus>,
    transitions: broadcast::Sender<UpdateStatus>,
    // publication and subscription must not interleave
    publish_lock: Mutex<()>,
    runtime: Handle,
    cancel: CancellationToken,
}

impl StatusPublisher {
    pub fn new(runtime: Handle, cancel: CancellationToken) -> Self {
        let (current, _) = watch::channel(UpdateStatus::Empty);
        let (transitions, _) = broadcast::channel(TRANSITIONS_CAPACITY);
        Self {
            current,
            transitions,
            publish_lock: Mutex::new(()),
            runtime,
            cancel,
        }
    }

    pub fn current(&self) -> UpdateStatus {
        *self.current.borrow()
    }

    /// Set the status. Returns false if it already had this value.
    pub fn publish(&self, status: UpdateStatus) -> bool {
        let _lock = self.publish_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let changed = self.current.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
        if changed {
            // no receivers is fine
            let _ = self.transitions.send(status);
        }
        changed
    }

    /// Deliver the current status if it matches `filter`, then every later
    /// matching transition exactly once, in order.
    ///
    /// Delivery stops when the returned subscription is dropped or
    /// unsubscribed, or when the publisher is cancelled.
    pub fn subscribe<F, C>(&self, filter: F, mut callback: C) -> StatusSubscription
    where
        F: Fn(UpdateStatus) -> bool + Send + 'static,
        C: FnMut(UpdateStatus) + Send + 'static,
    {
        let (initial, mut receiver) = {
            let _lock = self.publish_lock.lock().unwrap_or_else(PoisonError::into_inner);
            (self.current(), self.transitions.subscribe())
        };

        let cancel = self.cancel.clone();
        let handle = self.runtime.spawn(async move {
            let mut last_seen = initial;
            if filter(initial) {
                callback(initial);
            }
            loop {
                let received = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    received = receiver.recv() => received,
                };
                match received {
                    Ok(status) => {
                        if status == last_seen {
                            continue;
                        }
                        last_seen = status;
                        if filter(status) {
                            callback(status);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Status subscriber lagged, {} transitions skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Status publisher closed");
                        break;
                    }
                }
            }
        });
        StatusSubscription { handle }
    }
}

/// Live subscription of [`StatusPublisher::subscribe`]
pub struct StatusSubscription {
    handle: JoinHandle<()>,
}

impl StatusSubscription {
    pub fn unsubscribe(self) {
        // Drop aborts the delivery task
    }
}

impl Drop for StatusSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
