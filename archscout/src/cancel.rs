use crossbeam::channel::{self, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Cooperative cancellation signal shared between a caller and a running search.
///
/// Clones observe the same signal. Cancelling is idempotent and cannot be undone. Besides
/// polling [`is_cancelled`](Self::is_cancelled), blocking code can wait on [`done`](Self::done)
/// inside a `crossbeam::select!`: the channel never carries a message and disconnects on
/// cancellation.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (trigger, done) = channel::bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                done,
            }),
        }
    }

    /// Creates a token that cancels itself once `timeout` has elapsed.
    ///
    /// The deadline thread only holds a weak handle. Once every clone of the token is dropped,
    /// [`done`](Self::done) disconnects and the thread exits without waiting out the deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        let token = Self::new();
        let watcher: Weak<Inner> = Arc::downgrade(&token.inner);
        let done = token.inner.done.clone();
        thread::spawn(move || {
            let deadline = channel::after(timeout);
            crossbeam::select! {
                recv(deadline) -> _ => {
                    if let Some(inner) = watcher.upgrade() {
                        debug!(?timeout, "search deadline reached");
                        CancellationToken { inner }.cancel();
                    }
                }
                recv(done) -> _ => {}
            }
        });
        token
    }

    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            let sender = match self.inner.trigger.lock() {
                Ok(mut guard) => guard.take(),
                Err(poisoned) => poisoned.into_inner().take(),
            };
            drop(sender);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Channel that becomes ready (disconnected) once the token is cancelled
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
