//! Cancellation and error context shared by pipeline stages.

use crate::error::Error;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// One-shot cancellation signal.
///
/// [`CancelToken::done`] yields a receiver that becomes ready, by
/// disconnecting, once the token is cancelled. It can sit in any
/// `select!` next to the data channels of a stage.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

struct CancelInner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (trigger, done) = bounded(0);
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                done,
            }),
        }
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// What every stage receives: the cancellation signal of its batch and
/// the prefix to put in front of any error it reports.
#[derive(Clone, Default)]
pub struct Context {
    cancel: CancelToken,
    prefix: Option<Arc<str>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same cancellation, with `add` appended to the error prefix.
    pub fn prefixed(&self, add: impl AsRef<str>) -> Context {
        let prefix = match &self.prefix {
            Some(current) => format!("{}{}", current, add.as_ref()),
            None => add.as_ref().to_string(),
        };
        Context {
            cancel: self.cancel.clone(),
            prefix: Some(Arc::from(prefix)),
        }
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    /// Wraps `err` with the accumulated prefix.
    pub fn error(&self, err: Error) -> Error {
        match &self.prefix {
            Some(prefix) => err.with_prefix(prefix.as_ref()),
            None => err,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn done(&self) -> &Receiver<()> {
        self.cancel.done()
    }

    /// Cancels the context when the guard is dropped, however the
    /// enclosing scope is left.
    pub fn cancel_on_drop(&self) -> CancelGuard {
        CancelGuard {
            cancel: self.cancel.clone(),
        }
    }
}

pub struct CancelGuard {
    cancel: CancelToken,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
