//! Pending call handles with attach-after-settlement callbacks.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Notify;

use crate::error::{CallError, CallOutcome};

type SuccessFn = Box<dyn FnOnce(Value) + Send>;
type FailureFn = Box<dyn FnOnce(CallError) + Send>;

/// Handle to one in-flight remote call.
///
/// Settles exactly once, with exactly one of a success value, a remote
/// error, a transport error, or a cancellation. Callbacks registered after
/// settlement fire immediately with the stored outcome instead of being
/// lost; callbacks registered before fire in registration order.
#[derive(Clone)]
pub struct PendingCall {
    inner: Arc<CallInner>,
}

struct CallInner {
    method: String,
    state: Mutex<CallState>,
    settled: Notify,
}

#[derive(Default)]
struct CallState {
    outcome: Option<CallOutcome>,
    on_success: Vec<SuccessFn>,
    on_failure: Vec<FailureFn>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl PendingCall {
    pub(crate) fn new(method: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(CallInner {
                method: method.into(),
                state: Mutex::new(CallState::default()),
                settled: Notify::new(),
            }),
        }
    }

    /// Target method of this call.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.inner.method
    }

    /// Register a callback fired with the result value on success.
    pub fn on_success(&self, callback: impl FnOnce(Value) + Send + 'static) -> &Self {
        let immediate = {
            let mut state = self.lock_state();
            match &state.outcome {
                None => {
                    state.on_success.push(Box::new(callback));
                    None
                }
                Some(Ok(value)) => Some((Box::new(callback) as SuccessFn, value.clone())),
                Some(Err(_)) => None,
            }
        };
        if let Some((callback, value)) = immediate {
            callback(value);
        }
        self
    }

    /// Register a callback fired with the error on failure.
    pub fn on_failure(&self, callback: impl FnOnce(CallError) + Send + 'static) -> &Self {
        let immediate = {
            let mut state = self.lock_state();
            match &state.outcome {
                None => {
                    state.on_failure.push(Box::new(callback));
                    None
                }
                Some(Err(error)) => Some((Box::new(callback) as FailureFn, error.clone())),
                Some(Ok(_)) => None,
            }
        };
        if let Some((callback, error)) = immediate {
            callback(error);
        }
        self
    }

    /// Whether the call has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.lock_state().outcome.is_some()
    }

    /// Wait for settlement and return the outcome.
    pub async fn wait(&self) -> CallOutcome {
        loop {
            let settled = self.inner.settled.notified();
            tokio::pin!(settled);
            // Register for the wakeup before checking, so a settlement
            // between the check and the await is not missed.
            settled.as_mut().enable();
            if let Some(outcome) = self.lock_state().outcome.clone() {
                return outcome;
            }
            settled.await;
        }
    }

    /// Cancel the call. A no-op once settled; otherwise settles with
    /// [`CallError::Cancelled`] so waiters and timers are released.
    pub fn cancel(&self) {
        self.settle(Err(CallError::Cancelled));
    }

    /// Arm a per-call timeout, settling as a transport error on expiry.
    #[must_use]
    pub fn with_timeout(self, duration: Duration) -> Self {
        let call = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            call.settle(Err(CallError::transport(format!(
                "call timed out after {}ms",
                duration.as_millis()
            ))));
        });
        self
    }

    /// Register cleanup run once the call settles, whichever way.
    ///
    /// Fires immediately when the call has already settled; otherwise it is
    /// invoked by [`Self::settle`] alongside the outcome callbacks. The
    /// gateway uses this to drop its bookkeeping for the call.
    pub(crate) fn set_release_hook(&self, hook: impl FnOnce() + Send + 'static) {
        let immediate = {
            let mut state = self.lock_state();
            if state.outcome.is_some() {
                Some(Box::new(hook) as Box<dyn FnOnce() + Send>)
            } else {
                state.release = Some(Box::new(hook));
                None
            }
        };
        if let Some(hook) = immediate {
            hook();
        }
    }

    /// Settle the call. Returns false if it had already settled.
    ///
    /// Callbacks are drained under the lock but invoked after it is
    /// released, so a callback may re-enter this handle or the gateway.
    pub(crate) fn settle(&self, outcome: CallOutcome) -> bool {
        let (on_success, on_failure, release) = {
            let mut state = self.lock_state();
            if state.outcome.is_some() {
                return false;
            }
            state.outcome = Some(outcome.clone());
            (
                std::mem::take(&mut state.on_success),
                std::mem::take(&mut state.on_failure),
                state.release.take(),
            )
        };
        if let Some(release) = release {
            release();
        }

        match outcome {
            Ok(value) => {
                for callback in on_success {
                    callback(value.clone());
                }
            }
            Err(error) => {
                if on_failure.is_empty() {
                    tracing::warn!(
                        method = %self.inner.method,
                        error = %error,
                        "remote call failed with no failure callback registered"
                    );
                }
                for callback in on_failure {
                    callback(error.clone());
                }
            }
        }
        self.inner.settled.notify_waiters();
        true
    }

    fn lock_state(&self) -> MutexGuard<'_, CallState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
