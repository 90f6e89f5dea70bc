//! One-shot auth-gate.
//!
//! The provider restores a persisted session asynchronously; until its
//! first auth-state value arrives, reading the current principal would
//! race the restore. The gate latches on that first value: every waiter
//! queued before it suspends and resumes from the single resolution, and
//! every wait after it returns immediately. The latch never resets.

use crate::identity::AuthState;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::{sync::watch, time};
use tracing::warn;

/// Upper bound on the first-resolution wait. A provider outage must not
/// hang navigation forever; on timeout the session counts as signed out.
pub const DEFAULT_GATE_TIMEOUT: time::Duration = time::Duration::from_secs(10);

pub struct AuthGate {
    checked: AtomicBool,
    state: watch::Receiver<AuthState>,
    timeout: time::Duration,
}

impl AuthGate {
    #[must_use]
    pub fn new(state: watch::Receiver<AuthState>, timeout: time::Duration) -> Self {
        Self {
            checked: AtomicBool::new(false),
            state,
            timeout,
        }
    }

    /// Whether the first auth-state resolution has been observed.
    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.checked.load(Ordering::Acquire)
    }

    /// Suspend until the first auth-state resolution, bounded by the gate
    /// timeout, then latch. Calls after the latch return immediately.
    pub async fn wait_checked(&self) {
        if self.is_checked() {
            return;
        }

        let mut state = self.state.clone();
        match time::timeout(self.timeout, state.wait_for(AuthState::is_resolved)).await {
            Ok(Ok(_)) => {}
            Ok(Err(_)) => {
                warn!("auth-state stream closed before the first resolution");
            }
            Err(_) => {
                warn!(
                    "timed out after {:?} waiting for the first auth state, treating session as signed out",
                    self.timeout
                );
            }
        }

        self.checked.store(true, Ordering::Release);
    }
}
