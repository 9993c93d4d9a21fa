// ── Write/refresh lock ──
//
// A boolean flag a refresh pass holds while it is in flight. Writers wait
// for it to clear before sending, up to a timeout, after which the lock
// is released by force so a stuck refresh cannot wedge writes.

use std::time::Duration;

use tokio::sync::watch;

/// Refresh-in-progress flag with async waiting.
#[derive(Debug)]
pub(crate) struct WriteLock {
    locked: watch::Sender<bool>,
}

impl WriteLock {
    pub(crate) fn new() -> Self {
        let (locked, _) = watch::channel(false);
        Self { locked }
    }

    pub(crate) fn set(&self, locked: bool) {
        self.locked.send_replace(locked);
    }

    pub(crate) fn is_locked(&self) -> bool {
        *self.locked.borrow()
    }

    /// Wait until the lock is clear.
    ///
    /// Returns `false` if `timeout` elapsed first; the lock has then been
    /// force-released.
    pub(crate) async fn wait_for_unlock(&self, timeout: Duration) -> bool {
        let mut rx = self.locked.subscribe();
        let cleared = tokio::time::timeout(timeout, rx.wait_for(|locked| !*locked)).await;
        match cleared {
            Ok(_) => true,
            Err(_) => {
                self.set(false);
                false
            }
        }
    }
}
