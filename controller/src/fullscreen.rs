use anyhow::{Result, anyhow};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Identity of one prospective fullscreen holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolderId(u64);

/// Process-wide exclusive fullscreen capability.
///
/// Only one element may present fullscreen at a time, so the capability is
/// modeled as an explicit acquire/release resource with a well-defined
/// holder rather than an ambient global. Clones share the underlying grant:
/// every controller on a page contends through the same capability value.
#[derive(Debug, Clone, Default)]
pub struct FullscreenCapability {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: AtomicU64,
    holder: Mutex<Option<HolderId>>,
}

impl FullscreenCapability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a holder identity for one controller instance.
    pub fn register(&self) -> HolderId {
        HolderId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Try to take exclusive fullscreen for `holder`.
    ///
    /// Granted when the capability is free or `holder` already owns it;
    /// denied while another holder owns it.
    pub fn request_exclusive(&self, holder: HolderId) -> bool {
        let mut current = match self.inner.holder.lock() {
            Ok(guard) => guard,
            Err(e) => {
                log::error!("Fullscreen capability state is poisoned: {}", e);
                return false;
            }
        };

        match *current {
            Some(existing) if existing != holder => false,
            _ => {
                *current = Some(holder);
                true
            }
        }
    }

    /// Release the grant held by `holder`.
    ///
    /// Releasing without holding the grant is a logged no-op; only a
    /// poisoned capability reports an error (teardown treats it as
    /// non-fatal).
    pub fn release(&self, holder: HolderId) -> Result<()> {
        let mut current = self
            .inner
            .holder
            .lock()
            .map_err(|e| anyhow!("fullscreen capability state is poisoned: {}", e))?;

        match *current {
            Some(existing) if existing == holder => {
                *current = None;
            }
            Some(_) => {
                log::warn!("Fullscreen release ignored: grant held by another controller");
            }
            None => {}
        }
        Ok(())
    }

    /// The holder currently presenting fullscreen, if any.
    pub fn current_holder(&self) -> Option<HolderId> {
        match self.inner.holder.lock() {
            Ok(guard) => *guard,
            Err(e) => {
                log::error!("Fullscreen capability state is poisoned: {}", e);
                None
            }
        }
    }
}
