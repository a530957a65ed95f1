//! Process-wide record store connectivity flag.
//!
//! Lifecycle: [`connect`] sets the flag when the store answers a ping and
//! clears it when it does not. Nothing else writes it; request handling only
//! reads it through [`Readiness::is_ready`] as a pre-flight check.

use crate::store::RecordStore;
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, cheaply clonable view of store connectivity
#[derive(Clone, Debug, Default)]
pub struct Readiness {
    connected: Arc<AtomicBool>,
}

impl Readiness {
    /// A flag that starts disconnected
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Human-readable state for health reporting
    pub fn status(&self) -> &'static str {
        if self.is_ready() {
            "connected"
        } else {
            "disconnected"
        }
    }

    fn set(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }
}

/// Probe `store` and record the outcome in `readiness`
pub fn connect(store: &dyn RecordStore, readiness: &Readiness) -> Result<()> {
    match store.ping() {
        Ok(()) => {
            if !readiness.is_ready() {
                tracing::info!("Record store connected");
            }
            readiness.set(true);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Record store connection failed: {}", e);
            readiness.set(false);
            Err(e.into())
        }
    }
}
