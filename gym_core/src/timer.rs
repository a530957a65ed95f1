//! Background tick driver for a [`WorkoutSession`].
//!
//! The timer owns one thread that ticks the shared session once per period.
//! The thread exits as soon as the session leaves `Running`, when `stop()` is
//! called, or when the timer is dropped, so no repeating action outlives the
//! session view that created it.

use crate::session::{SessionPhase, WorkoutSession};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Session shared between the UI loop and the timer thread
pub type SharedSession = Arc<Mutex<WorkoutSession>>;

pub struct SessionTimer {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SessionTimer {
    /// Start ticking `session` every `period`
    pub fn start(session: SharedSession, period: Duration) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = std::thread::spawn(move || loop {
            match stop_rx.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => {
                    let mut guard = match session.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    match guard.phase() {
                        SessionPhase::Running => guard.tick(),
                        SessionPhase::NotStarted => {}
                        SessionPhase::Complete => {
                            tracing::debug!("Session complete, timer exiting");
                            break;
                        }
                    }
                }
                // Explicit stop or the timer was dropped
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Start with the standard one-second period
    pub fn start_per_second(session: SharedSession) -> Self {
        Self::start(session, Duration::from_secs(1))
    }

    /// True while the tick thread is still alive
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the tick and wait for the thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
