// src/heartbeat.rs
//! Periodic liveness line for long runs.

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Logs `[Heartbeat] Still running…` every `interval` until dropped.
///
/// Dropping the guard stops the ticker thread and waits for it.
pub struct HeartbeatGuard {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl HeartbeatGuard {
    pub fn start(started: Instant, interval: Duration) -> Self {
        let (stop, stopped) = channel::bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("heartbeat".to_string())
            .spawn(move || loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        log::info!(
                            "[Heartbeat] Still running… elapsed {:.2} min",
                            started.elapsed().as_secs_f64() / 60.0
                        );
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Heartbeat disabled: {}", e);
                None
            }
        };

        Self {
            stop: Some(stop),
            handle,
        }
    }
}

impl Drop for HeartbeatGuard {
    fn drop(&mut self) {
        // Disconnecting the channel wakes the ticker immediately.
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
