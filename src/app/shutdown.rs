//! Graceful shutdown handling for the runner.
//!
//! A shutdown request only raises a flag. The loop checks it between ticks,
//! so the tick in progress always completes before the final save.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Manages graceful shutdown of the runner.
#[derive(Clone)]
pub struct ShutdownManager {
    shutdown_requested: Arc<AtomicBool>,
    save_on_exit: bool,
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self {
            shutdown_requested: Arc::new(AtomicBool::new(false)),
            save_on_exit: true,
        }
    }

    pub fn set_save_on_exit(&mut self, save: bool) {
        self.save_on_exit = save;
    }

    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        tracing::info!("Shutdown requested");
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    pub fn should_save_on_exit(&self) -> bool {
        self.save_on_exit
    }

    /// Requests shutdown on Ctrl+C. Must be called inside a tokio runtime.
    pub fn listen_for_ctrl_c(&self) {
        let manager = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl+C received, finishing the current tick");
                manager.request_shutdown();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_manager_new() {
        let manager = ShutdownManager::new();
        assert!(!manager.is_shutdown_requested());
        assert!(manager.should_save_on_exit());
    }

    #[test]
    fn test_request_is_shared_between_clones() {
        let manager = ShutdownManager::new();
        let handle = manager.clone();
        handle.request_shutdown();
        assert!(manager.is_shutdown_requested());
    }

    #[test]
    fn test_save_on_exit() {
        let mut manager = ShutdownManager::new();
        manager.set_save_on_exit(false);
        assert!(!manager.should_save_on_exit());
    }
}
