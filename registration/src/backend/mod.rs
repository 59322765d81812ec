//! Backend implementations used outside production.

pub mod memory;

pub use memory::{BackendCall, InMemoryBackend, Operation};

use crate::providers::Navigator;
use std::sync::{Mutex, PoisonError};

/// Navigator that records every path it is sent to
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Create a navigator with no history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths navigated to, in order
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times `path` was navigated to
    #[must_use]
    pub fn count(&self, path: &str) -> usize {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}

/// Navigator that only logs
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect(&self, path: &str) {
        tracing::info!(path, "navigate");
    }
}
