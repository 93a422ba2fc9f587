//! In-flight de-duplication.
//!
//! Only one turn per session may run at a time. The set of active session
//! ids lives in a guard the caller creates and shares, not in a global.

use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct InFlightGuard {
    active: Mutex<HashSet<String>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`. `None` if a turn for it is already running.
    pub fn try_acquire(&self, key: &str) -> Option<InFlightTicket<'_>> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(key.to_string()) {
            return None;
        }
        Some(InFlightTicket {
            guard: self,
            key: key.to_string(),
        })
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }
}

/// Releases its key when dropped.
#[derive(Debug)]
pub struct InFlightTicket<'a> {
    guard: &'a InFlightGuard,
    key: String,
}

impl InFlightTicket<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for InFlightTicket<'_> {
    fn drop(&mut self) {
        self.guard
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}
