//! Per-user exchange gates.
//!
//! At most one exchange runs at a time for a given (account, user): a
//! second message from the same user while one is in flight waits its turn
//! behind an async mutex, while different users proceed in parallel. One
//! `ExchangeGates` instance belongs to one account supervisor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Map of per-user async locks.
#[derive(Default)]
pub struct ExchangeGates {
    gates: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ExchangeGates {
    pub fn new() -> Self {
        Self::default()
    }

    /// The gate for `user_id`, created on first use. Hold the returned
    /// mutex's guard for the duration of the exchange.
    pub fn gate(&self, user_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut gates = self.gates.lock().expect("gate map lock poisoned");
        gates
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
