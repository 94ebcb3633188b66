//! Per-account runtime state.
//!
//! Exactly one `AccountState` exists per account, owned by that account's
//! supervisor and passed explicitly into the conversation engine — there is
//! no process-wide singleton. The state is deliberately not persisted:
//! a restart resets it, so users greeted before the restart are greeted
//! again. That tradeoff is accepted in exchange for keeping the store's
//! schema a pure conversation log.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Lifecycle of one account's supervisor.
///
/// `Active ⇄ Asleep` transitions are driven only by the two sleep/wake
/// self-commands. `Stopped` is entered on transport disconnect or a fatal
/// startup error and is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountPhase {
    Starting,
    Active,
    Asleep,
    Stopped,
}

/// Mutable per-account state: the lifecycle phase, the active/asleep flag,
/// and the set of users that have already received the one-time greeting.
pub struct AccountState {
    active: AtomicBool,
    phase: RwLock<AccountPhase>,
    greeted: RwLock<HashSet<String>>,
}

impl Default for AccountState {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountState {
    /// Fresh state: starting, active, nobody greeted.
    pub fn new() -> Self {
        AccountState {
            active: AtomicBool::new(true),
            phase: RwLock::new(AccountPhase::Starting),
            greeted: RwLock::new(HashSet::new()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Flip between active and asleep. A stopped account stays stopped;
    /// the flag still records the owner's last choice.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
        let mut phase = self.phase.write().expect("phase lock poisoned");
        if *phase != AccountPhase::Stopped {
            *phase = if active {
                AccountPhase::Active
            } else {
                AccountPhase::Asleep
            };
        }
    }

    pub fn phase(&self) -> AccountPhase {
        *self.phase.read().expect("phase lock poisoned")
    }

    /// Supervisor lifecycle transitions (connected, stopped).
    pub fn set_phase(&self, phase: AccountPhase) {
        *self.phase.write().expect("phase lock poisoned") = phase;
    }

    pub fn has_greeted(&self, user_id: &str) -> bool {
        self.greeted
            .read()
            .expect("greeted set lock poisoned")
            .contains(user_id)
    }

    /// Idempotent: once marked, the greeting is never re-sent for that
    /// user within the process lifetime.
    pub fn mark_greeted(&self, user_id: &str) {
        self.greeted
            .write()
            .expect("greeted set lock poisoned")
            .insert(user_id.to_string());
    }

    /// Number of users greeted so far (diagnostics).
    pub fn greeted_count(&self) -> usize {
        self.greeted.read().expect("greeted set lock poisoned").len()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
