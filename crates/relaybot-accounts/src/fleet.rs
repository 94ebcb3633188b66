//! Fleet runner — all configured accounts, concurrently, failures isolated.
//!
//! Each supervisor runs in its own `tokio::spawn` task. One account
//! crashing, failing to log in, or disconnecting never takes the others
//! down; the fleet simply runs until every account has ended and reports
//! how each one finished.

use std::sync::Arc;

use tracing::{info, warn};

use crate::supervisor::{AccountOutcome, AccountSupervisor};

/// Run every supervisor to completion and collect per-account outcomes.
pub async fn run_fleet(supervisors: Vec<Arc<AccountSupervisor>>) -> Vec<(String, AccountOutcome)> {
    if supervisors.is_empty() {
        warn!("no accounts configured, nothing to run");
        return Vec::new();
    }

    info!(accounts = supervisors.len(), "starting fleet");

    let mut handles = Vec::new();
    for supervisor in supervisors {
        let account = supervisor.account_id().to_string();
        let handle = tokio::spawn(async move { supervisor.run().await });
        handles.push((account, handle));
    }

    let mut outcomes = Vec::new();
    for (account, handle) in handles {
        match handle.await {
            Ok(outcome) => outcomes.push((account, outcome)),
            Err(e) => {
                // A panicked supervisor is contained like any other failure.
                warn!(account = %account, error = %e, "account task panicked");
                outcomes.push((account, AccountOutcome::Failed(e.to_string())));
            }
        }
    }

    info!(accounts = outcomes.len(), "fleet finished");
    outcomes
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
