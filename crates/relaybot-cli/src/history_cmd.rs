//! `relaybot history` — inspect a user's stored conversation turns.

use anyhow::{Context, Result};
use colored::Colorize;

use relaybot_core::config::load_config;
use relaybot_core::history::HistoryStore;
use relaybot_core::utils::{expand_home, truncate_string};
use relaybot_core::TurnRole;

/// Show the most recent `limit` turns for `user`, oldest first.
pub fn run(user: &str, limit: usize) -> Result<()> {
    let config = load_config(None);
    let db_path = expand_home(&config.history.db_path);
    let store = HistoryStore::open(&db_path)
        .with_context(|| format!("failed to open history store at {}", db_path.display()))?;

    let total = store.turn_count(user)?;
    let turns = store.recent(user, limit)?;

    println!();
    if turns.is_empty() {
        println!("  {}", format!("no history for user '{user}'").dimmed());
        println!();
        return Ok(());
    }

    println!(
        "  {} — showing {} of {} turn(s)",
        user.bold(),
        turns.len(),
        total
    );
    println!();

    for turn in &turns {
        let speaker = match turn.role {
            TurnRole::User => "user ".blue(),
            TurnRole::Model => "model".green(),
        };
        println!(
            "  {} {} {}",
            turn.created_at.dimmed(),
            speaker,
            truncate_string(&turn.content, 100)
        );
    }
    println!();

    Ok(())
}
