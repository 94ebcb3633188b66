//! `relaybot run` — start every configured account plus the liveness
//! endpoint, and stay up until the whole fleet has ended.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tracing::{info, warn};

use relaybot_accounts::{run_fleet, AccountOutcome, AccountSupervisor, ConsoleTransport, Transport};
use relaybot_core::config::{load_config, AccountConfig, Config};
use relaybot_core::history::HistoryStore;
use relaybot_core::utils::expand_home;
use relaybot_engine::ConversationEngine;
use relaybot_providers::GeminiBackend;

use crate::liveness;

pub async fn run(ephemeral: bool) -> Result<()> {
    let config = load_config(None);

    if !config.provider.is_configured() {
        bail!(
            "no API key configured — set provider.apiKey in config.json or export GEMINI_API_KEY"
        );
    }

    let store = open_store(&config, ephemeral)?;
    let backend: Arc<GeminiBackend> = Arc::new(GeminiBackend::new(
        config.provider.api_key.clone(),
        config.provider.model.clone(),
        config.provider.api_base.clone(),
    ));

    // Default to a single console account when none are configured, so a
    // bare `relaybot run` is immediately usable.
    let accounts = if config.accounts.is_empty() {
        warn!("no accounts configured, starting a console session");
        vec![AccountConfig::default()]
    } else {
        config.accounts.clone()
    };

    let supervisors: Vec<Arc<AccountSupervisor>> = accounts
        .iter()
        .map(|account| {
            let transport: Arc<dyn Transport> = Arc::new(ConsoleTransport::new(account.id.clone()));
            let engine = Arc::new(ConversationEngine::new(
                store.clone(),
                backend.clone(),
                account.id.clone(),
                account.persona.clone(),
                account.greeting_text().to_string(),
                config.history.window,
            ));
            Arc::new(AccountSupervisor::new(transport, engine))
        })
        .collect();

    info!(
        accounts = supervisors.len(),
        model = %config.provider.model,
        "relay starting"
    );

    if config.liveness.enabled {
        let host = config.liveness.host.clone();
        let port = config.liveness.port;
        tokio::spawn(async move {
            if let Err(e) = liveness::serve(&host, port).await {
                warn!(error = %e, "liveness endpoint failed");
            }
        });
    }

    let outcomes = run_fleet(supervisors).await;
    report(&outcomes);

    Ok(())
}

fn open_store(config: &Config, ephemeral: bool) -> Result<Arc<HistoryStore>> {
    let store = if ephemeral {
        HistoryStore::open_in_memory().context("failed to open in-memory history store")?
    } else {
        let db_path = expand_home(&config.history.db_path);
        info!(path = %db_path.display(), "opening history store");
        HistoryStore::open(&db_path)
            .with_context(|| format!("failed to open history store at {}", db_path.display()))?
    };
    Ok(Arc::new(store))
}

fn report(outcomes: &[(String, AccountOutcome)]) {
    println!();
    for (account, outcome) in outcomes {
        match outcome {
            AccountOutcome::Disconnected => {
                println!("  {:<16} {}", account.bold(), "disconnected".dimmed());
            }
            AccountOutcome::Failed(reason) => {
                println!("  {:<16} {} {}", account.bold(), "failed:".red(), reason);
            }
        }
    }
    println!();
}
