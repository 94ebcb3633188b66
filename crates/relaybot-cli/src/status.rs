//! `relaybot status` — show configuration and backend status.

use anyhow::Result;
use colored::Colorize;

use relaybot_core::config::{get_config_path, load_config};
use relaybot_core::utils::expand_home;

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "Relaybot Status".cyan().bold());
    println!();

    // Config
    let config_exists = config_path.exists();
    println!(
        "  {:<14} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_exists {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    // History database
    let db_path = expand_home(&config.history.db_path);
    let db_exists = db_path.exists();
    println!(
        "  {:<14} {} {}",
        "History:".bold(),
        db_path.display(),
        if db_exists {
            "✓".green().to_string()
        } else {
            "(not created yet)".dimmed().to_string()
        }
    );
    println!(
        "  {:<14} {} recent turns per exchange",
        "Window:".bold(),
        config.history.window
    );

    // Backend
    println!("  {:<14} {}", "Model:".bold(), config.provider.model);
    let key_status = if config.provider.is_configured() {
        format!("{} (key set)", "✓".green())
    } else {
        format!("{}", "· not configured".dimmed())
    };
    println!("  {:<14} {}", "API key:".bold(), key_status);

    // Accounts
    println!();
    println!("  {}", "Accounts:".bold());
    if config.accounts.is_empty() {
        println!("    {}", "(none configured — run starts a console session)".dimmed());
    } else {
        for account in &config.accounts {
            let session_status = if account.session.is_empty() {
                format!("{}", "· no session".dimmed())
            } else {
                format!("{} (session set)", "✓".green())
            };
            println!("    {:<16} {}", account.id, session_status);
        }
    }

    // Liveness
    println!();
    let liveness = if config.liveness.enabled {
        format!("{}:{}", config.liveness.host, config.liveness.port)
    } else {
        "disabled".to_string()
    };
    println!("  {:<14} {}", "Liveness:".bold(), liveness);
    println!();

    Ok(())
}
