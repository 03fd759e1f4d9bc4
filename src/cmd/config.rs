use std::io::{self, Write};

use clap::{Args, Subcommand};

use crate::config::{StoredConfig, config_file_path};
use crate::error::{AppError, AppResult};

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring jiravet.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("Secrets are stored in the local config file; protect your filesystem accordingly.");
    println!();

    apply_prompt(
        "Jira base URL (e.g., https://company.atlassian.net)",
        &mut cfg.jira_base_url,
        false,
    )?;
    apply_prompt("Jira user (email)", &mut cfg.jira_user, false)?;
    apply_prompt("Jira API token", &mut cfg.jira_token, true)?;
    apply_prompt(
        "Epic custom-field id (e.g., customfield_10008)",
        &mut cfg.epic_field,
        false,
    )?;
    apply_prompt(
        "Acceptance-criteria custom-field id (e.g., customfield_10011)",
        &mut cfg.criteria_field,
        false,
    )?;

    apply_prompt("SMTP host", &mut cfg.smtp_host, false)?;
    apply_port_prompt("SMTP port", &mut cfg.smtp_port)?;
    apply_prompt("SMTP username", &mut cfg.smtp_user, false)?;
    apply_prompt("SMTP password", &mut cfg.smtp_pass, true)?;
    apply_prompt("Sender address (From)", &mut cfg.mail_from, false)?;

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("Jira base URL: {}", display_value(&cfg.jira_base_url));
    println!("Jira user: {}", display_value(&cfg.jira_user));
    println!("Jira API token: {}", mask_secret(&cfg.jira_token));
    println!("Epic field: {}", display_value(&cfg.epic_field));
    println!(
        "Acceptance-criteria field: {}",
        display_value(&cfg.criteria_field)
    );
    println!("SMTP host: {}", display_value(&cfg.smtp_host));
    println!(
        "SMTP port: {}",
        cfg.smtp_port
            .map(|port| port.to_string())
            .unwrap_or_else(|| "<not set>".to_string())
    );
    println!("SMTP username: {}", display_value(&cfg.smtp_user));
    println!("SMTP password: {}", mask_secret(&cfg.smtp_pass));
    println!("Sender address: {}", display_value(&cfg.mail_from));

    Ok(())
}

fn apply_prompt(field: &str, target: &mut Option<String>, secret: bool) -> AppResult<()> {
    match prompt(field, target.as_deref(), secret)? {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => *target = Some(value),
    }
    Ok(())
}

fn apply_port_prompt(field: &str, target: &mut Option<u16>) -> AppResult<()> {
    let current = target.map(|port| port.to_string());
    match prompt(field, current.as_deref(), false)? {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => {
            let port = value.parse().map_err(|_| {
                AppError::Configuration(format!("'{value}' is not a valid port"))
            })?;
            *target = Some(port);
        }
    }
    Ok(())
}

fn prompt(field: &str, current: Option<&str>, secret: bool) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match (current, secret) {
        (Some(_), true) => write!(stdout, "{field} [****] (Enter to keep, '-' to clear): ")?,
        (Some(value), false) => {
            write!(stdout, "{field} [{value}] (Enter to keep, '-' to clear): ")?
        }
        (None, _) => write!(stdout, "{field} (Enter to skip): ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim();

    if trimmed.is_empty() {
        Ok(PromptAction::Keep)
    } else if trimmed == "-" {
        Ok(PromptAction::Clear)
    } else {
        Ok(PromptAction::Set(trimmed.to_string()))
    }
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.len() > 6 => {
            let prefix = &token[..3];
            let suffix = &token[token.len() - 3..];
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}

enum PromptAction {
    Keep,
    Clear,
    Set(String),
}
