use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct OutgoingReport {
    pub recipients: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub attachment: Option<PathBuf>,
}

#[async_trait]
pub trait ReportMailerService: Send + Sync {
    async fn send_report(&self, outgoing: &OutgoingReport) -> AppResult<()>;
}

/// Splits the CLI's comma-separated mail group into addresses, dropping
/// empty segments.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_addresses() {
        assert_eq!(
            parse_recipients(" qa@example.com, dev@example.com ,"),
            vec!["qa@example.com".to_string(), "dev@example.com".to_string()]
        );
    }

    #[test]
    fn blank_input_yields_no_recipients() {
        assert!(parse_recipients("  ,, ").is_empty());
    }
}
