use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::error::{AppError, AppResult};
use crate::services::mailer::{OutgoingReport, ReportMailerService};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> AppResult<AsyncSmtpTransport<Tokio1Executor>> {
        let host = self
            .config
            .host
            .as_deref()
            .ok_or_else(|| AppError::Configuration("SMTP host not configured".to_string()))?;
        // Credentials imply an authenticated TLS relay; without them the
        // server is addressed as a plain local relay on the configured port.
        let transport = match (&self.config.username, &self.config.password) {
            (Some(user), Some(pass)) => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|err| {
                    AppError::Configuration(format!("invalid SMTP relay '{host}': {err}"))
                })?
                .port(self.config.port)
                .credentials(Credentials::new(user.clone(), pass.clone()))
                .build(),
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                .port(self.config.port)
                .build(),
        };
        Ok(transport)
    }

    fn build_message(&self, outgoing: &OutgoingReport) -> AppResult<Message> {
        let sender = self.config.from.as_deref().ok_or_else(|| {
            AppError::Configuration("sender address not configured".to_string())
        })?;
        let sender: Mailbox = sender.parse().map_err(|err| {
            AppError::Configuration(format!("invalid sender address '{sender}': {err}"))
        })?;

        let mut builder = Message::builder()
            .from(sender)
            .subject(outgoing.subject.clone());
        for recipient in &outgoing.recipients {
            let mailbox: Mailbox = recipient.parse().map_err(|err| {
                dispatch_error(outgoing, format!("invalid recipient '{recipient}': {err}"))
            })?;
            builder = builder.to(mailbox);
        }

        let body = SinglePart::builder()
            .header(ContentType::TEXT_HTML)
            .body(outgoing.html_body.clone());

        let message = match &outgoing.attachment {
            Some(path) => {
                let bytes = std::fs::read(path)?;
                let filename = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("report.xlsx")
                    .to_string();
                let content_type = ContentType::parse(XLSX_MIME).map_err(|err| {
                    dispatch_error(outgoing, format!("invalid attachment content type: {err}"))
                })?;
                let attachment = Attachment::new(filename).body(bytes, content_type);
                builder.multipart(MultiPart::mixed().singlepart(body).singlepart(attachment))
            }
            None => builder.singlepart(body),
        }
        .map_err(|err| dispatch_error(outgoing, format!("failed to build message: {err}")))?;

        Ok(message)
    }
}

fn dispatch_error(outgoing: &OutgoingReport, reason: String) -> AppError {
    AppError::Dispatch {
        recipients: outgoing.recipients.join(", "),
        reason,
    }
}

#[async_trait]
impl ReportMailerService for SmtpMailer {
    async fn send_report(&self, outgoing: &OutgoingReport) -> AppResult<()> {
        if outgoing.recipients.is_empty() {
            return Err(dispatch_error(outgoing, "no recipients given".to_string()));
        }

        let message = self.build_message(outgoing)?;
        let transport = self.transport()?;
        transport
            .send(message)
            .await
            .map_err(|err| dispatch_error(outgoing, err.to_string()))?;

        tracing::info!(
            recipients = %outgoing.recipients.join(", "),
            subject = %outgoing.subject,
            "report dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_config() -> SmtpConfig {
        SmtpConfig {
            host: Some("mail.example.com".to_string()),
            port: 25,
            username: None,
            password: None,
            from: Some("noreply@example.com".to_string()),
        }
    }

    fn outgoing(recipients: Vec<&str>) -> OutgoingReport {
        OutgoingReport {
            recipients: recipients.into_iter().map(str::to_string).collect(),
            subject: "[Issue Validation] PROJ - No Version - 3 Issues Scanned".to_string(),
            html_body: "<html><body>ok</body></html>".to_string(),
            attachment: None,
        }
    }

    #[test]
    fn builds_a_message_for_each_recipient() {
        let mailer = SmtpMailer::new(smtp_config());
        let message = mailer
            .build_message(&outgoing(vec!["qa@example.com", "dev@example.com"]))
            .unwrap();
        let rendered = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(rendered.contains("qa@example.com"));
        assert!(rendered.contains("dev@example.com"));
        assert!(rendered.contains("From: noreply@example.com"));
    }

    #[test]
    fn invalid_recipient_surfaces_as_dispatch_error() {
        let mailer = SmtpMailer::new(smtp_config());
        let err = mailer
            .build_message(&outgoing(vec!["not an address"]))
            .unwrap_err();
        assert!(matches!(err, AppError::Dispatch { .. }));
    }

    #[test]
    fn missing_sender_is_a_configuration_error() {
        let mut config = smtp_config();
        config.from = None;
        let mailer = SmtpMailer::new(config);
        let err = mailer.build_message(&outgoing(vec!["qa@example.com"])).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
