pub mod jira;
pub mod mailer;
