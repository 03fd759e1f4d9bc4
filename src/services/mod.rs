pub mod issue_source;
pub mod mailer;

pub use issue_source::IssueSourceService;
pub use mailer::ReportMailerService;
