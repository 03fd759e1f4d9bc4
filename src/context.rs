use std::sync::Arc;

use crate::services::{IssueSourceService, ReportMailerService};

#[derive(Clone)]
pub struct AppContext {
    pub issue_source: Arc<dyn IssueSourceService>,
    pub mailer: Arc<dyn ReportMailerService>,
}

impl AppContext {
    pub fn new(
        issue_source: Arc<dyn IssueSourceService>,
        mailer: Arc<dyn ReportMailerService>,
    ) -> Self {
        Self {
            issue_source,
            mailer,
        }
    }
}
