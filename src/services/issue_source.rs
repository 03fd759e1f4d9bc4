use async_trait::async_trait;

use crate::domain::issue::{Issue, IssueQuery};
use crate::error::AppResult;

#[async_trait]
pub trait IssueSourceService: Send + Sync {
    /// Returns the matching issues in tracker order, capped at the
    /// source's fixed result maximum.
    async fn search_issues(&self, query: &IssueQuery) -> AppResult<Vec<Issue>>;
}
