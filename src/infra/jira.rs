use std::collections::HashSet;

use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::issue::{Issue, IssueQuery};
use crate::error::{AppError, AppResult};
use crate::services::IssueSourceService;

/// The tracker caps search results; anything past this is out of scope.
const MAX_RESULTS: u32 = 1000;

pub struct JiraClient {
    http: Client,
    base_url: Option<String>,
    user: Option<String>,
    token: Option<String>,
    epic_field: String,
    criteria_field: String,
}

impl JiraClient {
    pub fn new(
        base_url: Option<String>,
        user: Option<String>,
        token: Option<String>,
        epic_field: String,
        criteria_field: String,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url,
            user,
            token,
            epic_field,
            criteria_field,
        }
    }

    fn api_details(&self) -> AppResult<(&str, &str, &str)> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira base URL not configured".to_string()))?;
        let user = self
            .user
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira user not configured".to_string()))?;
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira API token not configured".to_string()))?;
        Ok((base_url, user, token))
    }

    fn auth_header(user: &str, token: &str) -> String {
        let credentials = format!("{user}:{token}");
        let encoded = BASE64_STANDARD.encode(credentials);
        format!("Basic {encoded}")
    }

    fn search_endpoint(base_url: &str) -> String {
        format!("{}/rest/api/2/search", base_url.trim_end_matches('/'))
    }

    fn build_jql(query: &IssueQuery) -> String {
        let mut jql = format!(
            "project = {} AND status NOT IN (Open, Closed)",
            query.project
        );
        if let Some(version) = &query.fix_version {
            jql.push_str(&format!(" AND fixVersion = \"{version}\""));
        }
        jql
    }

    /// Flattens the loosely-typed search payload into [`Issue`] records.
    /// This is the only place that knows about custom-field ids.
    fn map_issues(&self, payload: JiraSearchResponse) -> AppResult<Vec<Issue>> {
        let mut seen = HashSet::with_capacity(payload.issues.len());
        let mut issues = Vec::with_capacity(payload.issues.len());
        for wire in payload.issues {
            if wire.key.trim().is_empty() {
                return Err(AppError::SourceFetch(
                    "search response contains an issue without a key".to_string(),
                ));
            }
            if !seen.insert(wire.key.clone()) {
                return Err(AppError::SourceFetch(format!(
                    "search response repeats issue key {}",
                    wire.key
                )));
            }
            issues.push(self.map_issue(wire));
        }
        Ok(issues)
    }

    fn map_issue(&self, wire: JiraSearchIssue) -> Issue {
        let fields = &wire.fields;
        Issue {
            summary: text_field(fields, "summary"),
            description: text_field(fields, "description"),
            epic: text_field(fields, &self.epic_field),
            acceptance_criteria: text_field(fields, &self.criteria_field),
            created: text_field(fields, "created"),
            status: fields
                .pointer("/status/name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            fix_version: first_fix_version(fields),
            key: wire.key,
        }
    }
}

fn text_field(fields: &Value, name: &str) -> String {
    fields
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn first_fix_version(fields: &Value) -> Option<String> {
    fields
        .get("fixVersions")?
        .as_array()?
        .first()?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl IssueSourceService for JiraClient {
    async fn search_issues(&self, query: &IssueQuery) -> AppResult<Vec<Issue>> {
        if query.project.trim().is_empty() {
            return Err(AppError::SourceFetch(
                "project key must not be empty".to_string(),
            ));
        }

        let (base_url, user, token) = self.api_details()?;
        let jql = Self::build_jql(query);
        let request_body = JiraSearchRequest::new(&jql, &self.epic_field, &self.criteria_field);

        tracing::debug!(%jql, "querying issue source");
        let response = self
            .http
            .post(Self::search_endpoint(base_url))
            .header(AUTHORIZATION, Self::auth_header(user, token))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                AppError::SourceFetch(format!("failed to query issue source for '{jql}': {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::SourceFetch(format!(
                "issue source responded with {status} for '{jql}': {body}"
            )));
        }

        let payload: JiraSearchResponse = response.json().await.map_err(|err| {
            AppError::SourceFetch(format!("failed to parse search response: {err}"))
        })?;

        self.map_issues(payload)
    }
}

#[derive(Serialize)]
struct JiraSearchRequest {
    jql: String,
    #[serde(rename = "startAt")]
    start_at: u32,
    #[serde(rename = "maxResults")]
    max_results: u32,
    fields: Vec<String>,
}

impl JiraSearchRequest {
    fn new(jql: &str, epic_field: &str, criteria_field: &str) -> Self {
        Self {
            jql: jql.to_string(),
            start_at: 0,
            max_results: MAX_RESULTS,
            fields: vec![
                "summary".to_string(),
                "description".to_string(),
                "status".to_string(),
                "fixVersions".to_string(),
                "created".to_string(),
                epic_field.to_string(),
                criteria_field.to_string(),
            ],
        }
    }
}

#[derive(Deserialize)]
struct JiraSearchResponse {
    #[serde(default)]
    issues: Vec<JiraSearchIssue>,
}

#[derive(Deserialize)]
struct JiraSearchIssue {
    key: String,
    fields: Value,
}
