/// One work item fetched from the issue tracker, flattened into a fixed
/// shape at the source boundary. Custom-field indirection stays in the
/// Jira adapter; everything past that boundary reads these fields only.
#[derive(Debug, Clone)]
pub struct Issue {
    pub key: String,
    pub summary: String,
    pub description: String,
    pub epic: String,
    pub acceptance_criteria: String,
    /// Raw tracker timestamp, e.g. "2024-02-10T12:00:00.000+0000".
    /// Parsed by the classifier so a malformed value can be reported
    /// together with its issue key.
    pub created: String,
    pub status: String,
    pub fix_version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IssueQuery {
    pub project: String,
    pub fix_version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MandatoryField {
    Summary,
    Description,
    Epic,
    FixVersion,
    AcceptanceCriteria,
}

impl MandatoryField {
    pub fn label(&self) -> &'static str {
        match self {
            MandatoryField::Summary => "Summary",
            MandatoryField::Description => "Description",
            MandatoryField::Epic => "Epic",
            MandatoryField::FixVersion => "Fix Version",
            MandatoryField::AcceptanceCriteria => "Acceptance Criteria",
        }
    }

    fn value_of<'a>(&self, issue: &'a Issue) -> &'a str {
        match self {
            MandatoryField::Summary => &issue.summary,
            MandatoryField::Description => &issue.description,
            MandatoryField::Epic => &issue.epic,
            MandatoryField::FixVersion => issue.fix_version.as_deref().unwrap_or(""),
            MandatoryField::AcceptanceCriteria => &issue.acceptance_criteria,
        }
    }
}

/// Mandatory fields whose value is absent, empty, or whitespace-only,
/// in the order the mandatory list gives them. Blank fields are data,
/// not faults.
pub fn missing_fields(issue: &Issue, mandatory: &[MandatoryField]) -> Vec<MandatoryField> {
    mandatory
        .iter()
        .copied()
        .filter(|field| field.value_of(issue).trim().is_empty())
        .collect()
}

#[cfg(test)]
impl Issue {
    /// A fully-populated issue; tests blank out the fields under test.
    pub(crate) fn sample(key: &str) -> Self {
        Self {
            key: key.to_string(),
            summary: "Login bug".to_string(),
            description: "Broken link on page".to_string(),
            epic: "EPIC-01".to_string(),
            acceptance_criteria: "Given a user When they click Then they navigate".to_string(),
            created: "2025-04-10T12:00:00.000+0000".to_string(),
            status: "In Progress".to_string(),
            fix_version: Some("1.4.0".to_string()),
        }
    }
}
