use chrono::NaiveDateTime;

use crate::domain::criteria::CriteriaVerdict;
use crate::domain::issue::{Issue, MandatoryField};

/// The two report shapes over the one validation core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportProfile {
    /// Age-bucketed HTML tables, delivered by mail.
    Html,
    /// Flat spreadsheet of issues with missing fields, written to disk
    /// and attached to the mail.
    Spreadsheet,
}

impl ReportProfile {
    pub fn mandatory_fields(&self) -> &'static [MandatoryField] {
        match self {
            ReportProfile::Html => &[
                MandatoryField::Summary,
                MandatoryField::Description,
                MandatoryField::Epic,
            ],
            ReportProfile::Spreadsheet => &[
                MandatoryField::Summary,
                MandatoryField::Description,
                MandatoryField::FixVersion,
                MandatoryField::Epic,
                MandatoryField::AcceptanceCriteria,
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub missing: Vec<MandatoryField>,
    pub criteria: CriteriaVerdict,
    pub duplicate: bool,
}

impl ValidationResult {
    /// Comma-joined field labels, or "None" when nothing is missing.
    pub fn missing_labels(&self) -> String {
        if self.missing.is_empty() {
            "None".to_string()
        } else {
            self.missing
                .iter()
                .map(|field| field.label())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportRow {
    pub issue: Issue,
    pub result: ValidationResult,
}

#[derive(Debug, Clone)]
pub struct ReportBucket {
    pub title: String,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub project: String,
    pub fix_version: Option<String>,
    pub generated_at: NaiveDateTime,
    pub buckets: Vec<ReportBucket>,
    pub total: usize,
}

impl Report {
    pub fn fix_version_label(&self) -> &str {
        self.fix_version.as_deref().unwrap_or("N/A")
    }

    pub fn subject(&self) -> String {
        format!(
            "[Issue Validation] {} - {} - {} Issues Scanned",
            self.project,
            self.fix_version.as_deref().unwrap_or("No Version"),
            self.total
        )
    }

    /// Rows across all buckets, bucket order first, source order within.
    pub fn rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.buckets.iter().flat_map(|bucket| bucket.rows.iter())
    }
}
