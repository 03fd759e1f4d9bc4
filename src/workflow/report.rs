use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use crate::context::AppContext;
use crate::domain::classify::{Classified, classify};
use crate::domain::criteria::validate_criteria;
use crate::domain::issue::{Issue, IssueQuery, MandatoryField, missing_fields};
use crate::domain::report::{
    Report, ReportBucket, ReportProfile, ReportRow, ValidationResult,
};
use crate::error::AppResult;
use crate::render::html::render_html;
use crate::render::sheet::{invalid_rows, write_workbook};
use crate::services::mailer::OutgoingReport;

pub struct ReportRunRequest {
    pub query: IssueQuery,
    pub recipients: Vec<String>,
    pub profile: ReportProfile,
    pub age_threshold_days: i64,
    /// When set, the rendered artifact is kept in this directory.
    pub save_dir: Option<PathBuf>,
    /// Write only; no mail leaves the machine. Requires `save_dir`.
    pub skip_mail: bool,
    pub today: NaiveDate,
    pub generated_at: NaiveDateTime,
}

#[derive(Debug)]
pub enum RunOutcome {
    /// Zero issues to report on; the run still succeeded.
    NothingToDo,
    Completed {
        total: usize,
        /// Empty when the mail dispatch was skipped.
        recipients: Vec<String>,
        artifact: Option<PathBuf>,
    },
}

/// The whole run, strictly sequential: fetch, validate and classify,
/// render, dispatch. Any stage error aborts the rest; a partial report
/// is never sent.
pub async fn run_report(ctx: &AppContext, request: ReportRunRequest) -> AppResult<RunOutcome> {
    let issues = ctx.issue_source.search_issues(&request.query).await?;
    tracing::info!(
        total = issues.len(),
        project = %request.query.project,
        "fetched issues"
    );
    if issues.is_empty() {
        return Ok(RunOutcome::NothingToDo);
    }

    let report = build_report(issues, &request)?;

    match request.profile {
        ReportProfile::Html => dispatch_html(ctx, &request, &report).await,
        ReportProfile::Spreadsheet => dispatch_spreadsheet(ctx, &request, &report).await,
    }
}

/// Validates every issue against the profile's mandatory fields and
/// assembles the age-bucketed report.
pub fn build_report(issues: Vec<Issue>, request: &ReportRunRequest) -> AppResult<Report> {
    let total = issues.len();
    let mandatory = request.profile.mandatory_fields();
    let classified = classify(issues, request.today, request.age_threshold_days)?;
    if !classified.duplicate_texts.is_empty() {
        tracing::info!(
            duplicates = classified.duplicate_texts.len(),
            "duplicate acceptance criteria detected"
        );
    }
    let Classified {
        old,
        new,
        duplicate_keys,
        ..
    } = classified;

    let threshold = request.age_threshold_days;
    let buckets = vec![
        bucket(
            format!("More than {threshold} Days Old"),
            old,
            mandatory,
            &duplicate_keys,
        ),
        bucket(
            format!("{threshold} Days Old or Less"),
            new,
            mandatory,
            &duplicate_keys,
        ),
    ];

    Ok(Report {
        project: request.query.project.clone(),
        fix_version: request.query.fix_version.clone(),
        generated_at: request.generated_at,
        buckets,
        total,
    })
}

fn bucket(
    title: String,
    issues: Vec<Issue>,
    mandatory: &[MandatoryField],
    duplicate_keys: &HashSet<String>,
) -> ReportBucket {
    let rows = issues
        .into_iter()
        .map(|issue| {
            let result = ValidationResult {
                missing: missing_fields(&issue, mandatory),
                criteria: validate_criteria(&issue.acceptance_criteria),
                duplicate: duplicate_keys.contains(&issue.key),
            };
            ReportRow { issue, result }
        })
        .collect();
    ReportBucket { title, rows }
}

async fn dispatch_html(
    ctx: &AppContext,
    request: &ReportRunRequest,
    report: &Report,
) -> AppResult<RunOutcome> {
    let body = render_html(report);

    let mut artifact = None;
    if let Some(dir) = &request.save_dir {
        fs::create_dir_all(dir)?;
        let path = dir.join(artifact_name("validation_report", "html", request.generated_at));
        fs::write(&path, &body)?;
        artifact = Some(path);
    }

    if request.skip_mail {
        return Ok(RunOutcome::Completed {
            total: report.total,
            recipients: Vec::new(),
            artifact,
        });
    }

    let outgoing = OutgoingReport {
        recipients: request.recipients.clone(),
        subject: report.subject(),
        html_body: body,
        attachment: None,
    };
    ctx.mailer.send_report(&outgoing).await?;

    Ok(RunOutcome::Completed {
        total: report.total,
        recipients: outgoing.recipients,
        artifact,
    })
}

async fn dispatch_spreadsheet(
    ctx: &AppContext,
    request: &ReportRunRequest,
    report: &Report,
) -> AppResult<RunOutcome> {
    let rows = invalid_rows(report);
    if rows.is_empty() {
        return Ok(RunOutcome::NothingToDo);
    }

    // Without a save directory the workbook is a scratch file that is
    // removed once the mail is out.
    let (dir, keep) = match &request.save_dir {
        Some(dir) => (dir.clone(), true),
        None => (std::env::temp_dir(), false),
    };
    fs::create_dir_all(&dir)?;
    let path = dir.join(artifact_name("invalid_issues", "xlsx", request.generated_at));
    write_workbook(&rows, &path)?;

    if request.skip_mail {
        return Ok(RunOutcome::Completed {
            total: report.total,
            recipients: Vec::new(),
            artifact: Some(path),
        });
    }

    let outgoing = OutgoingReport {
        recipients: request.recipients.clone(),
        subject: report.subject(),
        html_body: render_html(report),
        attachment: Some(path.clone()),
    };
    ctx.mailer.send_report(&outgoing).await?;

    let artifact = if keep {
        Some(path)
    } else {
        fs::remove_file(&path)?;
        None
    };
    Ok(RunOutcome::Completed {
        total: report.total,
        recipients: outgoing.recipients,
        artifact,
    })
}

fn artifact_name(stem: &str, extension: &str, generated_at: NaiveDateTime) -> String {
    format!(
        "{stem}_{}.{extension}",
        generated_at.format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::criteria::CriteriaVerdict;
    use crate::error::AppError;
    use crate::services::{IssueSourceService, ReportMailerService};

    struct FixedSource {
        issues: Vec<Issue>,
    }

    #[async_trait]
    impl IssueSourceService for FixedSource {
        async fn search_issues(&self, _query: &IssueQuery) -> AppResult<Vec<Issue>> {
            Ok(self.issues.clone())
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingReport>>,
    }

    #[async_trait]
    impl ReportMailerService for RecordingMailer {
        async fn send_report(&self, outgoing: &OutgoingReport) -> AppResult<()> {
            self.sent.lock().unwrap().push(outgoing.clone());
            Ok(())
        }
    }

    fn context(issues: Vec<Issue>, mailer: Arc<RecordingMailer>) -> AppContext {
        AppContext::new(Arc::new(FixedSource { issues }), mailer)
    }

    fn request(profile: ReportProfile) -> ReportRunRequest {
        ReportRunRequest {
            query: IssueQuery {
                project: "PROJ".to_string(),
                fix_version: None,
            },
            recipients: vec!["qa@example.com".to_string()],
            profile,
            age_threshold_days: 60,
            save_dir: None,
            skip_mail: false,
            today: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            generated_at: NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(10, 15, 0)
                .unwrap(),
        }
    }

    /// Issue 1: old, missing summary, structurally valid criteria.
    /// Issues 2 and 3: new, sharing criteria text up to case.
    fn scenario() -> Vec<Issue> {
        let mut first = Issue::sample("PROJ-101");
        first.summary = String::new();
        first.created = "2025-01-10T12:00:00.000+0000".to_string();
        first.acceptance_criteria = "Given A When B Then C".to_string();

        let mut second = Issue::sample("PROJ-102");
        second.summary = String::new();
        second.description = String::new();
        second.created = "2025-05-20T12:00:00.000+0000".to_string();
        second.acceptance_criteria = "Given X When Y Then Z".to_string();

        let mut third = Issue::sample("PROJ-103");
        third.created = "2025-05-21T12:00:00.000+0000".to_string();
        third.acceptance_criteria = "given x when y then z".to_string();

        vec![first, second, third]
    }

    #[test]
    fn report_buckets_and_flags_the_scenario() {
        let report = build_report(scenario(), &request(ReportProfile::Html)).unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.buckets.len(), 2);
        assert_eq!(report.buckets[0].title, "More than 60 Days Old");
        assert_eq!(report.buckets[1].title, "60 Days Old or Less");

        let old_keys: Vec<&str> = report.buckets[0]
            .rows
            .iter()
            .map(|row| row.issue.key.as_str())
            .collect();
        let new_keys: Vec<&str> = report.buckets[1]
            .rows
            .iter()
            .map(|row| row.issue.key.as_str())
            .collect();
        assert_eq!(old_keys, vec!["PROJ-101"]);
        assert_eq!(new_keys, vec!["PROJ-102", "PROJ-103"]);

        let first = &report.buckets[0].rows[0];
        assert_eq!(first.result.missing, vec![MandatoryField::Summary]);
        assert_eq!(first.result.criteria, CriteriaVerdict::Valid);
        assert!(!first.result.duplicate);

        let second = &report.buckets[1].rows[0];
        assert_eq!(
            second.result.missing,
            vec![MandatoryField::Summary, MandatoryField::Description]
        );
        assert!(!second.result.duplicate);

        let third = &report.buckets[1].rows[1];
        assert!(third.result.missing.is_empty());
        assert!(third.result.duplicate);
    }

    #[test]
    fn shared_criteria_text_is_reported_as_duplicated() {
        let classified = classify(
            scenario(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            60,
        )
        .unwrap();
        assert!(classified.duplicate_texts.contains("given x when y then z"));
        assert_eq!(classified.duplicate_texts.len(), 1);
    }

    #[tokio::test]
    async fn empty_fetch_is_nothing_to_do() {
        let mailer = Arc::new(RecordingMailer::default());
        let ctx = context(Vec::new(), mailer.clone());
        let outcome = run_report(&ctx, request(ReportProfile::Html)).await.unwrap();
        assert!(matches!(outcome, RunOutcome::NothingToDo));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn html_run_dispatches_one_mail() {
        let mailer = Arc::new(RecordingMailer::default());
        let ctx = context(scenario(), mailer.clone());
        let outcome = run_report(&ctx, request(ReportProfile::Html)).await.unwrap();

        match outcome {
            RunOutcome::Completed {
                total, recipients, ..
            } => {
                assert_eq!(total, 3);
                assert_eq!(recipients, vec!["qa@example.com".to_string()]);
            }
            other => panic!("expected Completed, got {other:?}"),
        }

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].subject,
            "[Issue Validation] PROJ - No Version - 3 Issues Scanned"
        );
        assert!(sent[0].attachment.is_none());
        assert!(sent[0].html_body.contains("PROJ-101"));
    }

    #[tokio::test]
    async fn spreadsheet_run_without_invalid_issues_sends_nothing() {
        let mailer = Arc::new(RecordingMailer::default());
        // Fully populated issues: nothing missing, nothing to export.
        let ctx = context(vec![Issue::sample("PROJ-110")], mailer.clone());
        let outcome = run_report(&ctx, request(ReportProfile::Spreadsheet))
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::NothingToDo));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn spreadsheet_run_attaches_and_keeps_the_saved_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let ctx = context(scenario(), mailer.clone());
        let mut req = request(ReportProfile::Spreadsheet);
        req.save_dir = Some(dir.path().to_path_buf());

        let outcome = run_report(&ctx, req).await.unwrap();
        let artifact = match outcome {
            RunOutcome::Completed { artifact, .. } => artifact.unwrap(),
            other => panic!("expected Completed, got {other:?}"),
        };
        assert_eq!(
            artifact.file_name().unwrap().to_str().unwrap(),
            "invalid_issues_20250601_101500.xlsx"
        );
        assert!(artifact.exists());

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].attachment.as_deref(), Some(artifact.as_path()));
    }

    #[tokio::test]
    async fn skip_mail_writes_the_artifact_without_dispatching() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let ctx = context(scenario(), mailer.clone());
        let mut req = request(ReportProfile::Html);
        req.save_dir = Some(dir.path().to_path_buf());
        req.skip_mail = true;

        let outcome = run_report(&ctx, req).await.unwrap();
        match outcome {
            RunOutcome::Completed {
                recipients,
                artifact,
                ..
            } => {
                assert!(recipients.is_empty());
                assert!(artifact.unwrap().exists());
            }
            other => panic!("expected Completed, got {other:?}"),
        }
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_created_date_aborts_before_dispatch() {
        let mut issue = Issue::sample("PROJ-120");
        issue.created = "yesterday".to_string();
        let mailer = Arc::new(RecordingMailer::default());
        let ctx = context(vec![issue], mailer.clone());

        let err = run_report(&ctx, request(ReportProfile::Html))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DateParse { .. }));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }
}
