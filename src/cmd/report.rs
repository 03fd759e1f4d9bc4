use std::path::PathBuf;

use chrono::Local;

use crate::context::AppContext;
use crate::domain::issue::IssueQuery;
use crate::domain::report::ReportProfile;
use crate::error::AppResult;
use crate::services::mailer::parse_recipients;
use crate::workflow::report::{ReportRunRequest, RunOutcome, run_report};

#[derive(Debug, Clone)]
pub struct ReportCommandArgs {
    pub project: String,
    pub fix_version: Option<String>,
    pub mail_group: String,
    pub profile: ReportProfile,
    pub age_threshold_days: i64,
    pub save_dir: Option<PathBuf>,
    pub skip_mail: bool,
}

pub async fn run(ctx: &AppContext, args: ReportCommandArgs) -> AppResult<RunOutcome> {
    let now = Local::now();
    let request = ReportRunRequest {
        query: IssueQuery {
            project: args.project,
            fix_version: args.fix_version,
        },
        recipients: parse_recipients(&args.mail_group),
        profile: args.profile,
        age_threshold_days: args.age_threshold_days,
        save_dir: args.save_dir,
        skip_mail: args.skip_mail,
        today: now.date_naive(),
        generated_at: now.naive_local(),
    };
    run_report(ctx, request).await
}
