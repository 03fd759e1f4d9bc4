mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod render;
mod services;
mod workflow;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::report::{self, ReportCommandArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::domain::classify::DEFAULT_AGE_THRESHOLD_DAYS;
use crate::domain::report::ReportProfile;
use crate::error::AppResult;
use crate::infra::jira::JiraClient;
use crate::infra::mailer::SmtpMailer;
use crate::workflow::report::RunOutcome;

#[derive(Parser)]
#[command(
    name = "jiravet",
    author,
    version,
    about = "Issue-tracker validation report CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a project's issues, validate them, and mail the findings.
    Report(ReportArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct ReportArgs {
    /// Project identifier, e.g. "PROJ".
    #[arg(long = "project-id", visible_alias = "project")]
    project_id: String,
    /// Only scan issues tagged with this fix version.
    #[arg(long)]
    fix_version: Option<String>,
    /// Comma-separated recipient addresses.
    #[arg(long)]
    mail_group: String,
    /// Report shape to produce.
    #[arg(long, value_enum, default_value_t = ProfileArg::Html)]
    profile: ProfileArg,
    /// Issues older than this many days land in the "old" bucket.
    #[arg(long, default_value_t = DEFAULT_AGE_THRESHOLD_DAYS)]
    age_threshold: i64,
    /// Keep the rendered artifact in this directory.
    #[arg(long)]
    save_dir: Option<PathBuf>,
    /// Write the artifact only; skip the mail dispatch.
    #[arg(long, requires = "save_dir")]
    skip_mail: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    /// Age-bucketed HTML tables, delivered by mail.
    Html,
    /// Flat spreadsheet of issues with missing fields.
    Sheet,
}

impl From<ProfileArg> for ReportProfile {
    fn from(value: ProfileArg) -> Self {
        match value {
            ProfileArg::Html => ReportProfile::Html,
            ProfileArg::Sheet => ReportProfile::Spreadsheet,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => {
            config_cmd::run(args.command)?;
            Ok(())
        }
        Commands::Report(args) => run_report(args).await,
    }
}

async fn run_report(args: ReportArgs) -> AppResult<()> {
    let config = AppConfig::load()?;

    if config.jira_base_url.is_none() {
        eprintln!("Warning: Jira base URL not configured; the issue fetch will fail.");
    }
    if config.jira_user.is_none() || config.jira_token.is_none() {
        eprintln!("Warning: Jira credentials not configured; the issue fetch will fail.");
    }
    if !args.skip_mail && config.smtp.host.is_none() {
        eprintln!("Warning: SMTP host not configured; the report dispatch will fail.");
    }
    if !args.skip_mail && config.smtp.from.is_none() {
        eprintln!("Warning: sender address not configured; the report dispatch will fail.");
    }

    let issue_source = Arc::new(JiraClient::new(
        config.jira_base_url.clone(),
        config.jira_user.clone(),
        config.jira_token.clone(),
        config.epic_field.clone(),
        config.criteria_field.clone(),
    ));
    let mailer = Arc::new(SmtpMailer::new(config.smtp));
    let context = AppContext::new(issue_source, mailer);

    let outcome = report::run(
        &context,
        ReportCommandArgs {
            project: args.project_id,
            fix_version: args.fix_version,
            mail_group: args.mail_group,
            profile: args.profile.into(),
            age_threshold_days: args.age_threshold,
            save_dir: args.save_dir,
            skip_mail: args.skip_mail,
        },
    )
    .await?;

    match outcome {
        RunOutcome::NothingToDo => {
            println!("No matching issues found; nothing to report.");
        }
        RunOutcome::Completed {
            total,
            recipients,
            artifact,
        } => {
            if recipients.is_empty() {
                println!("Report generated ({total} issues scanned).");
            } else {
                println!(
                    "Report sent to {} ({total} issues scanned).",
                    recipients.join(", ")
                );
            }
            if let Some(path) = artifact {
                println!("Saved report artifact: {}", path.display());
            }
        }
    }

    Ok(())
}
