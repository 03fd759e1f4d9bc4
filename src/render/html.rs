use crate::domain::criteria::CriteriaVerdict;
use crate::domain::report::{Report, ReportBucket, ReportRow};

/// Renders the age-bucketed validation report as a self-contained HTML
/// document. Every issue-sourced string passes through [`escape`];
/// nothing else may reach the output unescaped.
pub fn render_html(report: &Report) -> String {
    let mut out = String::new();
    out.push_str("<html>\n<body>\n");
    out.push_str(&format!(
        "<h2>Validation Report for {} - Fix Version: {}</h2>\n",
        escape(&report.project),
        escape(report.fix_version_label()),
    ));
    for bucket in &report.buckets {
        push_bucket(&mut out, bucket);
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn push_bucket(out: &mut String, bucket: &ReportBucket) {
    out.push_str(&format!("<h3>{}</h3>\n", escape(&bucket.title)));
    out.push_str("<table border=\"1\" cellpadding=\"5\" cellspacing=\"0\">\n");
    out.push_str(
        "<tr><th>Issue Key</th><th>Summary</th><th>Missing Fields</th><th>Acceptance Criteria</th></tr>\n",
    );
    for row in &bucket.rows {
        push_row(out, row);
    }
    out.push_str("</table>\n");
}

fn push_row(out: &mut String, row: &ReportRow) {
    let summary = if row.issue.summary.trim().is_empty() {
        "---"
    } else {
        row.issue.summary.as_str()
    };
    let mut verdict = row.result.criteria.label().to_string();
    if row.result.duplicate {
        verdict.push_str(" (Duplicate)");
    }
    let criteria_alert = row.result.criteria != CriteriaVerdict::Valid || row.result.duplicate;

    out.push_str("<tr>");
    push_cell(out, &row.issue.key, false);
    push_cell(out, summary, false);
    push_cell(out, &row.result.missing_labels(), !row.result.missing.is_empty());
    push_cell(out, &verdict, criteria_alert);
    out.push_str("</tr>\n");
}

fn push_cell(out: &mut String, text: &str, alert: bool) {
    if alert {
        out.push_str(&format!("<td style=\"color:red\">{}</td>", escape(text)));
    } else {
        out.push_str(&format!("<td>{}</td>", escape(text)));
    }
}

/// Minimal HTML entity escaping for text nodes and attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
