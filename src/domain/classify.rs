use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::domain::issue::Issue;
use crate::error::{AppError, AppResult};

pub const DEFAULT_AGE_THRESHOLD_DAYS: i64 = 60;

#[derive(Debug)]
pub struct Classified {
    /// Issues strictly older than the threshold, in source order.
    pub old: Vec<Issue>,
    /// Issues at or under the threshold, in source order.
    pub new: Vec<Issue>,
    /// Normalized acceptance-criteria texts seen on more than one issue.
    pub duplicate_texts: HashSet<String>,
    /// Keys of the second-and-later issues repeating a text. The first
    /// occurrence is never flagged.
    pub duplicate_keys: HashSet<String>,
}

/// The identity used for duplicate detection: trimmed, lower-cased.
pub fn normalize_criteria(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Stable partition by age plus duplicate acceptance-criteria detection
/// across the whole batch. Age counts whole days between `today` and the
/// date portion of the created timestamp; the time of day is discarded.
pub fn classify(issues: Vec<Issue>, today: NaiveDate, threshold_days: i64) -> AppResult<Classified> {
    let mut first_seen: HashMap<String, String> = HashMap::new();
    let mut duplicate_texts = HashSet::new();
    let mut duplicate_keys = HashSet::new();
    for issue in &issues {
        let normalized = normalize_criteria(&issue.acceptance_criteria);
        if normalized.is_empty() {
            continue;
        }
        if first_seen.contains_key(&normalized) {
            duplicate_texts.insert(normalized);
            duplicate_keys.insert(issue.key.clone());
        } else {
            first_seen.insert(normalized, issue.key.clone());
        }
    }

    let mut old = Vec::new();
    let mut new = Vec::new();
    for issue in issues {
        let age = (today - created_date(&issue)?).num_days();
        if age > threshold_days {
            old.push(issue);
        } else {
            new.push(issue);
        }
    }

    Ok(Classified {
        old,
        new,
        duplicate_texts,
        duplicate_keys,
    })
}

fn created_date(issue: &Issue) -> AppResult<NaiveDate> {
    let date_part = issue.created.get(..10).unwrap_or(&issue.created);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| AppError::DateParse {
        key: issue.key.clone(),
        value: issue.created.clone(),
    })
}
