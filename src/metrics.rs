use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MILLIS_PER_DAY: f64 = 86_400_000.0;
const TITLE_DISPLAY_CHARS: usize = 30;
const TITLE_ELLIPSIS: &str = "...";

/// The pull request fields the cycle-time aggregation reads.
///
/// Timestamps stay as the raw strings GitHub sent, so that an unparsable value
/// shows up as a `NaN` cycle time instead of rejecting the whole payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestRecord {
    #[serde(default)]
    pub number: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub closed_at: Option<String>,
}

/// Keeps any non-falsy JSON value as text; non-string values never parse as dates.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) => Some(s),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl PullRequestRecord {
    pub fn is_closed(&self) -> bool {
        self.closed_at.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Cycle time of a single closed pull request.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CycleMetric {
    pub number: u64,
    /// Display title: the first 30 characters followed by an ellipsis.
    pub title: String,
    /// Days between creation and closure. `NaN` (serialized as `null`) when a
    /// timestamp cannot be parsed.
    pub cycle_days: f64,
}

/// The public response structure for the pull request cycle-time route.
#[derive(Debug, Serialize, Clone)]
pub struct CycleTimeReport {
    pub prs: Vec<CycleMetric>,
    /// Average cycle time formatted with one decimal place.
    pub avg_cycle_days: String,
    pub total_closed_prs: usize,
    pub total_prs: usize,
}

/// Calculates per-PR and average cycle times over the closed pull requests.
pub fn compute_cycle_metrics(pull_requests: &[PullRequestRecord]) -> CycleTimeReport {
    let prs: Vec<CycleMetric> = pull_requests
        .iter()
        .filter(|pr| pr.is_closed())
        .map(|pr| CycleMetric {
            number: pr.number,
            title: display_title(&pr.title),
            cycle_days: cycle_days(pr.created_at.as_deref(), pr.closed_at.as_deref()),
        })
        .collect();

    let avg_cycle_days = if prs.is_empty() {
        "0.0".to_string()
    } else {
        let total: f64 = prs.iter().map(|pr| pr.cycle_days).sum();
        format!("{:.1}", total / prs.len() as f64)
    };

    CycleTimeReport {
        total_closed_prs: prs.len(),
        total_prs: pull_requests.len(),
        prs,
        avg_cycle_days,
    }
}

/// Truncates to the first 30 characters and always appends the ellipsis.
pub fn display_title(title: &str) -> String {
    let mut display: String = title.chars().take(TITLE_DISPLAY_CHARS).collect();
    display.push_str(TITLE_ELLIPSIS);
    display
}

/// Elapsed days between two RFC 3339 timestamps. Reversed timestamps yield a
/// negative value; a missing or unparsable timestamp yields `NaN`.
fn cycle_days(created_at: Option<&str>, closed_at: Option<&str>) -> f64 {
    let (Some(created_at), Some(closed_at)) = (created_at, closed_at) else {
        return f64::NAN;
    };

    match (
        DateTime::parse_from_rfc3339(created_at),
        DateTime::parse_from_rfc3339(closed_at),
    ) {
        (Ok(created), Ok(closed)) => {
            closed.signed_duration_since(created).num_milliseconds() as f64 / MILLIS_PER_DAY
        }
        _ => f64::NAN,
    }
}
