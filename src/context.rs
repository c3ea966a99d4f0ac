//! Normalization of the dashboard's analytics context.
//!
//! The frontend posts a loosely-shaped `context` object alongside every AI request.
//! [`normalize_context`] reads the handful of fields the prompts need and substitutes a
//! default for each one that is absent, so prompt assembly always works on a fully
//! populated [`NormalizedContext`].

use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_REPO_NAME: &str = "No specific repository selected";
pub const DEFAULT_AVG_CYCLE: &str = "unknown";
pub const DEFAULT_LANGUAGE: &str = "various technologies";

/// The analytics context with every field present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedContext {
    pub repo_name: String,
    /// Average cycle time as displayed to the model, e.g. `"3.2"` or `"unknown"`.
    pub avg_cycle: String,
    pub pr_count: u64,
    pub language: String,
    pub recent_pr_list: Vec<Value>,
}

impl Default for NormalizedContext {
    fn default() -> Self {
        Self {
            repo_name: DEFAULT_REPO_NAME.to_string(),
            avg_cycle: DEFAULT_AVG_CYCLE.to_string(),
            pr_count: 0,
            language: DEFAULT_LANGUAGE.to_string(),
            recent_pr_list: Vec::new(),
        }
    }
}

impl NormalizedContext {
    /// False while the dashboard has no repository selected.
    pub fn has_repository(&self) -> bool {
        self.repo_name != DEFAULT_REPO_NAME
    }

    /// The average cycle time in days, when it is numeric.
    pub fn avg_cycle_days(&self) -> Option<f64> {
        self.avg_cycle
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|days| days.is_finite())
    }

    /// The recent pull request list as JSON text.
    pub fn recent_pr_json(&self) -> String {
        Value::Array(self.recent_pr_list.clone()).to_string()
    }
}

/// Extracts the recognized fields from `raw`, each falling back to its default
/// independently. Unexpected shapes (e.g. `stats` not being an object) are treated
/// as absent.
pub fn normalize_context(raw: &Value) -> NormalizedContext {
    let defaults = NormalizedContext::default();
    let stats = raw.get("stats");

    NormalizedContext {
        repo_name: text_field(raw.get("repoName")).unwrap_or(defaults.repo_name),
        avg_cycle: text_field(stats.and_then(|s| s.get("averageCycleTime")))
            .unwrap_or(defaults.avg_cycle),
        pr_count: count_field(stats.and_then(|s| s.get("totalPullRequests")))
            .unwrap_or(defaults.pr_count),
        language: text_field(raw.get("currentLanguage")).unwrap_or(defaults.language),
        recent_pr_list: match raw.get("recentPRList") {
            Some(Value::Array(items)) => items.clone(),
            _ => defaults.recent_pr_list,
        },
    }
}

/// A present, non-empty string or a non-zero number, rendered as text.
fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn count_field(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_context_is_all_defaults() {
        let ctx = normalize_context(&json!({}));

        assert_eq!(ctx, NormalizedContext::default());
        assert_eq!(ctx.repo_name, DEFAULT_REPO_NAME);
        assert_eq!(ctx.avg_cycle, "unknown");
        assert_eq!(ctx.pr_count, 0);
        assert_eq!(ctx.language, "various technologies");
        assert!(ctx.recent_pr_list.is_empty());
        assert!(!ctx.has_repository());
    }

    #[test]
    fn test_null_context_is_all_defaults() {
        assert_eq!(normalize_context(&Value::Null), NormalizedContext::default());
    }

    #[test]
    fn test_full_context() {
        let raw = json!({
            "repoName": "octocat/hello-world",
            "stats": { "averageCycleTime": "3.4", "totalPullRequests": 42 },
            "currentLanguage": "Rust",
            "recentPRList": [{ "number": 1, "title": "Fix bug..." }]
        });

        let ctx = normalize_context(&raw);

        assert_eq!(ctx.repo_name, "octocat/hello-world");
        assert_eq!(ctx.avg_cycle, "3.4");
        assert_eq!(ctx.avg_cycle_days(), Some(3.4));
        assert_eq!(ctx.pr_count, 42);
        assert_eq!(ctx.language, "Rust");
        assert_eq!(ctx.recent_pr_list.len(), 1);
        assert!(ctx.has_repository());
    }

    #[test]
    fn test_numeric_average_cycle_time() {
        let ctx = normalize_context(&json!({ "stats": { "averageCycleTime": 7 } }));

        assert_eq!(ctx.avg_cycle, "7");
        assert_eq!(ctx.avg_cycle_days(), Some(7.0));
    }

    #[test]
    fn test_fields_default_independently() {
        let ctx = normalize_context(&json!({
            "repoName": "",
            "stats": { "totalPullRequests": 5 },
            "currentLanguage": "Go"
        }));

        assert_eq!(ctx.repo_name, DEFAULT_REPO_NAME);
        assert_eq!(ctx.avg_cycle, DEFAULT_AVG_CYCLE);
        assert_eq!(ctx.avg_cycle_days(), None);
        assert_eq!(ctx.pr_count, 5);
        assert_eq!(ctx.language, "Go");
    }

    #[test]
    fn test_malformed_shapes_fall_back() {
        let ctx = normalize_context(&json!({
            "repoName": 12,
            "stats": "fast",
            "currentLanguage": ["Rust"],
            "recentPRList": { "number": 1 }
        }));

        assert_eq!(ctx.repo_name, "12");
        assert_eq!(ctx.avg_cycle, DEFAULT_AVG_CYCLE);
        assert_eq!(ctx.pr_count, 0);
        assert_eq!(ctx.language, DEFAULT_LANGUAGE);
        assert!(ctx.recent_pr_list.is_empty());
    }

    #[test]
    fn test_zero_average_is_treated_as_absent() {
        let ctx = normalize_context(&json!({ "stats": { "averageCycleTime": 0 } }));
        assert_eq!(ctx.avg_cycle, DEFAULT_AVG_CYCLE);
    }

    #[test]
    fn test_recent_pr_json() {
        let ctx = normalize_context(&json!({ "recentPRList": [{ "number": 3 }] }));
        assert_eq!(ctx.recent_pr_json(), r#"[{"number":3}]"#);
        assert_eq!(NormalizedContext::default().recent_pr_json(), "[]");
    }
}
