//! Prompt assembly for the AI routes.
//!
//! The business rules embedded in the prompts (slow-merge threshold, digest sections,
//! diff budget) live in [`PromptPolicy`]; the builders only render them.

use crate::context::{NormalizedContext, DEFAULT_REPO_NAME};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Messages sent to a completion endpoint in a single call.
pub type PromptMessages = Vec<ChatMessage>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Interactive Q&A grounded in the dashboard context.
    Chat,
    /// Executive digest of the selected repository.
    Summarize,
}

/// Business constants rendered into prompts.
#[derive(Debug, Clone)]
pub struct PromptPolicy {
    /// Average cycle time (days) above which merges count as slow.
    pub slow_cycle_threshold_days: f64,
    pub chat_persona: &'static str,
    pub digest_persona: &'static str,
    /// Digest sections as `(header, instruction)`.
    pub digest_sections: [(&'static str, &'static str); 3],
    pub diff_review_persona: &'static str,
    /// Maximum number of diff characters sent for review.
    pub diff_char_budget: usize,
}

impl Default for PromptPolicy {
    fn default() -> Self {
        Self {
            slow_cycle_threshold_days: 5.0,
            chat_persona: "You are a Technical Lead AI specialized in GitHub productivity.",
            digest_persona:
                "You are an expert Productivity Analyst. Create a high-level executive summary.",
            digest_sections: [
                ("Velocity", "Evaluate the {avg} day speed."),
                ("Risk Areas", "Analyze these PRs for bottlenecks: {prs}."),
                ("Strategy", "Give one actionable technical tip."),
            ],
            diff_review_persona: "You are a Senior Technical Lead. Summarize this PR diff into Core Changes, Risks, and Refactors.",
            diff_char_budget: 4000,
        }
    }
}

/// Text added to the chat system message when the known cycle time is over the threshold.
pub const SLOW_MERGE_ADVISORY: &str =
    "Merges in this repository are slow. Recommend breaking pull requests into smaller chunks.";

impl PromptPolicy {
    /// Renders the system/user pair for `mode`.
    pub fn build_messages(
        &self,
        ctx: &NormalizedContext,
        user_query: &str,
        mode: PromptMode,
    ) -> PromptMessages {
        match mode {
            PromptMode::Chat => vec![
                ChatMessage::system(self.chat_system_prompt(ctx)),
                ChatMessage::user(user_query),
            ],
            PromptMode::Summarize => vec![
                ChatMessage::system(self.digest_persona),
                ChatMessage::user(self.digest_prompt(ctx)),
            ],
        }
    }

    /// Asks for a review of a pull request diff, truncated to the diff budget.
    pub fn build_diff_review_messages(&self, diff: &str) -> PromptMessages {
        let excerpt: String = diff.chars().take(self.diff_char_budget).collect();
        vec![
            ChatMessage::system(self.diff_review_persona),
            ChatMessage::user(format!("Analyze this PR diff:\n{excerpt}")),
        ]
    }

    pub fn is_slow(&self, ctx: &NormalizedContext) -> bool {
        ctx.avg_cycle_days()
            .is_some_and(|days| days > self.slow_cycle_threshold_days)
    }

    fn chat_system_prompt(&self, ctx: &NormalizedContext) -> String {
        let threshold = self.slow_cycle_threshold_days;
        let mut prompt = format!(
            "{persona}\n\n\
             CRITICAL SOURCE OF TRUTH:\n\
             - Current Repository: {repo}\n\
             - Tech Stack: {language}\n\
             - Performance Metric (Cycle Time): {avg} days\n\
             - Data Volume: {count} total Pull Requests analyzed.\n\
             - Recent PR Activity: {recent}\n\n\
             STRICT INSTRUCTIONS:\n\
             1. If the user asks which repo they are looking at, you MUST mention \"{repo}\". Never say you don't have information.\n\
             2. Use the average cycle time of {avg} days to give specific advice.\n\
             3. If the cycle time is > {threshold} days, explain that merges are slow and suggest breaking PRs into smaller chunks.\n\
             4. If no specific repo is selected (i.e., the repository is \"{sentinel}\"), ask the user to click a repository card on the dashboard first.",
            persona = self.chat_persona,
            repo = ctx.repo_name,
            language = ctx.language,
            avg = ctx.avg_cycle,
            count = ctx.pr_count,
            recent = ctx.recent_pr_json(),
            sentinel = DEFAULT_REPO_NAME,
        );

        if self.is_slow(ctx) {
            prompt.push_str(&format!(
                "\n\nADVISORY: The current cycle time of {} days exceeds {} days. {}",
                ctx.avg_cycle, threshold, SLOW_MERGE_ADVISORY
            ));
        }
        if !ctx.has_repository() {
            prompt.push_str(
                "\n\nNOTE: No repository is selected. Ask the user to select a repository first.",
            );
        }

        prompt
    }

    fn digest_prompt(&self, ctx: &NormalizedContext) -> String {
        let recent = ctx.recent_pr_json();
        let sections: Vec<String> = self
            .digest_sections
            .iter()
            .map(|(header, instruction)| {
                let instruction = instruction
                    .replace("{avg}", &ctx.avg_cycle)
                    .replace("{prs}", &recent);
                format!("- {header}: {instruction}")
            })
            .collect();

        format!(
            "Perform a deep dive analysis for \"{repo}\":\n\
             - Metrics: {avg} days avg cycle.\n\
             - PR count: {count}.\n\n\
             Provide a 'Developer Digest' with:\n{sections}",
            repo = ctx.repo_name,
            avg = ctx.avg_cycle,
            count = ctx.pr_count,
            sections = sections.join("\n"),
        )
    }
}

/// The single-message prompt used by the developer coach route.
pub fn build_coach_messages(username: &str, question: &str) -> PromptMessages {
    vec![ChatMessage::user(format!(
        "GitHub Developer: {username}\nQuestion: {question}\n\nAI Coach - 3 insights:"
    ))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::normalize_context;
    use serde_json::json;

    fn selected_context(avg: serde_json::Value) -> NormalizedContext {
        normalize_context(&json!({
            "repoName": "octocat/hello-world",
            "stats": { "averageCycleTime": avg, "totalPullRequests": 12 },
            "currentLanguage": "Rust",
            "recentPRList": [{ "number": 4, "title": "Add cache..." }]
        }))
    }

    #[test]
    fn test_chat_mode_message_shape() {
        let policy = PromptPolicy::default();
        let messages =
            policy.build_messages(&selected_context(json!(2)), "Which repo is this?", PromptMode::Chat);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Which repo is this?");

        let system = &messages[0].content;
        assert!(system.contains("Current Repository: octocat/hello-world"));
        assert!(system.contains("you MUST mention \"octocat/hello-world\""));
        assert!(system.contains("> 5 days"));
        assert!(system.contains("breaking PRs into smaller chunks"));
        assert!(system.contains(r#"[{"number":4,"title":"Add cache..."}]"#));
    }

    #[test]
    fn test_chat_mode_slow_cycle_adds_advisory() {
        let policy = PromptPolicy::default();
        let messages =
            policy.build_messages(&selected_context(json!(7)), "How are we doing?", PromptMode::Chat);

        assert!(messages[0].content.contains(SLOW_MERGE_ADVISORY));
        assert!(messages[0].content.contains("cycle time of 7 days exceeds 5 days"));
    }

    #[test]
    fn test_chat_mode_fast_cycle_has_no_advisory() {
        let policy = PromptPolicy::default();
        let messages =
            policy.build_messages(&selected_context(json!("4.9")), "How are we doing?", PromptMode::Chat);

        assert!(!messages[0].content.contains(SLOW_MERGE_ADVISORY));
    }

    #[test]
    fn test_chat_mode_without_repository_asks_for_selection() {
        let policy = PromptPolicy::default();
        let messages = policy.build_messages(
            &normalize_context(&json!({})),
            "What should I fix?",
            PromptMode::Chat,
        );

        let system = &messages[0].content;
        assert!(system.contains(DEFAULT_REPO_NAME));
        assert!(system.contains("click a repository card on the dashboard"));
        assert!(system.contains("Ask the user to select a repository first."));
        assert!(system.contains("unknown days"));
    }

    #[test]
    fn test_summarize_mode_embeds_metrics_and_sections() {
        let policy = PromptPolicy::default();
        let messages =
            policy.build_messages(&selected_context(json!("3.5")), "", PromptMode::Summarize);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("executive summary"));

        let user = &messages[1].content;
        assert!(user.contains("\"octocat/hello-world\""));
        assert!(user.contains("3.5 days avg cycle"));
        assert!(user.contains("PR count: 12."));
        assert!(user.contains("- Velocity: Evaluate the 3.5 day speed."));
        assert!(user.contains(
            r#"- Risk Areas: Analyze these PRs for bottlenecks: [{"number":4,"title":"Add cache..."}]."#
        ));
        assert!(user.contains("- Strategy: Give one actionable technical tip."));
    }

    #[test]
    fn test_custom_threshold() {
        let policy = PromptPolicy {
            slow_cycle_threshold_days: 10.0,
            ..PromptPolicy::default()
        };
        let ctx = selected_context(json!(7));

        assert!(!policy.is_slow(&ctx));
        assert!(policy.build_messages(&ctx, "q", PromptMode::Chat)[0]
            .content
            .contains("> 10 days"));
    }

    #[test]
    fn test_diff_review_truncates_diff() {
        let policy = PromptPolicy::default();
        let diff = "+".repeat(5000);

        let messages = policy.build_diff_review_messages(&diff);

        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("Core Changes, Risks, and Refactors"));
        let body = messages[1]
            .content
            .strip_prefix("Analyze this PR diff:\n")
            .unwrap();
        assert_eq!(body.len(), 4000);
    }

    #[test]
    fn test_coach_messages() {
        let messages = build_coach_messages("octocat", "How do I ship faster?");

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(
            messages[0].content,
            "GitHub Developer: octocat\nQuestion: How do I ship faster?\n\nAI Coach - 3 insights:"
        );
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(ChatMessage::system("hi")).unwrap();
        assert_eq!(json, json!({ "role": "system", "content": "hi" }));
    }
}
