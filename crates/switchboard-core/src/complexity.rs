//! Heuristic task complexity scoring.
//!
//! Scores a user message (plus conversation length) into a small integer and
//! maps it onto a [`TaskComplexity`] tier:
//!
//! | Signal                                   | Points     |
//! |------------------------------------------|------------|
//! | estimated tokens > 500 / > 200           | +2 / +1    |
//! | fenced code > 100 lines / > 30 lines     | +2 / +1    |
//! | complex keyword (refactor, migration...) | +2         |
//! | multi-file scope ("12 files", ...)       | +2         |
//! | history > 10 / > 5 messages              | +2 / +1    |
//! | short question                           | -1         |
//! | simple keyword (typo, rename, quick...)  | -2         |
//!
//! Deductions floor at zero. `<= 2` is simple, `3..=5` moderate, `> 5` complex.

use std::sync::LazyLock;

use regex::Regex;
use switchboard_types::llm::Message;
use switchboard_types::routing::TaskComplexity;

const LONG_MESSAGE_TOKENS: usize = 500;
const MEDIUM_MESSAGE_TOKENS: usize = 200;
const LARGE_CODE_LINES: usize = 100;
const MEDIUM_CODE_LINES: usize = 30;
const LONG_HISTORY: usize = 10;
const MEDIUM_HISTORY: usize = 5;
const SHORT_QUESTION_TOKENS: usize = 50;

const COMPLEX_KEYWORDS: &[&str] = &[
    "architecture",
    "architect",
    "refactor",
    "optimize",
    "optimization",
    "migration",
    "migrate",
    "redesign",
    "restructure",
    "overhaul",
    "scalability",
    "performance",
    "concurrency",
    "distributed",
    "implement",
    "design pattern",
    "system design",
    "security audit",
];

const SIMPLE_KEYWORDS: &[&str] = &[
    "fix typo",
    "typo",
    "rename",
    "quick",
    "small change",
    "minor change",
    "one-liner",
];

static MULTI_FILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d+\s+files\b|\b(multiple|several|many|all)\s+(the\s+)?files\b|\b(entire|whole)\s+(codebase|project|repo|repository)\b|\bacross\s+(the\s+)?(codebase|project|modules|files)\b",
    )
    .expect("multi-file pattern is valid")
});

static QUESTION_OPENER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(what|how|why)\b").expect("question pattern is valid"));

/// Result of a detailed analysis, kept for observability and tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexityAnalysis {
    pub complexity: TaskComplexity,
    pub score: u32,
    /// Human-readable description of every heuristic that fired.
    pub reasons: Vec<String>,
}

/// Stateless, deterministic complexity scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexityAnalyzer;

impl ComplexityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Classify a message given the conversation so far.
    pub fn analyze(&self, message: &str, history: &[Message]) -> TaskComplexity {
        self.analyze_detailed(message, history).complexity
    }

    /// Classify a message and report the score and the heuristics that fired.
    pub fn analyze_detailed(&self, message: &str, history: &[Message]) -> ComplexityAnalysis {
        let mut score: u32 = 0;
        let mut reasons = Vec::new();
        let lower = message.to_lowercase();
        let tokens = estimate_tokens(message);

        if tokens > LONG_MESSAGE_TOKENS {
            score += 2;
            reasons.push(format!("long message (~{tokens} tokens)"));
        } else if tokens > MEDIUM_MESSAGE_TOKENS {
            score += 1;
            reasons.push(format!("medium-length message (~{tokens} tokens)"));
        }

        let code_lines = count_code_lines(message);
        if code_lines > LARGE_CODE_LINES {
            score += 2;
            reasons.push(format!("large code block ({code_lines} lines)"));
        } else if code_lines > MEDIUM_CODE_LINES {
            score += 1;
            reasons.push(format!("code block ({code_lines} lines)"));
        }

        if let Some(keyword) = COMPLEX_KEYWORDS.iter().find(|k| lower.contains(*k)) {
            score += 2;
            reasons.push(format!("complex keyword: {keyword}"));
        }

        if let Some(m) = MULTI_FILE_PATTERN.find(message) {
            score += 2;
            reasons.push(format!("multi-file scope: \"{}\"", m.as_str()));
        }

        if history.len() > LONG_HISTORY {
            score += 2;
            reasons.push(format!("long conversation ({} messages)", history.len()));
        } else if history.len() > MEDIUM_HISTORY {
            score += 1;
            reasons.push(format!("ongoing conversation ({} messages)", history.len()));
        }

        if is_short_question(message, tokens) {
            score = score.saturating_sub(1);
            reasons.push("short question".to_string());
        }

        if let Some(keyword) = SIMPLE_KEYWORDS.iter().find(|k| lower.contains(*k)) {
            score = score.saturating_sub(2);
            reasons.push(format!("simple keyword: {keyword}"));
        }

        let complexity = complexity_for_score(score);
        tracing::debug!(score, %complexity, ?reasons, "Scored task complexity");

        ComplexityAnalysis {
            complexity,
            score,
            reasons,
        }
    }
}

/// Map a raw score onto a tier.
pub fn complexity_for_score(score: u32) -> TaskComplexity {
    match score {
        0..=2 => TaskComplexity::Simple,
        3..=5 => TaskComplexity::Moderate,
        _ => TaskComplexity::Complex,
    }
}

/// Rough token estimate: four characters per token, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Count lines inside fenced (```) code blocks. An unclosed fence runs to the end.
fn count_code_lines(text: &str) -> usize {
    let mut in_block = false;
    let mut lines = 0;
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_block = !in_block;
            continue;
        }
        if in_block {
            lines += 1;
        }
    }
    lines
}

fn is_short_question(message: &str, tokens: usize) -> bool {
    let trimmed = message.trim();
    tokens < SHORT_QUESTION_TOKENS && (trimmed.ends_with('?') || QUESTION_OPENER.is_match(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("question {i}"))
                } else {
                    Message::assistant(format!("answer {i}"))
                }
            })
            .collect()
    }

    fn code_block(lines: usize) -> String {
        let body: Vec<String> = (0..lines).map(|i| format!("let x{i} = {i};")).collect();
        format!("```rust\n{}\n```", body.join("\n"))
    }

    #[test]
    fn test_score_mapping_boundaries() {
        for score in 0..=2 {
            assert_eq!(complexity_for_score(score), TaskComplexity::Simple, "score {score}");
        }
        for score in 3..=5 {
            assert_eq!(complexity_for_score(score), TaskComplexity::Moderate, "score {score}");
        }
        for score in 6..=12 {
            assert_eq!(complexity_for_score(score), TaskComplexity::Complex, "score {score}");
        }
    }

    #[test]
    fn test_greeting_is_simple() {
        let analysis = ComplexityAnalyzer::new().analyze_detailed("hello there", &[]);
        assert_eq!(analysis.score, 0);
        assert_eq!(analysis.complexity, TaskComplexity::Simple);
        assert!(analysis.reasons.is_empty());
    }

    #[test]
    fn test_refactor_across_codebase_is_moderate() {
        let analysis = ComplexityAnalyzer::new()
            .analyze_detailed("Please refactor the error handling in the entire codebase", &[]);
        assert_eq!(analysis.score, 4);
        assert_eq!(analysis.complexity, TaskComplexity::Moderate);
        assert!(analysis.reasons.iter().any(|r| r.contains("refactor")));
        assert!(analysis.reasons.iter().any(|r| r.contains("multi-file")));
    }

    #[test]
    fn test_everything_at_once_is_complex() {
        let message = format!(
            "We need a migration plan touching 14 files.\n{}",
            "Context line describing the current module layout. ".repeat(45)
        );
        let analysis = ComplexityAnalyzer::new().analyze_detailed(&message, &history(11));
        // long message +2, keyword +2, multi-file +2, long history +2
        assert_eq!(analysis.score, 8);
        assert_eq!(analysis.complexity, TaskComplexity::Complex);
    }

    #[test]
    fn test_message_length_tiers() {
        let analyzer = ComplexityAnalyzer::new();
        let medium = "a".repeat(804); // 201 tokens
        let long = "a".repeat(2004); // 501 tokens
        assert_eq!(analyzer.analyze_detailed(&medium, &[]).score, 1);
        assert_eq!(analyzer.analyze_detailed(&long, &[]).score, 2);
        assert_eq!(analyzer.analyze_detailed(&"a".repeat(800), &[]).score, 0);
    }

    #[test]
    fn test_code_block_tiers() {
        let analyzer = ComplexityAnalyzer::new();
        let medium = analyzer.analyze_detailed(&code_block(31), &[]);
        assert!(medium.reasons.iter().any(|r| r == "code block (31 lines)"));

        let large = analyzer.analyze_detailed(&code_block(101), &[]);
        assert!(large.reasons.iter().any(|r| r == "large code block (101 lines)"));

        let small = analyzer.analyze_detailed(&code_block(30), &[]);
        assert!(!small.reasons.iter().any(|r| r.contains("code block")));
    }

    #[test]
    fn test_history_tiers() {
        let analyzer = ComplexityAnalyzer::new();
        assert_eq!(analyzer.analyze_detailed("ok", &history(5)).score, 0);
        assert_eq!(analyzer.analyze_detailed("ok", &history(6)).score, 1);
        assert_eq!(analyzer.analyze_detailed("ok", &history(11)).score, 2);
    }

    #[test]
    fn test_short_question_deducts_one() {
        let analysis = ComplexityAnalyzer::new()
            .analyze_detailed("What is the architecture of this service?", &[]);
        assert_eq!(analysis.score, 1);
        assert!(analysis.reasons.contains(&"short question".to_string()));
    }

    #[test]
    fn test_question_opener_without_mark() {
        let analysis = ComplexityAnalyzer::new()
            .analyze_detailed("how should the concurrency model work here", &[]);
        assert_eq!(analysis.score, 1);
    }

    #[test]
    fn test_simple_keyword_deducts_two_and_floors() {
        let analyzer = ComplexityAnalyzer::new();
        assert_eq!(analyzer.analyze_detailed("fix typo in README", &[]).score, 0);

        let analysis = analyzer.analyze_detailed(
            "quick rename across the codebase of the optimize helper",
            &history(6),
        );
        // keyword +2, multi-file +2, history +1, simple -2
        assert_eq!(analysis.score, 3);
        assert_eq!(analysis.complexity, TaskComplexity::Moderate);
    }

    #[test]
    fn test_each_complex_keyword_adds_two() {
        let analyzer = ComplexityAnalyzer::new();
        for keyword in [
            "architecture",
            "refactor",
            "optimize",
            "migration",
            "redesign",
            "scalability",
            "security audit",
            "performance",
            "concurrency",
            "distributed",
            "implement",
            "design pattern",
        ] {
            let message = format!("Please {keyword} the billing service");
            let analysis = analyzer.analyze_detailed(&message, &[]);
            assert_eq!(analysis.score, 2, "keyword {keyword}");
            assert!(
                analysis.reasons.iter().any(|r| r.starts_with("complex keyword")),
                "keyword {keyword}"
            );
        }
    }

    #[test]
    fn test_implement_request_scores_keyword() {
        let analysis = ComplexityAnalyzer::new()
            .analyze_detailed("Implement a plugin loader for the service", &[]);
        assert_eq!(analysis.score, 2);
        assert_eq!(analysis.reasons, vec!["complex keyword: implement".to_string()]);
    }

    #[test]
    fn test_analyze_matches_detailed() {
        let analyzer = ComplexityAnalyzer::new();
        let message = "Redesign the storage layer for scalability across all files";
        assert_eq!(
            analyzer.analyze(message, &[]),
            analyzer.analyze_detailed(message, &[]).complexity
        );
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimate_tokens("abcdefghi"), 3);
    }
}
