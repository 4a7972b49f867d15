//! CLI output formatting tests.
//!
//! These tests verify that CLI output is correctly formatted for both
//! text and JSON output modes.

use std::time::Duration;

use leadsearch_core::{OperationStatus, QualityScore, ResultSet, SearchResult};
use leadsearch_fetch::{
    Degradation, ForwardStatus, IngestAck, PageAttempt, PageRequest, PageStatus, PersistReport,
    QuotaStatus, RunPhase, RunStatus, ScoreOutcome, SearchRun, SinkReport,
};

fn sample_run(score: f64, status: OperationStatus) -> SearchRun {
    let results = ResultSet::from(vec![
        SearchResult::new("https://axum.rs", "Axum", "Ergonomic web framework").unwrap(),
        SearchResult::new("https://actix.rs", "Actix", "").unwrap(),
    ]);

    SearchRun {
        query: "rust web".to_string(),
        desired_count: 15,
        results,
        score: ScoreOutcome {
            score: QualityScore::new(score),
            status,
        },
        status: RunStatus::PartiallyCompleted(vec![Degradation::QuotaExhausted { page: 1 }]),
        pages: vec![
            PageAttempt {
                page: PageRequest {
                    index: 0,
                    start: 1,
                    count: 10,
                },
                status: PageStatus::Fetched { results: 2 },
                attempts: 1,
                duration: Duration::from_millis(120),
            },
            PageAttempt {
                page: PageRequest {
                    index: 1,
                    start: 11,
                    count: 5,
                },
                status: PageStatus::QuotaExhausted,
                attempts: 1,
                duration: Duration::from_millis(2),
            },
        ],
        sink: Some(SinkReport {
            persist: PersistReport {
                written: 2,
                failures: Vec::new(),
            },
            forward: ForwardStatus::Acknowledged {
                ack: IngestAck {
                    status: 200,
                    body: None,
                },
            },
        }),
        phases: vec![
            RunPhase::Started,
            RunPhase::Paginating,
            RunPhase::PartiallyCompleted,
            RunPhase::Scored,
            RunPhase::Done,
        ],
        duration: Duration::from_millis(250),
    }
}

#[cfg(test)]
mod text_formatter_tests {
    use super::super::text::TextFormatter;
    use super::*;

    #[test]
    fn test_progress_bar_boundary_values() {
        let formatter = TextFormatter::new(false);

        let test_cases = vec![
            (0.0, "░░░░░░░░░░"),
            (10.0, "█░░░░░░░░░"),
            (25.0, "███░░░░░░░"), // 2.5 rounds to 3 blocks
            (50.0, "█████░░░░░"),
            (100.0, "██████████"),
        ];

        for (percent, expected) in test_cases {
            assert_eq!(formatter.progress_bar(percent), expected, "Failed for {percent}%");
        }
    }

    #[test]
    fn test_progress_bar_with_colors() {
        let formatter = TextFormatter::new(true);

        assert!(formatter.progress_bar(10.0).contains("\x1b[31m"), "Should be red for <20%");
        assert!(formatter.progress_bar(30.0).contains("\x1b[33m"), "Should be yellow for <50%");
        assert!(formatter.progress_bar(80.0).contains("\x1b[32m"), "Should be green");
    }

    #[test]
    fn test_search_lists_results_and_verdict() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_search(&sample_run(83.0, OperationStatus::Success), 70.0);

        assert!(output.contains("\"rust web\" (15 requested, 2 found)"));
        assert!(output.contains("  1. Axum"));
        assert!(output.contains("https://actix.rs"));
        assert!(output.contains("Relevance: 83.0 / 100 ✓ meets threshold 70"));
        assert!(output.contains("quota exhausted"));
        assert!(output.contains("Degraded:  quota exhausted at page 1"));
        assert!(output.contains("URL log:   2 written, 0 failed"));
        assert!(output.contains("Forward:   acknowledged (200)"));
    }

    #[test]
    fn test_search_shows_scoring_fallback_reason() {
        let formatter = TextFormatter::new(false);
        let run = sample_run(
            0.0,
            OperationStatus::Degraded("scoring failed: timeout".to_string()),
        );

        let output = formatter.format_search(&run, 70.0);

        assert!(output.contains("✗ below threshold 70"));
        assert!(output.contains("(scoring failed: timeout)"));
    }

    #[test]
    fn test_no_ansi_codes_without_colors() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_search(&sample_run(90.0, OperationStatus::Success), 70.0);
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_usage_shows_budget() {
        let formatter = TextFormatter::new(false);
        let status = QuotaStatus {
            used: 120,
            effective_budget: 500,
            monthly_limit: 1000,
            remaining: 380,
        };

        let output = formatter.format_usage("google", &status, 2.0);

        assert!(output.contains("Used:      120 / 500 (limit 1000, safety factor 2)"));
        assert!(output.contains("76% left (380 calls)"));
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::{JsonFormatter, SearchOutput, UsageOutput};
    use super::*;

    #[test]
    fn test_search_output_shape() {
        let output = SearchOutput::from_run(&sample_run(83.0, OperationStatus::Success), 70.0);
        let value = serde_json::to_value(&output).unwrap();

        assert_eq!(value["query"], "rust web");
        assert_eq!(value["requested"], 15);
        assert_eq!(value["found"], 2);
        assert_eq!(value["complete"], false);
        assert_eq!(value["results"][0]["url"], "https://axum.rs");
        assert_eq!(value["score"]["meetsThreshold"], true);
        assert_eq!(value["score"]["status"], "success");
        assert!(value["score"].get("reason").is_none());
        assert_eq!(value["pages"][1]["outcome"], "quota_exhausted");
        assert_eq!(value["pages"][0]["results"], 2);
        assert_eq!(value["degradations"][0], "quota exhausted at page 1");
        assert_eq!(value["sink"]["forwarded"], true);
        assert_eq!(value["durationMs"], 250);
    }

    #[test]
    fn test_usage_output_camel_case() {
        let status = QuotaStatus {
            used: 3,
            effective_budget: 500,
            monthly_limit: 1000,
            remaining: 497,
        };
        let output = UsageOutput::new("google", &status, 2.0);
        let json = JsonFormatter::new(false).format(&output).unwrap();

        assert!(json.contains("\"effectiveBudget\":500"));
        assert!(json.contains("\"monthlyLimit\":1000"));
        assert!(json.contains("\"safetyFactor\":2.0"));
    }

    #[test]
    fn test_pretty_output_is_multiline() {
        let json = JsonFormatter::new(true)
            .format(&serde_json::json!({"a": 1}))
            .unwrap();
        assert!(json.contains('\n'));
    }
}
