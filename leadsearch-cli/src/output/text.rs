//! Text output formatting with progress bars and colors.

use leadsearch_fetch::{ForwardStatus, PageAttempt, PageStatus, QuotaStatus, SearchRun};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 10,
        }
    }

    /// Formats a finished search run.
    pub fn format_search(&self, run: &SearchRun, threshold: f64) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{} {}",
            self.bold(&format!("\"{}\"", run.query)),
            self.dim(&format!(
                "({} requested, {} found)",
                run.desired_count,
                run.results.len()
            ))
        ));
        lines.push("─".repeat(50));

        if run.results.is_empty() {
            lines.push(self.dim("No results"));
        }
        for (i, result) in run.results.iter().enumerate() {
            lines.push(format!("{:>3}. {}", i + 1, self.bold(&result.title)));
            lines.push(format!("     {}", self.cyan(&result.url)));
            if !result.snippet.is_empty() {
                lines.push(format!("     {}", self.dim(&result.snippet)));
            }
        }

        lines.push(String::new());
        lines.push(self.format_score(run, threshold));

        lines.push(format!("Pages:     {}", run.pages.len()));
        for attempt in &run.pages {
            lines.push(self.format_page(attempt));
        }

        for degradation in run.status.degradations() {
            lines.push(format!("Degraded:  {}", self.yellow(&degradation.to_string())));
        }

        if let Some(sink) = &run.sink {
            let persisted = format!(
                "{} written, {} failed",
                sink.persist.written,
                sink.persist.failures.len()
            );
            let persisted = if sink.persist.failures.is_empty() {
                persisted
            } else {
                self.yellow(&persisted)
            };
            lines.push(format!("URL log:   {persisted}"));

            let forwarded = match &sink.forward {
                ForwardStatus::Acknowledged { ack } => {
                    self.green(&format!("acknowledged ({})", ack.status))
                }
                ForwardStatus::Failed { reason } => self.red(&format!("failed: {reason}")),
            };
            lines.push(format!("Forward:   {forwarded}"));
        }

        lines.join("\n")
    }

    fn format_score(&self, run: &SearchRun, threshold: f64) -> String {
        let score = run.score.score;
        let value = format!("{score} / 100");

        let mut line = if score.meets(threshold) {
            format!(
                "Relevance: {} {}",
                self.green(&value),
                self.green(&format!("✓ meets threshold {threshold}"))
            )
        } else {
            format!(
                "Relevance: {} {}",
                self.yellow(&value),
                self.yellow(&format!("✗ below threshold {threshold}"))
            )
        };

        if let Some(reason) = run.score.status.reason() {
            line.push_str(&format!(" {}", self.dim(&format!("({reason})"))));
        }
        line
    }

    fn format_page(&self, attempt: &PageAttempt) -> String {
        let outcome = match &attempt.status {
            PageStatus::Fetched { results } => self.green(&format!("{results} results")),
            PageStatus::Failed { reason } => self.red(&format!("failed: {reason}")),
            PageStatus::QuotaExhausted => self.yellow("quota exhausted"),
            PageStatus::LedgerUnavailable { reason } => {
                self.red(&format!("ledger unavailable: {reason}"))
            }
            PageStatus::DeadlineExceeded => self.yellow("deadline exceeded"),
        };

        let attempts = if attempt.attempts == 1 {
            "1 attempt".to_string()
        } else {
            format!("{} attempts", attempt.attempts)
        };

        format!(
            "  #{} start {:<3} count {:<2} {} {}",
            attempt.page.index,
            attempt.page.start,
            attempt.page.count,
            outcome,
            self.dim(&format!("({attempts}, {}ms)", attempt.duration.as_millis()))
        )
    }

    /// Formats quota consumption for a provider.
    #[allow(clippy::cast_precision_loss)]
    pub fn format_usage(&self, service: &str, status: &QuotaStatus, safety_factor: f64) -> String {
        let mut lines = Vec::new();

        lines.push(format!("{} quota", self.bold(service)));
        lines.push(format!(
            "Used:      {} / {} {}",
            status.used,
            status.effective_budget,
            self.dim(&format!(
                "(limit {}, safety factor {safety_factor})",
                status.monthly_limit
            ))
        ));

        let percent_remaining = if status.effective_budget == 0 {
            0.0
        } else {
            status.remaining as f64 / status.effective_budget as f64 * 100.0
        };
        let pct = self.color_for_percent(
            percent_remaining,
            &format!("{percent_remaining:.0}% left ({} calls)", status.remaining),
        );
        lines.push(format!(
            "Remaining: {} {}",
            self.progress_bar(percent_remaining),
            pct
        ));

        lines.join("\n")
    }

    /// Formats a progress bar.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn progress_bar(&self, percent_remaining: f64) -> String {
        let filled = ((percent_remaining.clamp(0.0, 100.0) / 100.0) * self.bar_width as f64)
            .round() as usize;
        let empty = self.bar_width.saturating_sub(filled);

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_percent(percent_remaining, &bar)
    }

    // ========================================================================
    // Color helpers
    // ========================================================================

    fn color_for_percent(&self, percent: f64, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }

        if percent < 20.0 {
            self.red(text)
        } else if percent < 50.0 {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}
