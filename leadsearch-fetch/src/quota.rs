//! Quota guard for the metered search provider.
//!
//! The guard turns the monthly limit into an effective budget and asks the
//! usage ledger to reserve one call below it. The ledger performs the read,
//! compare and increment as one atomic step, so concurrent callers (in this
//! process or in other processes sharing the ledger) can never push the
//! persisted count past the effective budget.

use std::sync::Arc;

use leadsearch_core::{
    CoreError, FallbackEvent, FallbackReason, FallbackRecorder, Reservation, UsageLedger,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

// ============================================================================
// Configuration
// ============================================================================

/// Monthly limit and safety factor for one provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaConfig {
    monthly_limit: u64,
    safety_factor: f64,
}

impl QuotaConfig {
    /// Creates a quota configuration.
    ///
    /// The limit must be positive and the safety factor finite and at least 1.
    pub fn new(monthly_limit: u64, safety_factor: f64) -> Result<Self, CoreError> {
        if monthly_limit == 0 {
            return Err(CoreError::InvalidConfig(
                "monthly limit must be positive".to_string(),
            ));
        }
        if !safety_factor.is_finite() || safety_factor < 1.0 {
            return Err(CoreError::InvalidConfig(format!(
                "safety factor must be >= 1, got {safety_factor}"
            )));
        }
        Ok(Self {
            monthly_limit,
            safety_factor,
        })
    }

    /// Provider-imposed monthly call limit.
    pub fn monthly_limit(&self) -> u64 {
        self.monthly_limit
    }

    /// Divisor applied to the monthly limit.
    pub fn safety_factor(&self) -> f64 {
        self.safety_factor
    }

    /// Calls actually permitted: `floor(monthly_limit / safety_factor)`.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn effective_budget(&self) -> u64 {
        (self.monthly_limit as f64 / self.safety_factor).floor() as u64
    }
}

// ============================================================================
// Decisions and Status
// ============================================================================

/// Outcome of a reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// The call may proceed; the ledger was incremented.
    Allowed {
        /// Count after the increment.
        count: u64,
        /// Calls left in the budget.
        remaining: u64,
    },
    /// The budget is spent; nothing was incremented.
    Refused {
        /// Count at the time of refusal.
        used: u64,
        /// Effective budget.
        budget: u64,
    },
}

impl QuotaDecision {
    /// Returns true if the call may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed { .. })
    }
}

/// Snapshot of quota consumption for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    /// Calls recorded so far.
    pub used: u64,
    /// Effective budget.
    pub effective_budget: u64,
    /// Raw monthly limit.
    pub monthly_limit: u64,
    /// Calls left before refusal.
    pub remaining: u64,
}

// ============================================================================
// Guard
// ============================================================================

/// Enforces the effective budget against a shared usage ledger.
pub struct QuotaGuard {
    ledger: Arc<dyn UsageLedger>,
    recorder: Arc<dyn FallbackRecorder>,
    config: QuotaConfig,
}

impl QuotaGuard {
    /// Creates a guard over the given ledger.
    pub fn new(
        ledger: Arc<dyn UsageLedger>,
        recorder: Arc<dyn FallbackRecorder>,
        config: QuotaConfig,
    ) -> Self {
        Self {
            ledger,
            recorder,
            config,
        }
    }

    /// Returns the quota configuration.
    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Reserves one call for `service` if the budget allows it.
    ///
    /// On refusal a quota-near-exhaustion event is recorded and the ledger
    /// is left untouched. Ledger failures propagate; callers must not issue
    /// the call in that case.
    #[instrument(skip_all, fields(service = %service))]
    pub async fn check_and_reserve(&self, service: &str) -> Result<QuotaDecision, CoreError> {
        let budget = self.config.effective_budget();

        let count = match self.ledger.reserve_below(service, budget).await? {
            Reservation::Reserved { count } => count,
            Reservation::Exhausted { used } => {
                info!(used, budget, "Quota budget spent, refusing call");
                let event = FallbackEvent::new(FallbackReason::QuotaNearExhaustion)
                    .with("service", service)
                    .with("used", used)
                    .with("effective_budget", budget)
                    .with("monthly_limit", self.config.monthly_limit);
                self.recorder.record(event).await;
                return Ok(QuotaDecision::Refused { used, budget });
            }
        };

        let remaining = budget.saturating_sub(count);
        if remaining.saturating_mul(10) <= budget {
            warn!(count, remaining, budget, "Quota nearly exhausted");
        } else {
            debug!(count, remaining, "Call reserved");
        }

        Ok(QuotaDecision::Allowed { count, remaining })
    }

    /// Reports current consumption without reserving anything.
    pub async fn status(&self, service: &str) -> Result<QuotaStatus, CoreError> {
        let used = self.ledger.current_count(service).await?;
        let effective_budget = self.config.effective_budget();
        Ok(QuotaStatus {
            used,
            effective_budget,
            monthly_limit: self.config.monthly_limit,
            remaining: effective_budget.saturating_sub(used),
        })
    }
}

impl std::fmt::Debug for QuotaGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaGuard")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
