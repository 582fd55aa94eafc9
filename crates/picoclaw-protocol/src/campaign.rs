//! Campaign guardrails: limits, accounting state, and halt reasons.

use serde::{Deserialize, Serialize};

/// Safety limits for a campaign-driven request. Zero-valued limits mean
/// unbounded; `kill_switch` and the accounting flags always bind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardrails {
    #[serde(default)]
    pub max_duration_minutes: u64,
    #[serde(default)]
    pub budget_cents: u64,
    #[serde(default)]
    pub max_tool_calls: u64,
    #[serde(default)]
    pub max_iterations: u64,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub kill_switch: bool,
}

/// Monotone accounting threaded through the agent loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignState {
    #[serde(default)]
    pub elapsed_minutes: u64,
    #[serde(default)]
    pub spent_cents: u64,
    #[serde(default)]
    pub tool_calls: u64,
    #[serde(default)]
    pub iterations: u64,
    #[serde(default)]
    pub killed: bool,
    #[serde(default)]
    pub completed: bool,
}

/// Why the agent loop stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    BudgetExhausted,
    DurationExceeded,
    ToolCallLimitReached,
    IterationLimitReached,
    KillSwitchActivated,
    Completed,
}

impl HaltReason {
    /// User-visible sentinel text for the final response.
    pub fn sentinel(&self) -> &'static str {
        match self {
            HaltReason::BudgetExhausted => "budget exhausted",
            HaltReason::DurationExceeded => "duration exceeded",
            HaltReason::ToolCallLimitReached => "tool call limit reached",
            HaltReason::IterationLimitReached => "iteration limit reached",
            HaltReason::KillSwitchActivated => "kill switch activated",
            HaltReason::Completed => "completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guardrails_default_is_unbounded() {
        let g = Guardrails::default();
        assert_eq!(g.budget_cents, 0);
        assert_eq!(g.max_iterations, 0);
        assert!(!g.read_only);
        assert!(!g.kill_switch);
    }

    #[test]
    fn halt_reason_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&HaltReason::ToolCallLimitReached).unwrap(),
            "\"tool_call_limit_reached\""
        );
        let back: HaltReason = serde_json::from_str("\"budget_exhausted\"").unwrap();
        assert_eq!(back, HaltReason::BudgetExhausted);
    }

    #[test]
    fn sentinels_name_the_reason() {
        assert_eq!(HaltReason::KillSwitchActivated.sentinel(), "kill switch activated");
        assert_eq!(HaltReason::BudgetExhausted.sentinel(), "budget exhausted");
    }

    #[test]
    fn campaign_state_serde_roundtrip() {
        let state = CampaignState {
            spent_cents: 42,
            tool_calls: 3,
            ..CampaignState::default()
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: CampaignState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
