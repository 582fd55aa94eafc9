//! Campaign guardrail accounting and the halt decision.
//!
//! All accounting is monotone: counters only grow, flags only set. The halt
//! decision treats zero-valued limits as unbounded; the kill switch and the
//! completion flag always bind.

use picoclaw_protocol::{CampaignState, Guardrails, HaltReason};

pub fn record_tool_call(mut state: CampaignState, cost_cents: u64) -> CampaignState {
    state.tool_calls += 1;
    state.spent_cents += cost_cents;
    state
}

pub fn record_iteration(mut state: CampaignState, elapsed_minutes: u64) -> CampaignState {
    state.iterations += 1;
    state.elapsed_minutes += elapsed_minutes;
    state
}

pub fn activate_kill_switch(mut state: CampaignState) -> CampaignState {
    state.killed = true;
    state
}

pub fn mark_completed(mut state: CampaignState) -> CampaignState {
    state.completed = true;
    state
}

/// Evaluate guardrails before an iteration. `None` means keep going.
pub fn should_halt(state: &CampaignState, guardrails: &Guardrails) -> Option<HaltReason> {
    if state.killed || guardrails.kill_switch {
        return Some(HaltReason::KillSwitchActivated);
    }
    if state.completed {
        return Some(HaltReason::Completed);
    }
    if guardrails.budget_cents > 0 && state.spent_cents >= guardrails.budget_cents {
        return Some(HaltReason::BudgetExhausted);
    }
    if guardrails.max_duration_minutes > 0
        && state.elapsed_minutes >= guardrails.max_duration_minutes
    {
        return Some(HaltReason::DurationExceeded);
    }
    if guardrails.max_tool_calls > 0 && state.tool_calls >= guardrails.max_tool_calls {
        return Some(HaltReason::ToolCallLimitReached);
    }
    if guardrails.max_iterations > 0 && state.iterations >= guardrails.max_iterations {
        return Some(HaltReason::IterationLimitReached);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_accounting_is_monotone() {
        let state = CampaignState::default();
        let charged = record_tool_call(state, 30);
        assert_eq!(charged.tool_calls, 1);
        assert_eq!(charged.spent_cents, 30);

        let free = record_tool_call(charged, 0);
        assert_eq!(free.tool_calls, 2);
        assert_eq!(free.spent_cents, 30);
        assert!(free.spent_cents >= charged.spent_cents);
    }

    #[test]
    fn iteration_accounting_is_monotone() {
        let state = record_iteration(CampaignState::default(), 2);
        assert_eq!(state.iterations, 1);
        assert_eq!(state.elapsed_minutes, 2);
        let state = record_iteration(state, 0);
        assert_eq!(state.iterations, 2);
        assert_eq!(state.elapsed_minutes, 2);
    }

    #[test]
    fn zero_limits_never_halt() {
        let mut state = CampaignState::default();
        state.spent_cents = 1_000_000;
        state.tool_calls = 1_000_000;
        state.iterations = 1_000_000;
        state.elapsed_minutes = 1_000_000;
        assert_eq!(should_halt(&state, &Guardrails::default()), None);
    }

    #[test]
    fn budget_halt() {
        let guardrails = Guardrails {
            budget_cents: 100,
            ..Guardrails::default()
        };
        let mut state = CampaignState::default();
        state.spent_cents = 99;
        assert_eq!(should_halt(&state, &guardrails), None);
        state.spent_cents = 100;
        assert_eq!(should_halt(&state, &guardrails), Some(HaltReason::BudgetExhausted));
    }

    #[test]
    fn duration_halt() {
        let guardrails = Guardrails {
            max_duration_minutes: 60,
            ..Guardrails::default()
        };
        let mut state = CampaignState::default();
        state.elapsed_minutes = 60;
        assert_eq!(
            should_halt(&state, &guardrails),
            Some(HaltReason::DurationExceeded)
        );
    }

    #[test]
    fn tool_call_and_iteration_halts() {
        let guardrails = Guardrails {
            max_tool_calls: 3,
            max_iterations: 5,
            ..Guardrails::default()
        };
        let mut state = CampaignState::default();
        state.tool_calls = 3;
        assert_eq!(
            should_halt(&state, &guardrails),
            Some(HaltReason::ToolCallLimitReached)
        );
        state.tool_calls = 0;
        state.iterations = 5;
        assert_eq!(
            should_halt(&state, &guardrails),
            Some(HaltReason::IterationLimitReached)
        );
    }

    #[test]
    fn kill_switch_beats_everything() {
        let guardrails = Guardrails {
            budget_cents: 1,
            ..Guardrails::default()
        };
        let mut state = CampaignState::default();
        state.spent_cents = 100;
        state = activate_kill_switch(state);
        assert_eq!(
            should_halt(&state, &guardrails),
            Some(HaltReason::KillSwitchActivated)
        );

        let armed = Guardrails {
            kill_switch: true,
            ..Guardrails::default()
        };
        assert_eq!(
            should_halt(&CampaignState::default(), &armed),
            Some(HaltReason::KillSwitchActivated)
        );
    }

    #[test]
    fn completion_halts() {
        let state = mark_completed(CampaignState::default());
        assert_eq!(
            should_halt(&state, &Guardrails::default()),
            Some(HaltReason::Completed)
        );
    }
}
