use std::collections::HashSet;

use serde_json::json;

use super::context::ExecutionContext;

/// Fixed ceiling on nodes attempted per run.
pub const MAX_STEPS: u32 = 12;
/// Fixed ceiling on the serialized size of all context variables.
pub const MAX_OUTPUT_LENGTH: usize = 5000;

/// Runtime safety checks evaluated before every node dispatch.
#[derive(Debug, Default)]
pub struct Guardrails {
    visited_states: HashSet<String>,
}

impl Guardrails {
    /// Runs the checks in order (step ceiling, repeated state, output size)
    /// and returns the reason for aborting, if any trips.
    pub fn check(&mut self, ctx: &ExecutionContext) -> Option<String> {
        if ctx.step_count >= ctx.max_steps {
            return Some(format!("Maximum steps ({}) exceeded", ctx.max_steps));
        }

        if self.repeated_state(ctx) {
            return Some("Repeated state detected - possible infinite loop".to_string());
        }

        let serialized = serde_json::to_string(&ctx.variables).unwrap_or_default();
        if serialized.len() > MAX_OUTPUT_LENGTH {
            return Some("Output length exceeded maximum allowed".to_string());
        }

        None
    }

    /// Structural fingerprint over variables + memory. serde_json maps are
    /// ordered, so the serialization is deterministic. Every fingerprint is
    /// recorded; only a re-occurrence counts as a repeat.
    fn repeated_state(&mut self, ctx: &ExecutionContext) -> bool {
        let fingerprint = json!({
            "variables": ctx.variables,
            "memory": ctx.memory,
        })
        .to_string();
        !self.visited_states.insert(fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn first_fingerprint_is_not_a_repeat() {
        let mut guardrails = Guardrails::default();
        let ctx = ExecutionContext::default();
        assert_eq!(guardrails.check(&ctx), None);
    }

    #[test]
    fn identical_state_trips_on_second_sight() {
        let mut guardrails = Guardrails::default();
        let ctx = ExecutionContext::default();
        assert_eq!(guardrails.check(&ctx), None);
        let reason = guardrails.check(&ctx).expect("repeat should trip");
        assert!(reason.contains("Repeated state"));
    }

    #[test]
    fn step_ceiling_wins_over_repeated_state() {
        let mut guardrails = Guardrails::default();
        let mut ctx = ExecutionContext::default();
        guardrails.check(&ctx);
        ctx.step_count = ctx.max_steps;
        let reason = guardrails.check(&ctx).expect("ceiling should trip");
        assert!(reason.contains("Maximum steps"));
    }

    #[test]
    fn oversized_variables_trip_output_ceiling() {
        let mut guardrails = Guardrails::default();
        let mut ctx = ExecutionContext::default();
        ctx.set_variable("blob", Value::String("x".repeat(MAX_OUTPUT_LENGTH + 1)));
        let reason = guardrails.check(&ctx).expect("size should trip");
        assert!(reason.contains("Output length"));
    }
}
