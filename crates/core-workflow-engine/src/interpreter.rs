//! Step Interpreter (C9) — a `HashMap<&str, &Step>` lookup loop starting
//! at the workflow's start step, following `then`/`else`/`next` linearly.

use core_integrations::Dispatcher;
use core_models::{StepKind, User, Workflow};
use tracing::info;

use crate::actions;
use crate::condition::evaluate_clauses;
use crate::context::StepRecord;
use crate::error::WorkflowEngineError;

/// Walks `workflow`'s step graph against `trigger_data`, returning the
/// execution log on success. `trigger_data` is the already-unwrapped
/// payload (the caller resolves the `trigger_data.data` indirection
/// described in §4.8 step 5 before calling this).
pub async fn interpret(
    dispatcher: &Dispatcher,
    user: &User,
    workflow: &Workflow,
    trigger_data: &serde_json::Value,
) -> Result<Vec<StepRecord>, WorkflowEngineError> {
    let steps = workflow.step_map();
    let mut log = Vec::new();
    let mut current_id: Option<String> = Some(workflow.start_step_id().to_string());

    while let Some(id) = current_id.take() {
        let Some(step) = steps.get(id.as_str()) else {
            break;
        };

        match &step.kind {
            StepKind::Trigger(_) => break,

            StepKind::Condition(cond) => {
                let next = evaluate_clauses(&cond.conditions, trigger_data);
                info!(step_id = %step.id, next = ?next, "condition_evaluated");
                log.push(StepRecord::Condition {
                    step_id: step.id.clone(),
                    next: next.clone(),
                });
                current_id = next;
            }

            StepKind::Action(action) => {
                info!(step_id = %step.id, action_id = action.effective_action_id(), "action_started");
                let result = actions::execute(dispatcher, user, action, trigger_data).await?;
                info!(step_id = %step.id, status = ?result.status, "action_completed");
                log.push(StepRecord::Action {
                    step_id: step.id.clone(),
                    status: result.status,
                    detail: result.detail,
                });
                // Actions are terminal: the design does not chain multiple
                // actions off one another.
                break;
            }
        }
    }

    Ok(log)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use core_models::{ActionStep, ConditionClause, ConditionStep, Step, StepKind, TriggerStep, Workflow};
    use uuid::Uuid;

    use super::*;

    fn workflow_with_steps(steps: Vec<Step>) -> Workflow {
        Workflow::new(Uuid::new_v4(), "wf", steps)
    }

    #[test]
    fn start_step_id_defaults_to_2() {
        let wf = workflow_with_steps(vec![]);
        assert_eq!(wf.start_step_id(), "2");
    }

    #[test]
    fn start_step_id_honors_explicit_override() {
        let mut wf = workflow_with_steps(vec![]);
        wf.start_step_id = Some("5".to_string());
        assert_eq!(wf.start_step_id(), "5");
    }

    #[test]
    fn terminates_with_empty_log_when_start_step_absent() {
        let wf = workflow_with_steps(vec![Step {
            id: "1".to_string(),
            kind: StepKind::Trigger(TriggerStep {
                app_name: "gmail".to_string(),
                trigger_id: "new_email".to_string(),
                config: HashMap::new(),
            }),
        }]);
        assert!(wf.step_map().get("2").is_none());
    }

    #[test]
    fn condition_clause_terminates_on_no_match() {
        let cond = ConditionStep {
            conditions: vec![ConditionClause {
                r#if: Some("{{trigger.from}} contains '@important.com'".to_string()),
                then: Some("3".to_string()),
                r#else: None,
            }],
        };
        let payload = serde_json::json!({"trigger": {"from": "b@other.com"}});
        assert_eq!(
            crate::condition::evaluate_clauses(&cond.conditions, &payload),
            None
        );
    }

    #[test]
    fn action_step_resolves_effective_action_id() {
        let action = ActionStep {
            app_name: "slack".to_string(),
            action_id: None,
            config: HashMap::new(),
            next: None,
        };
        assert_eq!(action.effective_action_id(), "slack");
    }
}
