//! Workflow and Step models (§3) — the user-owned graph the engine runs.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::credential::App;
use crate::error::WorkflowValidationError;

/// A named graph owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub polling_interval_seconds: i64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub steps: Vec<Step>,
    /// Explicit first-post-trigger step id, overriding the historical `"2"`
    /// fallback hard-coded by the interpreter (§9 open question).
    pub start_step_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(user_id: Uuid, name: impl Into<String>, steps: Vec<Step>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            description: None,
            is_active: false,
            polling_interval_seconds: 60,
            last_run_at: None,
            steps,
            start_step_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The workflow's single trigger step, if the graph is well-formed.
    pub fn trigger_step(&self) -> Option<&TriggerStep> {
        self.steps.iter().find_map(|s| match &s.kind {
            StepKind::Trigger(t) => Some(t),
            _ => None,
        })
    }

    /// Activate the workflow: derive its polling interval from the
    /// trigger's app (§4.6) and mark it active. Webhook triggers are not
    /// polled (interval 0).
    pub fn activate(&mut self) {
        self.polling_interval_seconds = self
            .trigger_step()
            .and_then(|t| App::from_str(&t.app_name))
            .map(|app| app.default_polling_interval_seconds())
            .unwrap_or(60);
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    /// Step-graph closure and cardinality invariants (§3, §8 I5):
    /// - step ids are unique
    /// - exactly one `trigger` step
    /// - at least one `action` step
    /// - every `then`/`else`/`next` target is null or an existing step id
    pub fn validate(&self) -> Result<(), WorkflowValidationError> {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(WorkflowValidationError::DuplicateStepId(step.id.clone()));
            }
        }

        let trigger_count = self
            .steps
            .iter()
            .filter(|s| matches!(s.kind, StepKind::Trigger(_)))
            .count();
        if trigger_count != 1 {
            return Err(WorkflowValidationError::TriggerCount(trigger_count));
        }

        let action_count = self
            .steps
            .iter()
            .filter(|s| matches!(s.kind, StepKind::Action(_)))
            .count();
        if action_count == 0 {
            return Err(WorkflowValidationError::NoActionStep);
        }

        let ids: HashSet<&str> = self.steps.iter().map(|s| s.id.as_str()).collect();
        for step in &self.steps {
            match &step.kind {
                StepKind::Condition(cond) => {
                    for clause in &cond.conditions {
                        clause.validate(&ids)?;
                    }
                }
                StepKind::Action(action) => {
                    if let Some(next) = &action.next {
                        if !ids.contains(next.as_str()) {
                            return Err(WorkflowValidationError::DanglingTarget(next.clone()));
                        }
                    }
                }
                StepKind::Trigger(_) => {}
            }
        }

        Ok(())
    }

    /// Build a lookup table of step id -> step, used by the interpreter.
    pub fn step_map(&self) -> HashMap<&str, &Step> {
        self.steps.iter().map(|s| (s.id.as_str(), s)).collect()
    }

    /// The interpreter's entry point, per §4.9: the workflow's explicit
    /// `start_step_id` if set, else the historical fixed convention `"2"`.
    pub fn start_step_id(&self) -> &str {
        self.start_step_id.as_deref().unwrap_or("2")
    }
}

/// A single node in the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    #[serde(flatten)]
    pub kind: StepKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    Trigger(TriggerStep),
    Condition(ConditionStep),
    Action(ActionStep),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerStep {
    pub app_name: String,
    pub trigger_id: String,
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionStep {
    pub conditions: Vec<ConditionClause>,
}

/// One clause of a condition step: either `{if, then}` or `{else}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionClause {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#if: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub then: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#else: Option<String>,
}

impl ConditionClause {
    /// Validate the clause's `then`/`else` target against the workflow's
    /// known step ids, and (if it carries an `if`) that the template
    /// parses under the strict `{{path}} <op> '<literal>'` grammar (§9).
    fn validate(&self, ids: &HashSet<&str>) -> Result<(), WorkflowValidationError> {
        if let Some(then) = &self.then {
            if !ids.contains(then.as_str()) {
                return Err(WorkflowValidationError::DanglingTarget(then.clone()));
            }
        }
        if let Some(else_target) = &self.r#else {
            if !ids.contains(else_target.as_str()) {
                return Err(WorkflowValidationError::DanglingTarget(else_target.clone()));
            }
        }
        if let Some(expr) = &self.r#if {
            crate::workflow::parse_condition_expr(expr)
                .ok_or_else(|| WorkflowValidationError::MalformedCondition(expr.clone()))?;
        }
        Ok(())
    }
}

/// Comparison operator supported in a condition clause (§3.4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOp {
    Contains,
    Equals,
    NotContains,
    NotEquals,
}

/// A parsed `{{path}} <op> '<literal>'` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCondition {
    pub path: String,
    pub op: ConditionOp,
    pub literal: String,
}

/// Parse the strict condition grammar: `{{path}} op 'literal'` or
/// `{{path}} op "literal"`. Returns `None` if the clause doesn't match —
/// callers treat that as a validation failure at workflow-save time (§9),
/// rather than a silent false at run time.
pub fn parse_condition_expr(expr: &str) -> Option<ParsedCondition> {
    let expr = expr.trim();
    let rest = expr.strip_prefix("{{")?;
    let (path, rest) = rest.split_once("}}")?;
    let rest = rest.trim_start();

    const OPS: [(&str, ConditionOp); 4] = [
        ("not contains", ConditionOp::NotContains),
        ("not equals", ConditionOp::NotEquals),
        ("contains", ConditionOp::Contains),
        ("equals", ConditionOp::Equals),
    ];

    let (op, rest) = OPS
        .iter()
        .find_map(|(text, op)| rest.strip_prefix(text).map(|r| (*op, r)))?;
    let rest = rest.trim_start();

    let literal = if let Some(inner) = rest.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        inner
    } else {
        rest.strip_prefix('"').and_then(|r| r.strip_suffix('"'))?
    };

    Some(ParsedCondition {
        path: path.trim().to_string(),
        op,
        literal: literal.to_string(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionStep {
    pub app_name: String,
    #[serde(default)]
    pub action_id: Option<String>,
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
    /// Not part of the original action table (actions are terminal per
    /// §4.9), kept for step-graph closure checks on hand-authored graphs
    /// that set it; the interpreter itself never follows it.
    #[serde(default)]
    pub next: Option<String>,
}

impl ActionStep {
    /// `action_id`, falling back to `app_name` for backwards compatibility
    /// with older step definitions (§4.10).
    pub fn effective_action_id(&self) -> &str {
        self.action_id.as_deref().unwrap_or(&self.app_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger_step() -> Step {
        Step {
            id: "1".to_string(),
            kind: StepKind::Trigger(TriggerStep {
                app_name: "gmail".to_string(),
                trigger_id: "new_email".to_string(),
                config: HashMap::new(),
            }),
        }
    }

    fn action_step(id: &str) -> Step {
        Step {
            id: id.to_string(),
            kind: StepKind::Action(ActionStep {
                app_name: "slack".to_string(),
                action_id: Some("send_channel_message".to_string()),
                config: HashMap::new(),
                next: None,
            }),
        }
    }

    #[test]
    fn validates_well_formed_graph() {
        let wf = Workflow::new(Uuid::new_v4(), "wf", vec![trigger_step(), action_step("2")]);
        assert!(wf.validate().is_ok());
    }

    #[test]
    fn rejects_missing_trigger() {
        let wf = Workflow::new(Uuid::new_v4(), "wf", vec![action_step("2")]);
        assert!(matches!(
            wf.validate(),
            Err(WorkflowValidationError::TriggerCount(0))
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let wf = Workflow::new(
            Uuid::new_v4(),
            "wf",
            vec![trigger_step(), action_step("2"), action_step("2")],
        );
        assert!(matches!(
            wf.validate(),
            Err(WorkflowValidationError::DuplicateStepId(_))
        ));
    }

    #[test]
    fn rejects_dangling_condition_target() {
        let cond = Step {
            id: "2".to_string(),
            kind: StepKind::Condition(ConditionStep {
                conditions: vec![ConditionClause {
                    r#if: Some("{{trigger.from}} contains '@x.com'".to_string()),
                    then: Some("99".to_string()),
                    r#else: None,
                }],
            }),
        };
        let wf = Workflow::new(Uuid::new_v4(), "wf", vec![trigger_step(), cond, action_step("3")]);
        assert!(matches!(
            wf.validate(),
            Err(WorkflowValidationError::DanglingTarget(_))
        ));
    }

    #[test]
    fn activation_derives_interval_from_trigger_app() {
        let mut wf = Workflow::new(Uuid::new_v4(), "wf", vec![trigger_step(), action_step("2")]);
        wf.activate();
        assert_eq!(wf.polling_interval_seconds, 60);
        assert!(wf.is_active);
    }

    #[test]
    fn parses_condition_grammar() {
        let parsed = parse_condition_expr("{{trigger.from}} contains '@important.com'").unwrap();
        assert_eq!(parsed.path, "trigger.from");
        assert_eq!(parsed.op, ConditionOp::Contains);
        assert_eq!(parsed.literal, "@important.com");

        let parsed = parse_condition_expr("{{trigger.status}} not equals \"closed\"").unwrap();
        assert_eq!(parsed.op, ConditionOp::NotEquals);
        assert_eq!(parsed.literal, "closed");

        assert!(parse_condition_expr("garbage").is_none());
    }

    #[test]
    fn rejects_malformed_condition_template() {
        let cond = Step {
            id: "2".to_string(),
            kind: StepKind::Condition(ConditionStep {
                conditions: vec![ConditionClause {
                    r#if: Some("not a valid template".to_string()),
                    then: Some("3".to_string()),
                    r#else: None,
                }],
            }),
        };
        let wf = Workflow::new(Uuid::new_v4(), "wf", vec![trigger_step(), cond, action_step("3")]);
        assert!(matches!(
            wf.validate(),
            Err(WorkflowValidationError::MalformedCondition(_))
        ));
    }
}
