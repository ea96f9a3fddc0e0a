//! Condition-clause evaluation (§4.9): parse, resolve, compare — all
//! case-insensitive string comparisons after stringification.

use core_models::{parse_condition_expr, ConditionClause, ConditionOp};

use crate::template::{resolve_path, stringify};

/// Evaluate a single clause's `if` template against `trigger_data`. A
/// clause with no `if` (i.e. a bare `else`) never matches here — callers
/// check for `else` separately once no `if` clause matches.
pub fn evaluate_if(clause: &ConditionClause, trigger_data: &serde_json::Value) -> bool {
    let Some(expr) = &clause.r#if else { return false };
    // Validated at workflow-save time; a parse failure here would mean
    // the stored workflow is corrupt, so just treat it as non-matching.
    let Some(parsed) = parse_condition_expr(expr) else { return false };

    let actual = resolve_path(trigger_data, &parsed.path)
        .map(stringify)
        .unwrap_or_default()
        .to_lowercase();
    let literal = parsed.literal.to_lowercase();

    match parsed.op {
        ConditionOp::Contains => actual.contains(&literal),
        ConditionOp::Equals => actual == literal,
        ConditionOp::NotContains => !actual.contains(&literal),
        ConditionOp::NotEquals => actual != literal,
    }
}

/// Evaluate an ordered list of clauses: the first matching `if` wins; if
/// none match, a trailing bare `else` wins; otherwise `None` (terminate).
pub fn evaluate_clauses(clauses: &[ConditionClause], trigger_data: &serde_json::Value) -> Option<String> {
    for clause in clauses {
        if clause.r#if.is_some() {
            if evaluate_if(clause, trigger_data) {
                return clause.then.clone();
            }
        } else if let Some(else_target) = &clause.r#else {
            return Some(else_target.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_models::ConditionClause;

    #[test]
    fn contains_matches_case_insensitively() {
        let clause = ConditionClause {
            r#if: Some("{{trigger.from}} contains '@IMPORTANT.com'".to_string()),
            then: Some("3".to_string()),
            r#else: None,
        };
        let payload = serde_json::json!({"trigger": {"from": "a@important.com"}});
        assert!(evaluate_if(&clause, &payload));
    }

    #[test]
    fn falls_through_to_else_clause() {
        let clauses = vec![
            ConditionClause {
                r#if: Some("{{trigger.from}} contains '@important.com'".to_string()),
                then: Some("3".to_string()),
                r#else: None,
            },
            ConditionClause {
                r#if: None,
                then: None,
                r#else: Some("4".to_string()),
            },
        ];
        let payload = serde_json::json!({"trigger": {"from": "b@other.com"}});
        assert_eq!(evaluate_clauses(&clauses, &payload), Some("4".to_string()));
    }

    #[test]
    fn terminates_when_nothing_matches() {
        let clauses = vec![ConditionClause {
            r#if: Some("{{trigger.from}} contains '@important.com'".to_string()),
            then: Some("3".to_string()),
            r#else: None,
        }];
        let payload = serde_json::json!({"trigger": {"from": "b@other.com"}});
        assert_eq!(evaluate_clauses(&clauses, &payload), None);
    }
}
