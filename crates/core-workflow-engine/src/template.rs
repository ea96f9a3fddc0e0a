//! Dotted-path lookup and `{{path}}` template substitution (§4.9, §4.10, §8 I6).

/// Resolve a dotted path (`trigger.from`) against a JSON payload. Missing
/// keys or non-object intermediates yield `None` — the caller decides
/// what "undefined" means at its call site.
pub fn resolve_path<'a>(payload: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut current = payload;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Stringify a resolved value the way the interpreter's comparisons do:
/// strings unquoted, everything else via its JSON representation.
pub fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Replace every `{{path}}` occurrence in `template` with the dotted-path
/// lookup against `payload`. A missing or null path leaves the literal
/// `{{path}}` in place — never an error, never an empty string (§8 I6).
pub fn substitute(template: &str, payload: &serde_json::Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let path = after_open[..end].trim();
        let resolved = resolve_path(payload, path);
        match resolved {
            Some(serde_json::Value::Null) | None => {
                out.push_str("{{");
                out.push_str(path);
                out.push_str("}}");
            }
            Some(value) => out.push_str(&stringify(value)),
        }
        rest = &after_open[end + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_path() {
        let payload = serde_json::json!({"trigger": {"subject": "Hi", "from": "a@b.com"}});
        let out = substitute("{{trigger.subject}} from {{trigger.from}}", &payload);
        assert_eq!(out, "Hi from a@b.com");
    }

    #[test]
    fn leaves_missing_path_literal() {
        let payload = serde_json::json!({"trigger": {"subject": "Hi"}});
        let out = substitute("{{trigger.missing}}", &payload);
        assert_eq!(out, "{{trigger.missing}}");
    }

    #[test]
    fn leaves_null_path_literal() {
        let payload = serde_json::json!({"trigger": {"from": null}});
        let out = substitute("{{trigger.from}}", &payload);
        assert_eq!(out, "{{trigger.from}}");
    }

    #[test]
    fn stringifies_non_string_values() {
        let payload = serde_json::json!({"trigger": {"count": 3}});
        assert_eq!(substitute("{{trigger.count}}", &payload), "3");
    }
}
