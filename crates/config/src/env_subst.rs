/// Replace `${ENV_VAR}` and `${ENV_VAR:-fallback}` placeholders in raw
/// config text.
///
/// Unresolvable variables without a fallback are left as-is so validation can
/// point at them.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with a custom lookup, so tests never touch the
/// process environment.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next(); // consume '{'
        let mut inner = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '}' {
                closed = true;
                break;
            }
            inner.push(c);
        }
        if !closed || inner.is_empty() {
            // Malformed, emit literal.
            result.push_str("${");
            result.push_str(&inner);
            continue;
        }
        let (name, fallback) = match inner.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (inner.as_str(), None),
        };
        match (lookup(name), fallback) {
            (Some(val), _) if !val.is_empty() => result.push_str(&val),
            (_, Some(fallback)) => result.push_str(fallback),
            (Some(val), None) => result.push_str(&val),
            (None, None) => {
                result.push_str("${");
                result.push_str(&inner);
                result.push('}');
            },
        }
    }

    result
}

/// Whether `value` still contains an unresolved `${...}` placeholder.
pub fn has_placeholder(value: &str) -> bool {
    value
        .find("${")
        .is_some_and(|start| value[start..].contains('}'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "SLACK_TOKEN" => Some("xoxb-123".to_string()),
            "EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_env_with("token = \"${SLACK_TOKEN}\"", lookup),
            "token = \"xoxb-123\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_env_with("${CHATBRIDGE_NONEXISTENT}", lookup),
            "${CHATBRIDGE_NONEXISTENT}"
        );
    }

    #[test]
    fn fallback_used_when_missing_or_empty() {
        assert_eq!(substitute_env_with("${MISSING:-general}", lookup), "general");
        assert_eq!(substitute_env_with("${EMPTY:-general}", lookup), "general");
        assert_eq!(substitute_env_with("${SLACK_TOKEN:-x}", lookup), "xoxb-123");
    }

    #[test]
    fn malformed_placeholder_is_literal() {
        assert_eq!(substitute_env_with("cost ${5", lookup), "cost ${5");
        assert_eq!(substitute_env_with("$5 and ${}", lookup), "$5 and ${");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }

    #[test]
    fn detects_placeholders() {
        assert!(has_placeholder("${SLACK_TOKEN}"));
        assert!(!has_placeholder("xoxb-123"));
        assert!(!has_placeholder("${unterminated"));
    }
}
