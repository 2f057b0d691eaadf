//! Rule-spec parsing
//!
//! A rule spec is a pipe-delimited list of rules, each optionally followed by
//! a colon and a comma-separated parameter list:
//!
//! ```text
//! ruleset   := rule ('|' rule)*
//! rule      := name (':' paramlist)?
//! paramlist := param (',' param)*
//! ```
//!
//! Parsing never fails. Rule names are not checked here; resolution against
//! the registry happens when the validator compiles a field's rules.

use std::fmt;

/// One parsed rule: its name and positional parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleInvocation {
    pub name: String,
    pub params: Vec<String>,
}

impl RuleInvocation {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Parameter at `index`, if present
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

impl fmt::Display for RuleInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.name, self.params.join(","))
        }
    }
}

/// Parse a full rule spec such as `"required|min:3|exists:users,email"`
pub fn parse_rules(spec: &str) -> Vec<RuleInvocation> {
    spec.split('|').map(parse_rule).collect()
}

/// Parse a single rule token such as `"exists:users,email"`
pub fn parse_rule(token: &str) -> RuleInvocation {
    match token.split_once(':') {
        Some((name, params)) => RuleInvocation {
            name: name.to_string(),
            params: params.split(',').map(str::to_string).collect(),
        },
        None => RuleInvocation {
            name: token.to_string(),
            params: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(spec: &str) -> Vec<String> {
        parse_rules(spec).into_iter().map(|r| r.name).collect()
    }

    #[test]
    fn test_parse_keeps_rule_order() {
        assert_eq!(
            names("required|min:3|exists:users,email"),
            vec!["required", "min", "exists"]
        );
    }

    #[test]
    fn test_parse_parameters() {
        let rules = parse_rules("required|min:3|exists:users,email");

        assert!(rules[0].params.is_empty());
        assert_eq!(rules[1].params, vec!["3"]);
        assert_eq!(rules[2].params, vec!["users", "email"]);
        assert_eq!(rules[2].param(1), Some("email"));
        assert_eq!(rules[2].param(2), None);
    }

    #[test]
    fn test_parse_splits_on_first_colon_only() {
        let rule = parse_rule("in:a:b,c");
        assert_eq!(rule.name, "in");
        assert_eq!(rule.params, vec!["a:b", "c"]);
    }

    #[test]
    fn test_parse_empty_tokens() {
        assert_eq!(names(""), vec![""]);
        assert_eq!(names("required||max:5"), vec!["required", "", "max"]);

        // an empty parameter blob still yields one empty parameter
        assert_eq!(parse_rule("min:").params, vec![""]);
    }

    #[test]
    fn test_parse_does_not_trim() {
        let rules = parse_rules("required | min:3");
        assert_eq!(rules[0].name, "required ");
        assert_eq!(rules[1].name, " min");
    }

    #[test]
    fn test_display_round_trips_spec_text() {
        let spec = "nullable|max:255|not_exists:posts,slug";
        let rendered: Vec<String> = parse_rules(spec).iter().map(|r| r.to_string()).collect();
        assert_eq!(rendered.join("|"), spec);
    }
}
