//! Per-field rule evaluation. Pure logic.

use serde_json::Value;

use super::rules::{Rule, RuleSet};
use crate::types::{scalar_text, value_kind};

/// Result of checking one field value against its rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCheck {
    Valid,
    Invalid(String),
}

impl FieldCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Failure message, if the check failed.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid(message) => Some(message),
        }
    }
}

/// Check `value` against the rules configured for `field_name`.
///
/// Fields without rules always pass. An absent value is treated as `null`.
/// Rules run in their compiled order and the first failure wins.
pub fn validate_field(field_name: &str, value: Option<&Value>, rule_set: &RuleSet) -> FieldCheck {
    let Some(field) = rule_set.field(field_name) else {
        return FieldCheck::Valid;
    };
    let value = value.unwrap_or(&Value::Null);

    for rule in field.rules() {
        if let Err(message) = check_rule(rule, value) {
            return FieldCheck::Invalid(message);
        }
    }
    FieldCheck::Valid
}

fn check_rule(rule: &Rule, value: &Value) -> Result<(), String> {
    match rule {
        Rule::Type(expected) => {
            if expected.matches(value) {
                Ok(())
            } else {
                Err(format!(
                    "Wrong type. Expected: {}, got: {}",
                    expected.as_str(),
                    value_kind(value)
                ))
            }
        }
        Rule::Regex {
            pattern,
            description,
        } => {
            if !value.is_null() && pattern.is_match(&scalar_text(value)) {
                Ok(())
            } else {
                Err(format!(
                    "Does not match pattern: {}",
                    description.as_deref().unwrap_or("")
                ))
            }
        }
        Rule::Length { min, max } => {
            let fits = !value.is_null() && {
                let len = scalar_text(value).chars().count();
                min.is_none_or(|min| len >= min) && max.is_none_or(|max| len <= max)
            };
            if fits {
                Ok(())
            } else {
                Err(format!(
                    "Length out of range. Min: {}, Max: {}",
                    bound(min),
                    bound(max)
                ))
            }
        }
        Rule::Range { min, max } => {
            let fits = as_number(value)
                .is_some_and(|n| min.is_none_or(|min| n >= min) && max.is_none_or(|max| n <= max));
            if fits {
                Ok(())
            } else {
                Err(format!(
                    "Value out of range. Min: {}, Max: {}",
                    bound(min),
                    bound(max)
                ))
            }
        }
        Rule::AllowedValues(allowed) => {
            if allowed.contains(value) {
                Ok(())
            } else {
                let listed: Vec<String> = allowed.iter().map(Value::to_string).collect();
                Err(format!("Value not allowed. Allowed: [{}]", listed.join(", ")))
            }
        }
    }
}

/// Coerce a value to `f64`: numbers as-is, strings parsed after trimming.
fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (!n.is_nan()).then_some(n)
}

fn bound<T: std::fmt::Display>(b: &Option<T>) -> String {
    b.as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "N/A".to_string())
}
