//! Rule set types and loading.
//!
//! A rule file is YAML:
//!
//! ```yaml
//! required_fields: [title, created_at, entity]
//! fields:
//!   title:
//!     type: str
//!     min_length: 1
//!     max_length: 500
//!   classification_id:
//!     type: int
//!     min_value: 1
//!     max_value: 50
//! ```
//!
//! Each field descriptor is compiled once into an ordered list of [`Rule`]s.

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::CoreError;

/// Primitive type a field value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ValueType {
    #[serde(rename = "str", alias = "string")]
    Str,
    #[serde(rename = "int", alias = "integer")]
    Int,
    #[serde(rename = "bool", alias = "boolean")]
    Bool,
    #[serde(rename = "float")]
    Float,
}

impl ValueType {
    /// Name as written in rule files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Float => "float",
        }
    }

    /// Whether `value` is an instance of this type. `null` never is.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Str => value.is_string(),
            Self::Int => value.is_i64() || value.is_u64(),
            Self::Bool => value.is_boolean(),
            Self::Float => value.is_f64(),
        }
    }
}

/// Field rule descriptor as written in the rule file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDescriptor {
    #[serde(rename = "type")]
    pub value_type: Option<ValueType>,
    pub regex: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub allowed_values: Option<Vec<Value>>,
    /// Human description of the regex, used in failure messages.
    pub description: Option<String>,
}

/// A single compiled check.
#[derive(Debug, Clone)]
pub enum Rule {
    Type(ValueType),
    Regex {
        pattern: Regex,
        description: Option<String>,
    },
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    Range {
        min: Option<f64>,
        max: Option<f64>,
    },
    AllowedValues(Vec<Value>),
}

/// Compiled rules for one field, in evaluation order
/// (type, regex, length, range, allowed values).
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    rules: Vec<Rule>,
}

impl FieldRules {
    /// Compile a descriptor. Fails on an invalid regex or inverted bounds.
    pub fn compile(field: &str, descriptor: RuleDescriptor) -> Result<Self, CoreError> {
        let mut rules = Vec::new();

        if let Some(value_type) = descriptor.value_type {
            rules.push(Rule::Type(value_type));
        }

        if let Some(pattern) = descriptor.regex {
            // Match from the start of the value, not anywhere inside it.
            let anchored = format!("^(?:{pattern})");
            let pattern = Regex::new(&anchored).map_err(|e| {
                CoreError::Config(format!("Invalid regex for field '{field}': {e}"))
            })?;
            rules.push(Rule::Regex {
                pattern,
                description: descriptor.description,
            });
        }

        if descriptor.min_length.is_some() || descriptor.max_length.is_some() {
            if let (Some(min), Some(max)) = (descriptor.min_length, descriptor.max_length) {
                if min > max {
                    return Err(CoreError::Config(format!(
                        "Field '{field}': min_length {min} exceeds max_length {max}"
                    )));
                }
            }
            rules.push(Rule::Length {
                min: descriptor.min_length,
                max: descriptor.max_length,
            });
        }

        if descriptor.min_value.is_some() || descriptor.max_value.is_some() {
            if let (Some(min), Some(max)) = (descriptor.min_value, descriptor.max_value) {
                if min > max {
                    return Err(CoreError::Config(format!(
                        "Field '{field}': min_value {min} exceeds max_value {max}"
                    )));
                }
            }
            rules.push(Rule::Range {
                min: descriptor.min_value,
                max: descriptor.max_value,
            });
        }

        if let Some(allowed) = descriptor.allowed_values {
            rules.push(Rule::AllowedValues(allowed));
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    #[serde(default)]
    required_fields: Vec<String>,
    #[serde(default)]
    fields: BTreeMap<String, RuleDescriptor>,
}

/// Immutable validation configuration: per-field rules plus the
/// required-field list.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: BTreeMap<String, FieldRules>,
    required_fields: Vec<String>,
}

impl RuleSet {
    /// Load a rule set from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CoreError::Config(format!(
                "Failed to read rule file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse a rule set from a YAML string.
    pub fn from_yaml(content: &str) -> Result<Self, CoreError> {
        let file: RuleFile = serde_yaml::from_str(content)
            .map_err(|e| CoreError::Config(format!("Failed to parse rule file: {e}")))?;
        Self::from_descriptors(file.fields, file.required_fields)
    }

    /// Build a rule set from already-parsed descriptors.
    ///
    /// Duplicate entries in `required_fields` are collapsed, keeping the
    /// first occurrence.
    pub fn from_descriptors(
        fields: impl IntoIterator<Item = (String, RuleDescriptor)>,
        required_fields: impl IntoIterator<Item = String>,
    ) -> Result<Self, CoreError> {
        let fields = fields
            .into_iter()
            .map(|(name, descriptor)| {
                let rules = FieldRules::compile(&name, descriptor)?;
                Ok((name, rules))
            })
            .collect::<Result<BTreeMap<_, _>, CoreError>>()?;

        let mut required: Vec<String> = Vec::new();
        for name in required_fields {
            if !required.contains(&name) {
                required.push(name);
            }
        }

        Ok(Self {
            fields,
            required_fields: required,
        })
    }

    /// Rules for `field`, if any are configured.
    pub fn field(&self, field: &str) -> Option<&FieldRules> {
        self.fields.get(field)
    }

    /// Ruled fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldRules)> {
        self.fields.iter().map(|(name, rules)| (name.as_str(), rules))
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.required_fields.iter().any(|f| f == field)
    }
}
