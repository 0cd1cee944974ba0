//! Rule severities and per-rule settings
//!
//! A rule setting is either a bare severity (`"warn"`, `2`) or an array whose
//! first element is the severity and whose remaining elements are
//! rule-specific options (`["warn", "always", { "tags": ["param"] }]`).

use crate::tree::{ConfigTree, value_kind};
use crate::{Result, StrataError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Ordered rule id to setting table
pub type RuleTable = IndexMap<String, RuleSetting>;

/// Rule severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Disable the rule
    Off,
    /// Warning (doesn't fail the run)
    Warn,
    /// Error (fails the run)
    Error,
}

impl Severity {
    /// Decode the string (`"off"`, `"warn"`, `"error"`) or numeric (`0`, `1`, `2`) form
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => match s.as_str() {
                "off" => Some(Self::Off),
                "warn" => Some(Self::Warn),
                "error" => Some(Self::Error),
                _ => None,
            },
            Value::Number(n) => match n.as_u64() {
                Some(0) => Some(Self::Off),
                Some(1) => Some(Self::Warn),
                Some(2) => Some(Self::Error),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity plus rule-specific options
///
/// Settings are replaced as a whole when a later layer names the same rule;
/// options from an earlier layer never survive a later severity-only setting.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSetting {
    pub severity: Severity,
    pub options: Vec<Value>,
}

impl RuleSetting {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            options: Vec::new(),
        }
    }

    pub fn with_options(severity: Severity, options: Vec<Value>) -> Self {
        Self { severity, options }
    }

    /// Decode a setting, returning a message describing the problem on failure
    pub fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Array(items) => {
                let (first, rest) = items
                    .split_first()
                    .ok_or_else(|| "empty setting array".to_string())?;
                let severity = Severity::from_value(first)
                    .ok_or_else(|| format!("unknown severity {first}"))?;
                Ok(Self::with_options(severity, rest.to_vec()))
            }
            Value::String(_) | Value::Number(_) => Severity::from_value(value)
                .map(Self::new)
                .ok_or_else(|| format!("unknown severity {value}")),
            other => Err(format!(
                "expected a severity or [severity, ...options], found {}",
                value_kind(other)
            )),
        }
    }

    /// Encode back to the engine's wire form
    pub fn to_value(&self) -> Value {
        if self.options.is_empty() {
            Value::String(self.severity.as_str().to_string())
        } else {
            let mut items = Vec::with_capacity(self.options.len() + 1);
            items.push(Value::String(self.severity.as_str().to_string()));
            items.extend(self.options.iter().cloned());
            Value::Array(items)
        }
    }
}

impl From<Severity> for RuleSetting {
    fn from(severity: Severity) -> Self {
        Self::new(severity)
    }
}

impl Serialize for RuleSetting {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RuleSetting {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// Decode a `rules` tree into a rule table, attributing failures to `layer`
///
/// Rule ids are not validated; unknown rules pass through untouched.
pub fn decode_rules(layer: &str, rules: &ConfigTree) -> Result<RuleTable> {
    rules
        .iter()
        .map(|(rule_id, value)| {
            RuleSetting::from_value(value)
                .map(|setting| (rule_id.clone(), setting))
                .map_err(|message| StrataError::invalid_rule_setting(layer, rule_id, message))
        })
        .collect()
}

/// Encode a rule table into a tree, the inverse of [`decode_rules`]
pub fn encode_rules(rules: &RuleTable) -> ConfigTree {
    let mut tree = ConfigTree::new();
    for (rule_id, setting) in rules {
        tree.insert(rule_id.clone(), setting.to_value());
    }
    tree
}
