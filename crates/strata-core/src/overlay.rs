//! Named rule overlays and their wire form
//!
//! An [`Overlay`] is one source of truth for rule settings: a name, an ordered
//! rule table, an optional file scope and an optional processor reference.
//! The analysis engine consumes overlays as [`OverlayRecord`]s, the flat
//! `{ files, ignores, rules }` objects of its config loader.

use crate::rule::{RuleSetting, RuleTable, decode_rules, encode_rules};
use crate::scope::Scope;
use crate::tree::ConfigTree;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One named, ordered bundle of rule settings
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    name: String,
    rules: RuleTable,
    scope: Option<Scope>,
    processor: Option<String>,
    extra: Map<String, Value>,
}

impl Overlay {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: RuleTable::new(),
            scope: None,
            processor: None,
            extra: Map::new(),
        }
    }

    /// Build an overlay from a `rules` tree
    pub fn from_rules_tree(name: impl Into<String>, rules: &ConfigTree) -> Result<Self> {
        let name = name.into();
        let rules = decode_rules(&name, rules)?;
        Ok(Self::new(name).with_rules(rules))
    }

    /// Build an overlay from a raw engine object
    ///
    /// `fallback_name` is used when the record carries no `name`. Keys this
    /// layer does not interpret are carried through to [`Overlay::to_record`].
    pub fn from_record(fallback_name: &str, record: OverlayRecord) -> Result<Self> {
        let name = record.name.unwrap_or_else(|| fallback_name.to_string());
        let rules = match &record.rules {
            Some(tree) => decode_rules(&name, tree)?,
            None => RuleTable::new(),
        };
        let scope = if record.files.is_some() || record.ignores.is_some() {
            Some(Scope::new(
                &name,
                record.files,
                record.ignores.unwrap_or_default(),
            )?)
        } else {
            None
        };

        Ok(Self {
            name,
            rules,
            scope,
            processor: record.processor,
            extra: record.extra,
        })
    }

    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>, setting: impl Into<RuleSetting>) -> Self {
        self.rules.insert(rule_id.into(), setting.into());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_processor(mut self, processor: impl Into<String>) -> Self {
        self.processor = Some(processor.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn rule(&self, rule_id: &str) -> Option<&RuleSetting> {
        self.rules.get(rule_id)
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn processor(&self) -> Option<&str> {
        self.processor.as_deref()
    }

    /// Check whether this overlay applies to `path`; unscoped overlays are global
    pub fn applies_to(&self, path: &str) -> bool {
        self.scope.as_ref().is_none_or(|scope| scope.matches(path))
    }

    /// Convert to the engine's config-loader object
    pub fn to_record(&self) -> OverlayRecord {
        let (files, ignores) = match &self.scope {
            Some(scope) => (
                scope.includes().map(<[String]>::to_vec),
                Some(scope.excludes().to_vec()).filter(|ignores| !ignores.is_empty()),
            ),
            None => (None, None),
        };

        OverlayRecord {
            name: Some(self.name.clone()),
            files,
            ignores,
            rules: Some(encode_rules(&self.rules)).filter(|rules| !rules.is_empty()),
            processor: self.processor.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// Fold overlays into one rule table, later overlays winning per rule
///
/// Each later setting replaces the earlier `{severity, options}` pair as a
/// whole, the same result [`crate::tree::merge`] gives for scalar and array
/// values.
pub fn fold_rules<'a, I>(overlays: I) -> RuleTable
where
    I: IntoIterator<Item = &'a Overlay>,
{
    let mut folded = RuleTable::new();
    for overlay in overlays {
        for (rule_id, setting) in &overlay.rules {
            folded.insert(rule_id.clone(), setting.clone());
        }
    }
    folded
}

/// Overlay as exchanged with the analysis engine's config loader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Include globs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,

    /// Exclude globs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignores: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<ConfigTree>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor: Option<String>,

    /// Engine keys passed through untouched (plugins, language options, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
