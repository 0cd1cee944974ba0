//! Caller options for composition
//!
//! Options arrive as a [`ConfigTree`]. The caller's tree is deep-merged over
//! the default option tree, so a caller only spells out what differs, and the
//! merged tree is then decoded into [`ComposeOptions`].

use super::presets;
use crate::fragment::{DEFAULT_BEGIN, DEFAULT_END, DEFAULT_NAME};
use crate::tree::{ConfigTree, merge};
use crate::{Result, StrataError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Layer name used when the options object itself is malformed
pub const OPTIONS_LAYER: &str = "user/options";

/// Top-level composition options
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ComposeOptions {
    /// Enable the auxiliary formatting sub-pipeline
    #[schemars(description = "Enable formatter layers for stylesheets and markup")]
    pub formatting: bool,

    /// Suppress rules unsuitable for incremental, in-editor runs
    #[schemars(description = "Turn off rules that fight with in-editor fixes")]
    pub editor_mode: bool,

    /// Global exclusion globs
    #[schemars(description = "Glob patterns of files never analyzed")]
    pub ignore_paths: Vec<String>,

    /// Type-aware sub-pipeline
    #[schemars(description = "Type-aware analysis settings")]
    pub type_awareness: TypeAwarenessOptions,

    /// Stylistic preset
    #[schemars(description = "Stylistic preset settings")]
    pub stylistic: StylisticOptions,

    /// Final user override layer; `rules` is accepted as an alias
    #[schemars(
        description = "Rule settings applied after every other layer",
        with = "BTreeMap<String, Value>"
    )]
    pub rule_overrides: ConfigTree,

    /// Embedded example processing
    #[schemars(description = "Fenced example extraction settings")]
    pub examples: ExamplesOptions,
}

/// Type-aware analysis options
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct TypeAwarenessOptions {
    /// Files excluded from type-aware rules
    #[schemars(description = "Glob patterns excluded from type-aware rules")]
    pub ignored_paths: Vec<String>,

    /// Rule settings merged over the type-aware preset
    #[schemars(
        description = "Type-aware rule overrides",
        with = "BTreeMap<String, Value>"
    )]
    pub overrides: ConfigTree,

    /// Project file for type information; `null` disables type-aware rules
    #[schemars(description = "Path of the project's type configuration")]
    pub config_path: Option<String>,
}

/// Stylistic preset options
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct StylisticOptions {
    #[schemars(description = "Enable the stylistic preset")]
    pub enabled: bool,

    /// Rule settings merged over the stylistic preset
    #[schemars(
        description = "Stylistic rule overrides",
        with = "BTreeMap<String, Value>"
    )]
    pub overrides: ConfigTree,
}

/// Fenced example extraction options
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ExamplesOptions {
    #[schemars(description = "Lint fenced examples embedded in documentation")]
    pub enabled: bool,

    /// Parent documents scanned for examples
    #[schemars(description = "Glob patterns of documents scanned for examples")]
    pub files: Vec<String>,

    /// Begin delimiter regex; a `lang` group selects the fragment extension
    #[schemars(description = "Regex matching the opening fence")]
    pub begin: String,

    /// End delimiter regex
    #[schemars(description = "Regex matching the closing fence")]
    pub end: String,

    /// Single regex covering a whole example; replaces `begin`/`end` when set
    #[schemars(description = "Regex with one body capture group matching a whole example")]
    pub pattern: Option<String>,

    /// Declared name used in fragment virtual paths
    #[schemars(description = "Name used in virtual fragment paths")]
    pub matching_file_name: String,

    /// Extension used when the opening fence names no language
    #[schemars(description = "Fragment extension when no language is captured")]
    pub default_extension: String,

    /// Only scan `/** ... */` documentation comments
    #[schemars(description = "Restrict scanning to documentation comments")]
    pub within_doc_comments: bool,

    /// Rules dropped from fragment findings in addition to the defaults
    #[schemars(description = "Extra rules suppressed inside fragments")]
    pub suppressed_rules: Vec<String>,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            formatting: true,
            editor_mode: false,
            ignore_paths: Vec::new(),
            type_awareness: TypeAwarenessOptions::default(),
            stylistic: StylisticOptions::default(),
            rule_overrides: ConfigTree::new(),
            examples: ExamplesOptions::default(),
        }
    }
}

impl Default for TypeAwarenessOptions {
    fn default() -> Self {
        Self {
            ignored_paths: vec!["**/*.md/*.ts".to_string(), "**/*.as.ts".to_string()],
            overrides: presets::type_aware_overrides(),
            config_path: Some("tsconfig.json".to_string()),
        }
    }
}

impl Default for StylisticOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            overrides: presets::stylistic_overrides(),
        }
    }
}

impl Default for ExamplesOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            files: vec!["**/*.ts".to_string()],
            begin: DEFAULT_BEGIN.to_string(),
            end: DEFAULT_END.to_string(),
            pattern: None,
            matching_file_name: DEFAULT_NAME.to_string(),
            default_extension: "ts".to_string(),
            within_doc_comments: true,
            suppressed_rules: Vec::new(),
        }
    }
}

impl ComposeOptions {
    /// Default options as a tree, the base every caller tree is merged over
    pub fn default_tree() -> ConfigTree {
        serde_json::to_value(Self::default())
            .ok()
            .and_then(|value| ConfigTree::from_value(value).ok())
            .unwrap_or_default()
    }

    /// Merge a caller tree over the defaults and decode it
    pub fn from_tree(caller: &ConfigTree) -> Result<Self> {
        let caller = normalize_aliases(caller);
        let merged = merge(&Self::default_tree(), &caller);

        serde_json::from_value(merged.into_value()).map_err(|e| {
            StrataError::config_error(format!("invalid options in layer '{OPTIONS_LAYER}': {e}"))
        })
    }
}

/// Fold the `rules` alias into `ruleOverrides`, `rules` taking precedence
fn normalize_aliases(tree: &ConfigTree) -> ConfigTree {
    if !tree.contains_key("rules") {
        return tree.clone();
    }

    let mut normalized = tree.clone();
    let Some(rules) = normalized.remove("rules") else {
        return normalized;
    };

    let mut alias = ConfigTree::new();
    alias.insert("ruleOverrides", rules);
    merge(&normalized, &alias)
}

/// JSON Schema of the options object
pub fn options_schema() -> Result<Value> {
    let schema = schemars::schema_for!(ComposeOptions);
    serde_json::to_value(schema)
        .map_err(|e| StrataError::config_error(format!("failed to render options schema: {e}")))
}
