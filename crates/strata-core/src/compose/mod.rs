//! Overlay composition
//!
//! The composer turns caller options into the final, ordered overlay sequence
//! handed to the analysis engine. Layers are placed at fixed positions:
//!
//! 1. `strata/defaults`: framework defaults
//! 2. `strata/stylistic`, `strata/type-aware`, `strata/formatters/*`:
//!    environment layers, each optional
//! 3. named presets (`jsdoc/*`, `perfectionist/*`, `unicorn/*`)
//! 4. `strata/opinions`, then `strata/editor` in editor mode
//! 5. scoped built-ins and the `strata/examples` processor layer
//! 6. caller overlays, verbatim
//! 7. `user/overrides`, always last
//!
//! Later layers win rule by rule for the files they apply to, so whatever the
//! caller puts in `ruleOverrides` wins over every preset.

mod options;
pub mod presets;

pub use options::{
    ComposeOptions, ExamplesOptions, OPTIONS_LAYER, StylisticOptions, TypeAwarenessOptions,
    options_schema,
};

use crate::fragment::{FenceSpec, Fragment};
use crate::overlay::{Overlay, OverlayRecord, fold_rules};
use crate::processor::{ExampleProcessor, Processor, ProcessorRegistry};
use crate::remap::SuppressionList;
use crate::rule::{RuleSetting, RuleTable, Severity};
use crate::scope::{Scope, applicable_overlays, normalize_path};
use crate::tree::{ConfigTree, merge};
use crate::{Result, StrataError};
use presets::ScopedLayer;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

pub const DEFAULTS_LAYER: &str = "strata/defaults";
pub const STYLISTIC_LAYER: &str = "strata/stylistic";
pub const TYPE_AWARE_LAYER: &str = "strata/type-aware";
pub const OPINIONS_LAYER: &str = "strata/opinions";
pub const EDITOR_LAYER: &str = "strata/editor";
pub const EXAMPLES_LAYER: &str = "strata/examples";
pub const IGNORES_LAYER: &str = "strata/ignores";
pub const USER_LAYER: &str = "user/overrides";

/// Virtual paths of extracted fragments
pub const FRAGMENT_PATHS: &str = "**/*.md/*";

/// Name the examples processor is registered under
pub const EXAMPLES_PROCESSOR: &str = "strata/examples";

/// Concatenate baseline, caller and user layers in precedence order
///
/// The user layer always lands last, so its settings win for every path it
/// applies to regardless of how many layers precede it.
pub fn build_layers(baseline: Vec<Overlay>, caller: Vec<Overlay>, user: Overlay) -> Vec<Overlay> {
    let mut layers = Vec::with_capacity(baseline.len() + caller.len() + 1);
    layers.extend(baseline);
    layers.extend(caller);
    layers.push(user);
    layers
}

/// Compose overlays from a caller option tree and extra raw overlays
pub fn compose(options: &ConfigTree, extra: Vec<OverlayRecord>) -> Result<CompositionResult> {
    Composer::from_tree(options)?.compose(extra)
}

/// Builds composition results from decoded options
#[derive(Debug, Clone)]
pub struct Composer {
    options: ComposeOptions,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(ComposeOptions::default())
    }
}

impl Composer {
    pub fn new(options: ComposeOptions) -> Self {
        Self { options }
    }

    /// Merge a caller tree over the default options and build a composer
    pub fn from_tree(tree: &ConfigTree) -> Result<Self> {
        ComposeOptions::from_tree(tree).map(Self::new)
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Build the full overlay sequence
    ///
    /// Fails fast on the first structural error; nothing is partially applied.
    pub fn compose(&self, extra: Vec<OverlayRecord>) -> Result<CompositionResult> {
        let options = &self.options;
        let mut processors = ProcessorRegistry::new();

        let baseline = self.baseline(&mut processors)?;

        let caller = extra
            .into_iter()
            .enumerate()
            .map(|(index, record)| Overlay::from_record(&format!("user/extra-{index}"), record))
            .collect::<Result<Vec<_>>>()?;

        let user = Overlay::from_rules_tree(USER_LAYER, &options.rule_overrides)?;
        let overlays = build_layers(baseline, caller, user);

        let ignore_patterns: Vec<String> = presets::DEFAULT_IGNORES
            .iter()
            .map(|p| p.to_string())
            .chain(options.ignore_paths.iter().cloned())
            .collect();
        let ignores = Scope::new(IGNORES_LAYER, Some(ignore_patterns), Vec::new())?;

        let settings = PipelineSettings {
            formatting: options.formatting,
            editor_mode: options.editor_mode,
            stylistic: options.stylistic.enabled,
            type_aware: options
                .type_awareness
                .config_path
                .as_ref()
                .map(|config_path| TypeAwareSettings {
                    config_path: config_path.clone(),
                    ignored_paths: options.type_awareness.ignored_paths.clone(),
                }),
            examples: options.examples.enabled,
        };

        debug!(
            layers = overlays.len(),
            processors = processors.names().count(),
            "Composed overlay sequence"
        );

        Ok(CompositionResult {
            overlays,
            settings,
            ignores,
            processors,
        })
    }

    fn baseline(&self, processors: &mut ProcessorRegistry) -> Result<Vec<Overlay>> {
        let options = &self.options;
        let mut layers = vec![Overlay::from_rules_tree(
            DEFAULTS_LAYER,
            &presets::framework_defaults(),
        )?];

        if options.stylistic.enabled {
            let rules = merge(&presets::stylistic(), &options.stylistic.overrides);
            layers.push(Overlay::from_rules_tree(STYLISTIC_LAYER, &rules)?);
        }

        if options.type_awareness.config_path.is_some() {
            let rules = merge(&presets::type_aware(), &options.type_awareness.overrides);
            let scope = Scope::new(
                TYPE_AWARE_LAYER,
                Some(to_strings(presets::TYPE_AWARE_FILES)),
                options.type_awareness.ignored_paths.clone(),
            )?;
            layers.push(Overlay::from_rules_tree(TYPE_AWARE_LAYER, &rules)?.with_scope(scope));
        }

        if options.formatting {
            for layer in presets::formatters() {
                layers.push(scoped_overlay(layer)?);
            }
        }

        for (name, rules) in presets::named_presets() {
            layers.push(Overlay::from_rules_tree(name, &rules)?);
        }

        layers.push(Overlay::from_rules_tree(OPINIONS_LAYER, &presets::opinions())?);

        if options.editor_mode {
            let rules: RuleTable = presets::EDITOR_DISABLED_RULES
                .iter()
                .map(|rule_id| (rule_id.to_string(), RuleSetting::new(Severity::Off)))
                .collect();
            layers.push(Overlay::new(EDITOR_LAYER).with_rules(rules));
        }

        for layer in presets::scoped_layers() {
            layers.push(scoped_overlay(layer)?);
        }

        if options.examples.enabled {
            let examples = &options.examples;
            let pattern = FenceSpec {
                name: examples.matching_file_name.clone(),
                begin: examples.begin.clone(),
                end: examples.end.clone(),
                regex: examples.pattern.clone(),
                default_extension: examples.default_extension.clone(),
                within_doc_comments: examples.within_doc_comments,
                ..FenceSpec::default()
            }
            .compile(EXAMPLES_LAYER)?;

            let mut suppression = SuppressionList::default();
            suppression.extend(examples.suppressed_rules.iter().cloned());
            processors.register(Arc::new(
                ExampleProcessor::new(EXAMPLES_PROCESSOR, pattern).with_suppression(suppression),
            ));

            // Fragments are never processed again
            let scope = Scope::new(
                EXAMPLES_LAYER,
                Some(examples.files.clone()),
                vec![FRAGMENT_PATHS.to_string()],
            )?;
            layers.push(
                Overlay::new(EXAMPLES_LAYER)
                    .with_scope(scope)
                    .with_processor(EXAMPLES_PROCESSOR),
            );
        }

        Ok(layers)
    }
}

fn scoped_overlay(layer: ScopedLayer) -> Result<Overlay> {
    let scope = Scope::new(layer.name, Some(to_strings(layer.files)), to_strings(layer.ignores))?;
    Ok(Overlay::from_rules_tree(layer.name, &layer.rules)?.with_scope(scope))
}

fn to_strings(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

/// Ancillary settings for the engine's sub-pipelines
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSettings {
    pub formatting: bool,
    pub editor_mode: bool,
    pub stylistic: bool,
    pub type_aware: Option<TypeAwareSettings>,
    pub examples: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAwareSettings {
    pub config_path: String,
    pub ignored_paths: Vec<String>,
}

/// Final composition handed to the analysis engine
///
/// Immutable once built and safe to share across analysis workers.
#[derive(Debug, Clone)]
pub struct CompositionResult {
    overlays: Vec<Overlay>,
    settings: PipelineSettings,
    ignores: Scope,
    processors: ProcessorRegistry,
}

impl CompositionResult {
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn overlay(&self, name: &str) -> Option<&Overlay> {
        self.overlays.iter().find(|overlay| overlay.name() == name)
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn processors(&self) -> &ProcessorRegistry {
        &self.processors
    }

    pub fn processor(&self, name: &str) -> Option<&Arc<dyn Processor>> {
        self.processors.get(name)
    }

    /// Global ignore globs
    pub fn ignore_patterns(&self) -> &[String] {
        self.ignores.includes().unwrap_or_default()
    }

    /// Whether `path` is excluded from analysis altogether
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignores.matches(path)
    }

    /// Overlays whose scope accepts `path`, in sequence order
    pub fn applicable_overlays(&self, path: &str) -> Vec<&Overlay> {
        applicable_overlays(path, &self.overlays)
    }

    /// Effective configuration for `path`, or `None` when it is ignored
    pub fn resolve(&self, path: &str) -> Option<ResolvedConfig> {
        if self.is_ignored(path) {
            trace!(path, "Path is globally ignored");
            return None;
        }

        let applicable = self.applicable_overlays(path);
        let processor = applicable
            .iter()
            .rev()
            .find_map(|overlay| overlay.processor())
            .map(str::to_string);

        trace!(path, layers = applicable.len(), "Resolved path");

        Some(ResolvedConfig {
            path: normalize_path(path).into_owned(),
            layers: applicable.iter().map(|o| o.name().to_string()).collect(),
            rules: fold_rules(applicable),
            processor,
        })
    }

    /// Effective configuration for a fragment, addressed by its virtual path
    pub fn resolve_fragment(&self, fragment: &Fragment) -> Option<ResolvedConfig> {
        self.resolve(fragment.virtual_id())
    }

    /// Overlay objects for the engine's config loader, ignores first
    pub fn records(&self) -> Vec<OverlayRecord> {
        let ignores = OverlayRecord {
            name: Some(IGNORES_LAYER.to_string()),
            ignores: Some(self.ignore_patterns().to_vec()),
            ..OverlayRecord::default()
        };

        std::iter::once(ignores)
            .chain(self.overlays.iter().map(Overlay::to_record))
            .collect()
    }

    /// Records as a JSON array
    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self.records()).map_err(|e| {
            StrataError::config_error(format!("failed to serialize composition: {e}"))
        })
    }
}

/// Rules in effect for one path after folding applicable overlays
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub path: String,
    /// Names of the overlays that applied, in order
    pub layers: Vec<String>,
    pub rules: RuleTable,
    /// Processor of the last applicable overlay naming one
    pub processor: Option<String>,
}

impl ResolvedConfig {
    pub fn rule(&self, rule_id: &str) -> Option<&RuleSetting> {
        self.rules.get(rule_id)
    }

    pub fn severity(&self, rule_id: &str) -> Option<Severity> {
        self.rule(rule_id).map(|setting| setting.severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> ConfigTree {
        ConfigTree::from_value(value).unwrap()
    }

    fn layer_names(result: &CompositionResult) -> Vec<&str> {
        result.overlays().iter().map(Overlay::name).collect()
    }

    #[test]
    fn test_default_layer_order() {
        let result = Composer::default().compose(Vec::new()).unwrap();
        let names = layer_names(&result);

        assert_eq!(names.first(), Some(&DEFAULTS_LAYER));
        assert_eq!(names.last(), Some(&USER_LAYER));

        let position = |name: &str| names.iter().position(|n| *n == name).unwrap();
        assert!(position(STYLISTIC_LAYER) < position("jsdoc/contents-typescript"));
        assert!(position("jsdoc/contents-typescript") < position("unicorn/recommended"));
        assert!(position("unicorn/recommended") < position(OPINIONS_LAYER));
        assert!(position(OPINIONS_LAYER) < position("strata/file-overview"));
        assert!(position("strata/file-overview") < position(EXAMPLES_LAYER));
        assert!(!names.contains(&EDITOR_LAYER));
    }

    #[test]
    fn test_build_layers_puts_user_last() {
        let layers = build_layers(
            vec![Overlay::new("a"), Overlay::new("b")],
            vec![Overlay::new("c")],
            Overlay::new("user"),
        );
        let names: Vec<_> = layers.iter().map(Overlay::name).collect();
        assert_eq!(names, vec!["a", "b", "c", "user"]);
    }

    #[test]
    fn test_opinions_override_presets() {
        let result = Composer::default().compose(Vec::new()).unwrap();
        let resolved = result.resolve("lib/util.ts").unwrap();

        assert_eq!(resolved.severity("unicorn/no-null"), Some(Severity::Off));
        assert_eq!(resolved.severity("jsdoc/require-jsdoc"), Some(Severity::Off));
        assert_eq!(
            resolved.rule("unicorn/prevent-abbreviations").unwrap().options,
            vec![json!({ "checkFilenames": false })]
        );
    }

    #[test]
    fn test_scoped_builtin_applies_to_source() {
        let result = Composer::default().compose(Vec::new()).unwrap();

        let src = result.resolve("src/index.ts").unwrap();
        assert_eq!(src.severity("jsdoc/require-jsdoc"), Some(Severity::Warn));
        assert_eq!(src.severity("jsdoc/require-file-overview"), Some(Severity::Warn));

        let declaration = result.resolve("src/types.d.ts").unwrap();
        assert_eq!(declaration.severity("jsdoc/require-file-overview"), None);
    }

    #[test]
    fn test_type_aware_scope() {
        let result = Composer::default().compose(Vec::new()).unwrap();

        let ts = result.resolve("src/a.ts").unwrap();
        assert_eq!(ts.severity("ts/no-deprecated"), Some(Severity::Warn));
        assert_eq!(ts.severity("ts/strict-boolean-expressions"), Some(Severity::Off));

        let js = result.resolve("src/a.js").unwrap();
        assert_eq!(js.severity("ts/no-deprecated"), None);

        let fragment = result.resolve("src/a.ts/0_example.md/0.ts").unwrap();
        assert_eq!(fragment.severity("ts/no-deprecated"), None);
    }

    #[test]
    fn test_disabling_environment_layers() {
        let result = compose(
            &tree(json!({
                "formatting": false,
                "stylistic": { "enabled": false },
                "typeAwareness": { "configPath": null },
                "examples": { "enabled": false }
            })),
            Vec::new(),
        )
        .unwrap();
        let names = layer_names(&result);

        assert!(!names.contains(&STYLISTIC_LAYER));
        assert!(!names.contains(&TYPE_AWARE_LAYER));
        assert!(!names.contains(&EXAMPLES_LAYER));
        assert!(!names.iter().any(|n| n.starts_with("strata/formatters")));
        assert!(result.settings().type_aware.is_none());
        assert!(result.processors().is_empty());
    }

    #[test]
    fn test_editor_mode_turns_rules_off() {
        let result = compose(&tree(json!({ "editorMode": true })), Vec::new()).unwrap();
        let resolved = result.resolve("lib/a.js").unwrap();

        assert!(result.settings().editor_mode);
        assert_eq!(resolved.severity("prefer-const"), Some(Severity::Off));
        assert_eq!(
            resolved.severity("unused-imports/no-unused-imports"),
            Some(Severity::Off)
        );
    }

    #[test]
    fn test_caller_overlays_keep_order_before_user_layer() {
        let extra = vec![
            serde_json::from_value(json!({ "rules": { "curly": "error" } })).unwrap(),
            serde_json::from_value(json!({ "name": "vue", "files": ["**/*.vue"], "rules": { "curly": "off" } }))
                .unwrap(),
        ];
        let result = compose(&tree(json!({ "rules": { "eqeqeq": "off" } })), extra).unwrap();
        let names = layer_names(&result);

        let tail = &names[names.len() - 3..];
        assert_eq!(tail, ["user/extra-0", "vue", USER_LAYER]);

        assert_eq!(result.resolve("a.js").unwrap().severity("curly"), Some(Severity::Error));
        assert_eq!(result.resolve("a.vue").unwrap().severity("curly"), Some(Severity::Off));
    }

    #[test]
    fn test_malformed_pattern_aborts_composition() {
        let err = compose(
            &tree(json!({ "examples": { "begin": "```(ts" } })),
            Vec::new(),
        )
        .unwrap_err();

        assert_eq!(err.layer(), Some(EXAMPLES_LAYER));
    }

    #[test]
    fn test_combined_example_pattern() {
        let ok = compose(
            &tree(json!({ "examples": { "pattern": "@example\\n(?<body>[\\s\\S]*?)\\n\\n" } })),
            Vec::new(),
        );
        assert!(ok.is_ok());

        let err = compose(
            &tree(json!({ "examples": { "pattern": "@example[\\s\\S]*" } })),
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err.layer(), Some(EXAMPLES_LAYER));
    }

    #[test]
    fn test_invalid_extra_overlay_names_layer() {
        let extra = vec![
            OverlayRecord::default(),
            serde_json::from_value(json!({ "files": ["src/[oops"] })).unwrap(),
        ];
        let err = compose(&ConfigTree::new(), extra).unwrap_err();
        assert_eq!(err.layer(), Some("user/extra-1"));
    }

    #[test]
    fn test_invalid_user_rule_names_user_layer() {
        let err = compose(&tree(json!({ "ruleOverrides": { "curly": "loud" } })), Vec::new())
            .unwrap_err();
        assert_eq!(err.layer(), Some(USER_LAYER));
    }

    #[test]
    fn test_global_ignores() {
        let result = compose(&tree(json!({ "ignorePaths": ["generated/**"] })), Vec::new()).unwrap();

        assert!(result.is_ignored("generated/api.ts"));
        assert!(result.is_ignored("node_modules/pkg/index.js"));
        assert!(result.resolve("generated/api.ts").is_none());
        assert!(result.resolve("src/api.ts").is_some());
    }

    #[test]
    fn test_examples_processor_resolution() {
        let result = Composer::default().compose(Vec::new()).unwrap();

        assert_eq!(
            result.resolve("src/a.ts").unwrap().processor.as_deref(),
            Some(EXAMPLES_PROCESSOR)
        );
        assert_eq!(result.resolve("src/a.js").unwrap().processor, None);
        assert_eq!(
            result.resolve("src/a.ts/0_example.md/0.ts").unwrap().processor,
            None
        );
        assert!(result.processor(EXAMPLES_PROCESSOR).is_some());
    }

    #[test]
    fn test_records_start_with_ignores() {
        let result = Composer::default().compose(Vec::new()).unwrap();
        let json = result.to_json().unwrap();
        let records = json.as_array().unwrap();

        assert_eq!(records.len(), result.overlays().len() + 1);
        assert_eq!(records[0]["name"], json!(IGNORES_LAYER));
        assert!(records[0].get("rules").is_none());
        assert_eq!(records[1]["name"], json!(DEFAULTS_LAYER));
    }
}
