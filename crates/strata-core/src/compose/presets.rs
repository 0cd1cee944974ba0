//! Built-in rule tables
//!
//! Each table is plain data; the composer turns them into named overlays at
//! fixed positions in the layer sequence.

use crate::tree::ConfigTree;
use serde_json::{Value, json};

/// Files matched by the type-aware layer
pub const TYPE_AWARE_FILES: &[&str] = &["**/*.{ts,tsx,mts,cts}"];

/// Paths ignored globally before any caller `ignorePaths`
pub const DEFAULT_IGNORES: &[&str] = &[
    "**/node_modules/**",
    "**/dist/**",
    "**/coverage/**",
    "**/.git/**",
    "**/package-lock.json",
    "**/pnpm-lock.yaml",
    "**/yarn.lock",
];

/// Rules turned off when composing for an editor session
pub const EDITOR_DISABLED_RULES: &[&str] = &[
    "unused-imports/no-unused-imports",
    "test/no-only-tests",
    "prefer-const",
];

/// Built-in layer restricted to matching files
#[derive(Debug, Clone)]
pub struct ScopedLayer {
    pub name: &'static str,
    pub files: &'static [&'static str],
    pub ignores: &'static [&'static str],
    pub rules: ConfigTree,
}

fn table(value: Value) -> ConfigTree {
    match value {
        Value::Object(map) => map.into(),
        _ => ConfigTree::new(),
    }
}

/// Framework defaults for every file
pub fn framework_defaults() -> ConfigTree {
    table(json!({
        "no-console": ["error", { "allow": ["warn", "error"] }],
        "no-debugger": "error",
        "no-var": "error",
        "prefer-const": ["error", { "destructuring": "all", "ignoreReadBeforeAssign": true }],
        "eqeqeq": ["error", "smart"],
        "no-unused-vars": "off",
        "no-undef": "error",
        "no-eval": "error",
        "no-implied-eval": "error",
        "no-new-func": "error",
        "no-self-compare": "error",
        "no-unreachable": "error",
        "no-unsafe-finally": "error",
        "no-useless-catch": "error",
        "prefer-template": "error",
        "object-shorthand": ["error", "always", { "avoidQuotes": true, "ignoreConstructors": false }],
        "curly": ["error", "multi-or-nest", "consistent"],
        "antfu/no-top-level-await": "error",
        "node/prefer-global/buffer": ["error", "never"],
        "node/prefer-global/process": ["error", "never"],
        "unused-imports/no-unused-imports": "error",
        "unused-imports/no-unused-vars": ["error", { "args": "after-used", "ignoreRestSiblings": true }],
        "test/no-only-tests": "error",
        "regexp/no-unused-capturing-group": "error"
    }))
}

/// Stylistic preset
pub fn stylistic() -> ConfigTree {
    table(json!({
        "style/indent": ["error", 2],
        "style/quotes": ["error", "single", { "avoidEscape": true }],
        "style/semi": ["error", "never"],
        "style/brace-style": ["error", "1tbs", { "allowSingleLine": true }],
        "style/comma-dangle": ["error", "always-multiline"],
        "style/eol-last": "error",
        "style/no-trailing-spaces": "error",
        "style/no-multiple-empty-lines": ["error", { "max": 1, "maxBOF": 0, "maxEOF": 0 }],
        "style/padded-blocks": ["error", { "blocks": "never", "classes": "never", "switches": "never" }],
        "style/operator-linebreak": ["error", "before"],
        "style/arrow-parens": ["error", "as-needed", { "requireForBlockBody": true }],
        "style/function-paren-newline": "off",
        "style/no-extra-semi": "off",
        "style/nonblock-statement-body-position": "off",
        "style/padding-line-between-statements": "off"
    }))
}

/// Stylistic overrides the composition applies by default
pub fn stylistic_overrides() -> ConfigTree {
    table(json!({
        "style/brace-style": ["warn", "stroustrup"],
        "style/comma-dangle": ["warn", "never"],
        "style/function-paren-newline": "warn",
        "style/no-extra-semi": "warn",
        "style/nonblock-statement-body-position": ["warn", "below"],
        "style/operator-linebreak": ["warn", "after"],
        "style/padding-line-between-statements": ["warn", { "blankLine": "never", "next": "case", "prev": "case" }]
    }))
}

/// Type-aware preset
pub fn type_aware() -> ConfigTree {
    table(json!({
        "ts/await-thenable": "error",
        "ts/dot-notation": ["error", { "allowKeywords": true }],
        "ts/no-floating-promises": "error",
        "ts/no-for-in-array": "error",
        "ts/no-implied-eval": "error",
        "ts/no-misused-promises": "error",
        "ts/no-unnecessary-type-assertion": "error",
        "ts/no-unsafe-argument": "error",
        "ts/no-unsafe-assignment": "error",
        "ts/no-unsafe-call": "error",
        "ts/no-unsafe-member-access": "error",
        "ts/no-unsafe-return": "error",
        "ts/promise-function-async": "error",
        "ts/restrict-plus-operands": "error",
        "ts/restrict-template-expressions": "error",
        "ts/return-await": ["error", "in-try-catch"],
        "ts/strict-boolean-expressions": ["error", { "allowNullableBoolean": true, "allowNullableObject": true }],
        "ts/switch-exhaustiveness-check": "error",
        "ts/unbound-method": "error"
    }))
}

/// Type-aware overrides the composition applies by default
pub fn type_aware_overrides() -> ConfigTree {
    table(json!({
        "ts/dot-notation": ["warn", { "allowPrivateClassPropertyAccess": true, "allowProtectedClassPropertyAccess": true }],
        "ts/explicit-function-return-type": ["warn", { "allowExpressions": true }],
        "ts/explicit-module-boundary-types": "warn",
        "ts/no-deprecated": "warn",
        "ts/require-await": "warn",
        "ts/strict-boolean-expressions": 0
    }))
}

/// Formatter layers for stylesheets and markup
pub fn formatters() -> Vec<ScopedLayer> {
    vec![
        ScopedLayer {
            name: "strata/formatters/css",
            files: &["**/*.{css,pcss,postcss,scss,less}"],
            ignores: &[],
            rules: table(json!({ "format/prettier": ["error", { "parser": "css" }] })),
        },
        ScopedLayer {
            name: "strata/formatters/html",
            files: &["**/*.{html,htm}"],
            ignores: &[],
            rules: table(json!({ "format/prettier": ["error", { "parser": "html" }] })),
        },
    ]
}

/// Named recommended presets, in the order they are layered
pub fn named_presets() -> Vec<(&'static str, ConfigTree)> {
    vec![
        ("jsdoc/contents-typescript", jsdoc_contents()),
        ("jsdoc/logical-typescript", jsdoc_logical()),
        ("jsdoc/requirements-typescript", jsdoc_requirements()),
        ("jsdoc/stylistic-typescript", jsdoc_stylistic()),
        ("perfectionist/recommended-natural", perfectionist_natural()),
        ("unicorn/recommended", unicorn_recommended()),
    ]
}

fn jsdoc_contents() -> ConfigTree {
    table(json!({
        "jsdoc/informative-docs": "warn",
        "jsdoc/match-description": "warn",
        "jsdoc/no-blank-block-descriptions": "warn",
        "jsdoc/no-blank-blocks": "warn"
    }))
}

fn jsdoc_logical() -> ConfigTree {
    table(json!({
        "jsdoc/check-access": "warn",
        "jsdoc/check-param-names": "warn",
        "jsdoc/check-property-names": "warn",
        "jsdoc/check-syntax": "warn",
        "jsdoc/check-tag-names": ["warn", { "typed": true }],
        "jsdoc/check-template-names": "warn",
        "jsdoc/check-values": "warn",
        "jsdoc/empty-tags": "warn",
        "jsdoc/implements-on-classes": "warn",
        "jsdoc/no-defaults": "warn",
        "jsdoc/no-types": "warn",
        "jsdoc/require-param-name": "warn",
        "jsdoc/require-property-name": "warn",
        "jsdoc/require-returns-check": "warn",
        "jsdoc/require-yields-check": "warn",
        "jsdoc/valid-types": "warn"
    }))
}

fn jsdoc_requirements() -> ConfigTree {
    table(json!({
        "jsdoc/require-example": "warn",
        "jsdoc/require-jsdoc": "warn",
        "jsdoc/require-param": "warn",
        "jsdoc/require-param-description": "warn",
        "jsdoc/require-property": "warn",
        "jsdoc/require-property-description": "warn",
        "jsdoc/require-returns": "warn",
        "jsdoc/require-returns-description": "warn",
        "jsdoc/require-template": "warn",
        "jsdoc/require-throws": "warn",
        "jsdoc/require-yields": "warn"
    }))
}

fn jsdoc_stylistic() -> ConfigTree {
    table(json!({
        "jsdoc/check-alignment": "warn",
        "jsdoc/check-line-alignment": "warn",
        "jsdoc/lines-before-block": "warn",
        "jsdoc/multiline-blocks": "warn",
        "jsdoc/no-multi-asterisks": "warn",
        "jsdoc/require-asterisk-prefix": "warn",
        "jsdoc/require-hyphen-before-param-description": ["warn", "always"],
        "jsdoc/tag-lines": ["warn", "never", { "startLines": 1 }]
    }))
}

fn perfectionist_natural() -> ConfigTree {
    let natural = json!({ "order": "asc", "type": "natural" });
    table(json!({
        "perfectionist/sort-array-includes": ["error", natural],
        "perfectionist/sort-classes": ["error", natural],
        "perfectionist/sort-enums": ["error", natural],
        "perfectionist/sort-exports": ["error", natural],
        "perfectionist/sort-imports": ["error", natural],
        "perfectionist/sort-interfaces": ["error", natural],
        "perfectionist/sort-intersection-types": ["error", natural],
        "perfectionist/sort-maps": ["error", natural],
        "perfectionist/sort-modules": ["error", natural],
        "perfectionist/sort-named-exports": ["error", natural],
        "perfectionist/sort-named-imports": ["error", natural],
        "perfectionist/sort-object-types": ["error", natural],
        "perfectionist/sort-objects": ["error", natural],
        "perfectionist/sort-switch-case": ["error", natural],
        "perfectionist/sort-union-types": ["error", natural]
    }))
}

fn unicorn_recommended() -> ConfigTree {
    table(json!({
        "unicorn/catch-error-name": "error",
        "unicorn/consistent-function-scoping": "error",
        "unicorn/error-message": "error",
        "unicorn/escape-case": "error",
        "unicorn/filename-case": "error",
        "unicorn/new-for-builtins": "error",
        "unicorn/no-array-for-each": "error",
        "unicorn/no-array-reduce": "error",
        "unicorn/no-for-loop": "error",
        "unicorn/no-instanceof-array": "error",
        "unicorn/no-nested-ternary": "error",
        "unicorn/no-new-array": "error",
        "unicorn/no-null": "error",
        "unicorn/no-process-exit": "error",
        "unicorn/no-useless-undefined": "error",
        "unicorn/prefer-array-some": "error",
        "unicorn/prefer-includes": "error",
        "unicorn/prefer-node-protocol": "error",
        "unicorn/prefer-number-properties": "error",
        "unicorn/prefer-string-slice": "error",
        "unicorn/prefer-ternary": "error",
        "unicorn/prefer-top-level-await": "error",
        "unicorn/prevent-abbreviations": "error",
        "unicorn/throw-new-error": "error"
    }))
}

/// The composition's own opinions, layered over every named preset
pub fn opinions() -> ConfigTree {
    table(json!({
        "antfu/no-top-level-await": 0,
        "curly": 1,
        "jsdoc/check-line-alignment": ["warn", "always", { "tags": ["param"] }],
        "jsdoc/check-param-names": ["warn", { "checkDestructured": false }],
        "jsdoc/match-description": 0,
        "jsdoc/require-example": 0,
        "jsdoc/require-hyphen-before-param-description": ["warn", "never", { "tags": { "*": "never" } }],
        "jsdoc/require-jsdoc": 0,
        "jsdoc/require-param": ["warn", { "checkDestructured": false }],
        "no-console": 0,
        "node/prefer-global/buffer": 0,
        "node/prefer-global/process": 0,
        "perfectionist/sort-modules": ["warn", {
            "groups": [
                "declare-enum",
                "export-enum",
                "enum",
                "declare-interface",
                "export-interface",
                "interface",
                "declare-type",
                "export-type",
                "type",
                "declare-class",
                "class",
                "export-class",
                "declare-function",
                "export-function",
                "function"
            ],
            "order": "asc",
            "type": "natural"
        }],
        "prefer-object-has-own": 1,
        "regexp/no-unused-capturing-group": ["warn", { "allowNamed": true, "fixable": false }],
        "sonarjs/class-name": "warn",
        "sonarjs/no-all-duplicated-branches": "warn",
        "sonarjs/no-array-delete": "warn",
        "sonarjs/no-associative-arrays": "warn",
        "sonarjs/no-async-constructor": "warn",
        "sonarjs/no-collection-size-mischeck": "warn",
        "sonarjs/no-duplicated-branches": "warn",
        "sonarjs/no-element-overwrite": "warn",
        "sonarjs/no-empty-collection": "warn",
        "sonarjs/no-identical-conditions": "warn",
        "sonarjs/no-identical-expressions": "warn",
        "sonarjs/no-identical-functions": "warn",
        "sonarjs/no-in-misuse": "warn",
        "sonarjs/no-invariant-returns": "warn",
        "sonarjs/no-inverted-boolean-check": "warn",
        "sonarjs/no-redundant-assignments": "warn",
        "sonarjs/no-small-switch": "warn",
        "sonarjs/no-try-promise": "warn",
        "sonarjs/no-use-of-empty-return-value": "warn",
        "sonarjs/no-useless-increment": "warn",
        "sonarjs/non-existent-operator": "warn",
        "sonarjs/prefer-promise-shorthand": "warn",
        "sonarjs/prefer-while": "warn",
        "sonarjs/strings-comparison": "warn",
        "sonarjs/super-invocation": "warn",
        "unicorn/consistent-function-scoping": ["warn", { "checkArrowFunctions": false }],
        "unicorn/filename-case": ["warn", { "cases": { "kebabCase": true, "pascalCase": true, "snakeCase": true } }],
        "unicorn/no-array-reduce": 0,
        "unicorn/no-null": 0,
        "unicorn/no-process-exit": 0,
        "unicorn/prevent-abbreviations": ["warn", { "checkFilenames": false }]
    }))
}

/// Scoped built-in layers, placed after the opinion table
pub fn scoped_layers() -> Vec<ScopedLayer> {
    vec![
        ScopedLayer {
            name: "strata/javascript",
            files: &["**/*.js"],
            ignores: &[],
            rules: table(json!({ "jsdoc/no-types": 0, "jsdoc/require-param-type": 1 })),
        },
        ScopedLayer {
            name: "strata/source-docs",
            files: &["src/**/*.{js,ts}"],
            ignores: &[],
            rules: table(json!({
                "jsdoc/require-jsdoc": ["warn", { "require": { "FunctionDeclaration": true, "MethodDefinition": true } }]
            })),
        },
        ScopedLayer {
            name: "strata/file-overview",
            files: &["**/*.{js,ts}"],
            ignores: &["**/*.md/*.{js,ts}", "**/*.{d,as,test}.{js,ts}"],
            rules: table(json!({ "jsdoc/require-file-overview": 1 })),
        },
    ]
}
