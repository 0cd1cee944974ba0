//! File-path scopes for overlays
//!
//! A [`Scope`] is an include/exclude pair of glob lists. A path is in scope
//! when it matches at least one include pattern (or the scope has no include
//! list at all) and no exclude pattern. Exclusion always wins.
//!
//! Globs follow the usual path semantics: `*` stays within one segment, `**`
//! crosses segments and `{a,b}` alternates. Patterns and paths are both
//! anchored at the project root.

use crate::overlay::Overlay;
use crate::{Result, StrataError};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::borrow::Cow;

/// Include/exclude glob predicate
#[derive(Debug, Clone)]
pub struct Scope {
    includes: Option<Vec<String>>,
    excludes: Vec<String>,
    include_set: Option<GlobSet>,
    exclude_set: GlobSet,
}

impl Scope {
    /// Compile a scope, attributing glob errors to `layer`
    pub fn new(layer: &str, includes: Option<Vec<String>>, excludes: Vec<String>) -> Result<Self> {
        let include_set = includes
            .as_deref()
            .map(|patterns| compile_globs(layer, patterns))
            .transpose()?;
        let exclude_set = compile_globs(layer, &excludes)?;

        Ok(Self {
            includes,
            excludes,
            include_set,
            exclude_set,
        })
    }

    /// Scope accepting every path
    pub fn everything() -> Self {
        Self {
            includes: None,
            excludes: Vec::new(),
            include_set: None,
            exclude_set: GlobSet::empty(),
        }
    }

    pub fn includes(&self) -> Option<&[String]> {
        self.includes.as_deref()
    }

    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    /// Check whether `path` is in scope
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize_path(path);

        if self.exclude_set.is_match(path.as_ref()) {
            return false;
        }

        match &self.include_set {
            Some(set) => set.is_match(path.as_ref()),
            None => true,
        }
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.includes == other.includes && self.excludes == other.excludes
    }
}

/// Filter `overlays` down to those that apply to `path`, keeping their order
///
/// Overlays without a scope are global and always apply.
pub fn applicable_overlays<'a>(path: &str, overlays: &'a [Overlay]) -> Vec<&'a Overlay> {
    overlays
        .iter()
        .filter(|overlay| overlay.applies_to(path))
        .collect()
}

/// Normalize a path for matching: forward slashes, no leading `./` or `/`
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    let path: Cow<'_, str> = if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    };

    let mut trimmed: &str = path.as_ref();
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }

    if trimmed.len() == path.len() {
        path
    } else {
        Cow::Owned(trimmed.to_string())
    }
}

fn compile_globs(layer: &str, patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let anchored = normalize_path(pattern);
        let glob = GlobBuilder::new(anchored.as_ref())
            .literal_separator(true)
            .build()
            .map_err(|e| StrataError::invalid_glob(layer, pattern, e.to_string()))?;
        builder.add(glob);
    }

    builder
        .build()
        .map_err(|e| StrataError::invalid_glob(layer, patterns.join(", "), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(includes: &[&str], excludes: &[&str]) -> Scope {
        Scope::new(
            "test",
            Some(includes.iter().map(|s| s.to_string()).collect()),
            excludes.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_include_exclude_scenario() {
        let scope = scope(&["src/**/*.ts"], &["**/*.test.ts"]);

        assert!(scope.matches("src/a.ts"));
        assert!(scope.matches("src/deep/nested/b.ts"));
        assert!(!scope.matches("src/a.test.ts"));
        assert!(!scope.matches("lib/a.ts"));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let scope = scope(&["src/*.js"], &[]);

        assert!(scope.matches("src/index.js"));
        assert!(!scope.matches("src/nested/index.js"));
    }

    #[test]
    fn test_brace_alternation() {
        let scope = scope(&["**/*.{js,ts}"], &["**/*.{d,as,test}.{js,ts}"]);

        assert!(scope.matches("index.js"));
        assert!(scope.matches("lib/util.ts"));
        assert!(!scope.matches("types/index.d.ts"));
        assert!(!scope.matches("asm/main.as.ts"));
    }

    #[test]
    fn test_virtual_paths_are_matchable() {
        let scope = scope(&["**/*.ts"], &["**/*.md/*.ts"]);

        assert!(scope.matches("src/a.ts"));
        assert!(!scope.matches("src/a.ts/0_example.md/0.ts"));
    }

    #[test]
    fn test_no_includes_matches_everything() {
        let scope = Scope::new("test", None, vec!["dist/**".to_string()]).unwrap();

        assert!(scope.matches("anything/at/all.rs"));
        assert!(!scope.matches("dist/bundle.js"));
        assert!(Scope::everything().matches("x"));
    }

    #[test]
    fn test_removing_include_only_shrinks() {
        let paths = ["src/a.ts", "lib/b.js", "test/c.ts", "d.md"];
        let wide = scope(&["src/**", "lib/**", "**/*.ts"], &[]);
        let narrow = scope(&["src/**", "lib/**"], &[]);

        for path in paths {
            if narrow.matches(path) {
                assert!(wide.matches(path), "{path} matched narrow but not wide");
            }
        }
        assert!(wide.matches("test/c.ts"));
        assert!(!narrow.matches("test/c.ts"));
    }

    #[test]
    fn test_path_normalization() {
        let scope = scope(&["src/**/*.ts"], &[]);

        assert!(scope.matches("./src/a.ts"));
        assert!(scope.matches("src\\win\\a.ts"));
        assert_eq!(normalize_path("src/a.ts"), "src/a.ts");
    }

    #[test]
    fn test_invalid_glob_names_layer() {
        let err = Scope::new("user/extra-0", Some(vec!["src/[".to_string()]), vec![]).unwrap_err();
        assert_eq!(err.layer(), Some("user/extra-0"));
    }
}
