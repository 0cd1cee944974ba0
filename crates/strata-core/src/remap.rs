//! Projection of fragment findings back onto the parent document
//!
//! Findings produced against a [`Fragment`] use fragment-local coordinates.
//! [`remap`] translates them into parent coordinates by simple addition:
//!
//! - `line = finding.line + fragment.line_offset - 1`
//! - on the fragment's first line only, the column is shifted by the number
//!   of characters preceding the fragment body
//!
//! Findings from rules that need whole-file context are meaningless inside a
//! fragment and are dropped instead of remapped, see [`SuppressionList`].

use crate::fragment::Fragment;
use crate::rule::Severity;
use indexmap::IndexSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Rules suppressed for fragment findings by default
pub const DEFAULT_SUPPRESSED_RULES: &[&str] = &[
    // Whole-file structure
    "jsdoc/require-file-overview",
    "unicorn/filename-case",
    "unicode-bom",
    "strict",
    // Trailing/leading whitespace of the fragment is an artifact of slicing
    "eol-last",
    "style/eol-last",
    "padded-blocks",
    "style/padded-blocks",
    "no-multiple-empty-lines",
    "style/no-multiple-empty-lines",
    "no-trailing-spaces",
    "style/no-trailing-spaces",
    // Examples reference symbols defined elsewhere
    "no-undef",
    "no-unused-vars",
    "ts/no-unused-vars",
    "unused-imports/no-unused-vars",
    "unused-imports/no-unused-imports",
    "import/no-unresolved",
    "node/no-missing-import",
];

/// 1-based position of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub line: usize,
    pub column: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            end_line: None,
            end_column: None,
        }
    }

    pub fn with_end(mut self, end_line: usize, end_column: usize) -> Self {
        self.end_line = Some(end_line);
        self.end_column = Some(end_column);
        self
    }

    /// Translate from fragment-local to parent coordinates
    pub fn translate(&self, fragment: &Fragment) -> Self {
        let line_offset = fragment.line_offset();
        let column_offset = fragment.column_offset_on_first_line();

        let shift_line = |line: usize| line + line_offset - 1;
        let shift_column = |line: usize, column: usize| {
            if line == 1 {
                column + column_offset
            } else {
                column
            }
        };

        Self {
            line: shift_line(self.line),
            column: shift_column(self.line, self.column),
            end_line: self.end_line.map(shift_line),
            end_column: match (self.end_line, self.end_column) {
                (Some(end_line), Some(end_column)) => Some(shift_column(end_line, end_column)),
                (None, end_column) => end_column,
                (Some(_), None) => None,
            },
        }
    }
}

/// One reported issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Reporting rule; `None` for engine-level messages such as parse failures
    #[serde(default)]
    pub rule_id: Option<String>,
    pub message: String,
    pub location: Location,
    pub severity: Severity,
}

impl Finding {
    pub fn new(
        rule_id: impl Into<String>,
        message: impl Into<String>,
        location: Location,
        severity: Severity,
    ) -> Self {
        Self {
            rule_id: Some(rule_id.into()),
            message: message.into(),
            location,
            severity,
        }
    }
}

/// Rule ids whose findings are dropped during remapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionList {
    rules: IndexSet<String>,
}

impl Default for SuppressionList {
    fn default() -> Self {
        Self::from_rules(DEFAULT_SUPPRESSED_RULES.iter().copied())
    }
}

impl SuppressionList {
    /// Empty list; every finding survives remapping
    pub fn none() -> Self {
        Self {
            rules: IndexSet::new(),
        }
    }

    pub fn from_rules<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    /// Add more rules to the list
    pub fn extend<I, S>(&mut self, rules: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.extend(rules.into_iter().map(Into::into));
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.rules.contains(rule_id)
    }

    /// Whether a finding must be dropped; findings without a rule id never are
    pub fn suppresses(&self, finding: &Finding) -> bool {
        finding
            .rule_id
            .as_deref()
            .is_some_and(|rule_id| self.contains(rule_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(String::as_str)
    }
}

/// Translate `findings` of `fragment` into parent coordinates
///
/// Input order is preserved and nothing is deduplicated.
pub fn remap(
    findings: impl IntoIterator<Item = Finding>,
    fragment: &Fragment,
    suppression: &SuppressionList,
) -> Vec<Finding> {
    findings
        .into_iter()
        .filter(|finding| !suppression.suppresses(finding))
        .map(|finding| Finding {
            location: finding.location.translate(fragment),
            ..finding
        })
        .collect()
}

/// Remap many `(fragment, findings)` batches in parallel
///
/// Each batch is remapped on its own, then results are concatenated in the
/// order of `batches`, which is extraction order when the caller keeps it.
pub fn remap_batches(
    batches: Vec<(&Fragment, Vec<Finding>)>,
    suppression: &SuppressionList,
) -> Vec<Finding> {
    batches
        .into_par_iter()
        .map(|(fragment, findings)| remap(findings, fragment, suppression))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}
