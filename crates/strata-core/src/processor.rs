//! Processor protocol for embedded fragments
//!
//! A [`Processor`] is the capability the analysis engine calls for parent
//! documents whose overlay names it: it slices fragments out of the parent
//! and maps each fragment's findings back onto the parent.

use crate::fragment::{FencePattern, Fragment};
use crate::remap::{Finding, SuppressionList, remap};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Fragment extraction and result remapping capability
pub trait Processor: Send + Sync + fmt::Debug {
    /// Registered name, referenced by an overlay's `processor` field
    fn name(&self) -> &str;

    /// Lazily extract fragments from a parent document
    fn extract<'a>(
        &'a self,
        parent_id: &str,
        text: &'a str,
    ) -> Box<dyn Iterator<Item = Fragment> + 'a>;

    /// Translate one fragment's findings into parent coordinates
    fn remap(&self, findings: Vec<Finding>, fragment: &Fragment) -> Vec<Finding>;
}

/// Processor for fenced examples inside documentation
#[derive(Debug, Clone)]
pub struct ExampleProcessor {
    name: String,
    pattern: FencePattern,
    suppression: SuppressionList,
}

impl ExampleProcessor {
    pub fn new(name: impl Into<String>, pattern: FencePattern) -> Self {
        Self {
            name: name.into(),
            pattern,
            suppression: SuppressionList::default(),
        }
    }

    pub fn with_suppression(mut self, suppression: SuppressionList) -> Self {
        self.suppression = suppression;
        self
    }

    pub fn pattern(&self) -> &FencePattern {
        &self.pattern
    }

    pub fn suppression(&self) -> &SuppressionList {
        &self.suppression
    }
}

impl Processor for ExampleProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract<'a>(
        &'a self,
        parent_id: &str,
        text: &'a str,
    ) -> Box<dyn Iterator<Item = Fragment> + 'a> {
        Box::new(self.pattern.extract(parent_id, text))
    }

    fn remap(&self, findings: Vec<Finding>, fragment: &Fragment) -> Vec<Finding> {
        remap(findings, fragment, &self.suppression)
    }
}

/// Run `analyze` over every fragment of a parent and collect parent findings
///
/// Fragments may be analyzed in parallel. Each fragment's findings are
/// remapped before they are concatenated, in extraction order.
pub fn process_document<F>(
    processor: &dyn Processor,
    parent_id: &str,
    text: &str,
    analyze: F,
) -> Vec<Finding>
where
    F: Fn(&Fragment) -> Vec<Finding> + Sync,
{
    let fragments: Vec<Fragment> = processor.extract(parent_id, text).collect();
    trace!(parent = parent_id, count = fragments.len(), "Processing fragments");

    fragments
        .par_iter()
        .map(|fragment| processor.remap(analyze(fragment), fragment))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Named processors available to overlays
#[derive(Debug, Clone, Default)]
pub struct ProcessorRegistry {
    processors: IndexMap<String, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor under its own name, replacing any previous one
    pub fn register(&mut self, processor: Arc<dyn Processor>) {
        self.processors
            .insert(processor.name().to_string(), processor);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Processor>> {
        self.processors.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.processors.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}
