//! Strata Core
//!
//! Composition layer for lint pipelines. This crate builds the ordered
//! sequence of rule overlays an analysis engine consumes, and extracts
//! embedded code fragments from documentation so they can be analyzed as
//! virtual files and their findings mapped back onto the parent.

#![recursion_limit = "256"]

pub mod compose;
pub mod config;
pub mod error;
pub mod fragment;
pub mod overlay;
pub mod processor;
pub mod remap;
pub mod result;
pub mod rule;
pub mod scope;
pub mod tree;

// Re-export commonly used types
pub use compose::{
    ComposeOptions, Composer, CompositionResult, PipelineSettings, ResolvedConfig, build_layers,
    compose, options_schema,
};
pub use config::{ConfigFile, ConfigLoader};
pub use error::{ErrorKind, StrataError};
pub use fragment::{FencePattern, FenceSpec, Fragment, Fragments, extract};
pub use overlay::{Overlay, OverlayRecord, fold_rules};
pub use processor::{ExampleProcessor, Processor, ProcessorRegistry, process_document};
pub use remap::{Finding, Location, SuppressionList, remap, remap_batches};
pub use result::Result;
pub use rule::{RuleSetting, RuleTable, Severity};
pub use scope::{Scope, applicable_overlays};
pub use tree::{ConfigTree, merge, merge_all};

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "strata=info";

/// Initialize the tracing subscriber for logging
///
/// For binaries and test harnesses that embed the composer; the library
/// itself only emits events. A subscriber that is already installed is kept.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init();

    if let Err(e) = installed {
        tracing::debug!("Tracing subscriber already installed: {e}");
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
