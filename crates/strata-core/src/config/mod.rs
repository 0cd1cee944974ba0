//! Configuration files
//!
//! A project keeps its composition options in one file found by walking up
//! from the working directory:
//!
//! - `.strata.json` / `.strata.jsonc` - JSON with comments and trailing commas
//! - `strata.yaml` / `strata.yml`
//! - `strata.toml`
//!
//! The document is the options object itself. An optional `overlays` array
//! carries raw overlays appended after the built-in layers:
//!
//! ```jsonc
//! {
//!   "editorMode": false,
//!   "ignorePaths": ["generated/**"],
//!   "ruleOverrides": {
//!     "curly": "off"
//!   },
//!   "overlays": [
//!     { "name": "vue", "files": ["**/*.vue"], "rules": { "curly": "error" } }
//!   ]
//! }
//! ```

mod loader;

pub use loader::{CONFIG_FILE_NAMES, ConfigFile, ConfigLoader, OVERLAYS_KEY};
