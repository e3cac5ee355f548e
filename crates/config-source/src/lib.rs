//! Configuration sources for the dompatch engine
//!
//! Resolves which configuration documents apply to a page location, loads
//! them concurrently from disk or HTTP, and merges them into one action list.
//! Load failures never propagate; they surface as `LoadError` diagnostics.

pub mod datasource;
pub mod errors;
mod loader;
mod source;

pub use datasource::{location_path, DataSource, DEFAULT_DATASOURCE};
pub use errors::LoadError;
pub use loader::{load_all, load_and_merge, resolve_and_merge};
pub use source::{is_remote, ConfigurationSource, FileSource, StaticSource};
