//! Action primitives - Execute single DOM-mutation actions
//!
//! This crate provides the dispatcher for the four declarative actions:
//! - remove, replace, insert and alter primitives over any [`Document`]
//! - per-action validation of required fields at dispatch time
//! - configuration diagnostics for unrecognized action types
//!
//! [`Document`]: dompatch_document::Document

pub mod errors;
mod primitives;
pub mod types;

pub use errors::*;
pub use primitives::*;
pub use types::*;
