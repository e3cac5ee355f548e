//! dompatch library
//!
//! Exposes the patch pipeline and CLI modules for integration testing

pub mod cli;
pub mod pipeline;
pub mod settings;

pub use pipeline::{PatchOutcome, Patcher};
pub use settings::Settings;
