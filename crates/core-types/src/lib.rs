//! Shared action model for the dompatch crates.
//!
//! A [`Configuration`] is one parsed configuration document; a
//! [`MergedConfiguration`] is the concatenation of several of them. Actions are
//! lenient about shape: any mapping deserializes into an
//! [`Action`], and missing or unrecognised fields surface only when the action
//! is dispatched.

mod action;
mod configuration;

pub use action::{Action, ActionKind, Position, PositionError, Priority, DEFAULT_PRIORITY};
pub use configuration::{Configuration, MergedConfiguration};
