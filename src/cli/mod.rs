pub mod app;
pub mod check;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod output;
pub mod patch;
pub mod resolve;
pub mod runtime;

pub use check::{cmd_check, CheckArgs};
pub use patch::{cmd_patch, PatchArgs};
pub use resolve::{cmd_resolve, ResolveArgs};
