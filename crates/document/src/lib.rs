//! Document collaborator for the dompatch engine
//!
//! [`Document`] is the set of capabilities the action dispatcher relies on.
//! [`HtmlDocument`] implements it over an in-memory tree with a lenient markup
//! parser, a CSS selector engine and a verbatim serializer.

pub mod errors;
mod html;
mod parser;
mod ports;
mod selector;
mod serialize;
mod tree;

pub use errors::DocumentError;
pub use html::{FragmentId, HtmlDocument};
pub use ports::Document;
pub use selector::SelectorList;
pub use tree::{Attribute, ElementData, NodeData, NodeId};
