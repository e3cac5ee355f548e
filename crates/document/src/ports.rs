use std::fmt::Debug;

use dompatch_core_types::Position;

use crate::errors::DocumentError;

/// Capabilities the dispatcher needs from a live document.
///
/// All operations are synchronous: a mutation is fully visible to the next
/// call. Implementations choose their own node and fragment handles.
pub trait Document {
    type Node: Copy + Eq + Debug;
    type Fragment;

    /// Every element matching `selector`, in document order.
    fn select_all(&self, selector: &str) -> Result<Vec<Self::Node>, DocumentError>;

    /// The first element matching `selector` in document order.
    fn select_first(&self, selector: &str) -> Result<Option<Self::Node>, DocumentError>;

    /// Detach `node` from its parent. Detached nodes are left alone.
    fn remove_node(&mut self, node: Self::Node) -> Result<(), DocumentError>;

    /// Put the fragment's contents where `node` is. Detached nodes are left alone.
    fn replace_node(
        &mut self,
        node: Self::Node,
        fragment: Self::Fragment,
    ) -> Result<(), DocumentError>;

    /// Insert the fragment's contents next to `reference` within its parent.
    fn insert_node(
        &mut self,
        reference: Self::Node,
        fragment: Self::Fragment,
        position: Position,
    ) -> Result<(), DocumentError>;

    /// Parse markup into a fragment that is not yet attached anywhere.
    fn parse_fragment(&mut self, markup: &str) -> Result<Self::Fragment, DocumentError>;

    /// Serialized markup of the body's contents.
    fn body_markup(&self) -> Result<String, DocumentError>;

    /// Replace the body's contents with `markup`, parsed.
    fn set_body_markup(&mut self, markup: &str) -> Result<(), DocumentError>;
}
