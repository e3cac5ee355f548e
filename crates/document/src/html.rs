//! In-memory HTML document

use std::fmt;

use dompatch_core_types::Position;
use tracing::trace;

use crate::errors::DocumentError;
use crate::parser::parse_into;
use crate::ports::Document;
use crate::selector::SelectorList;
use crate::serialize::{inner_html, outer_html, text_content};
use crate::tree::{ElementData, NodeData, NodeId, Tree};

/// Handle to a parsed, not-yet-attached markup fragment.
#[derive(Debug, PartialEq, Eq)]
pub struct FragmentId(NodeId);

/// An HTML document held entirely in memory.
///
/// Parsing always yields a `body`: when the markup has none, `html` and `body`
/// elements are synthesized around the content.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    tree: Tree,
}

impl HtmlDocument {
    pub fn parse(markup: &str) -> Self {
        let mut tree = Tree::new();
        let root = tree.root();
        parse_into(&mut tree, root, markup);
        let mut document = Self { tree };
        document.ensure_body();
        document
    }

    /// Document with an empty `html`/`body` skeleton.
    pub fn empty() -> Self {
        Self::parse("")
    }

    fn ensure_body(&mut self) {
        let root = self.tree.root();
        if self.tree.find_element(root, "body").is_some() {
            return;
        }

        let existing = self
            .tree
            .children(root)
            .iter()
            .copied()
            .find(|node| self.tree.is_element_named(*node, "html"));
        let html = match existing {
            Some(html) => html,
            None => {
                let html = self.create_element("html");
                let moved: Vec<NodeId> = self
                    .tree
                    .children(root)
                    .iter()
                    .copied()
                    .filter(|node| !matches!(self.tree.data(*node), NodeData::Doctype(_)))
                    .collect();
                for node in moved {
                    self.tree.append(html, node);
                }
                self.tree.append(root, html);
                html
            }
        };

        let body = self.create_element("body");
        let moved: Vec<NodeId> = self
            .tree
            .children(html)
            .iter()
            .copied()
            .filter(|node| !self.tree.is_element_named(*node, "head"))
            .collect();
        for node in moved {
            self.tree.append(body, node);
        }
        self.tree.append(html, body);
        trace!("synthesized body element");
    }

    fn create_element(&mut self, name: &str) -> NodeId {
        self.tree.create(NodeData::Element(ElementData {
            name: name.to_string(),
            attrs: Vec::new(),
        }))
    }

    fn checked(&self, node: NodeId) -> Result<NodeId, DocumentError> {
        if self.tree.contains(node) {
            Ok(node)
        } else {
            Err(DocumentError::InvalidHandle(node))
        }
    }

    fn fragment_node(&self, fragment: &FragmentId) -> Result<NodeId, DocumentError> {
        let node = self.checked(fragment.0)?;
        match self.tree.data(node) {
            NodeData::Fragment => Ok(node),
            _ => Err(DocumentError::InvalidHandle(node)),
        }
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn body(&self) -> Option<NodeId> {
        self.tree.find_element(self.tree.root(), "body")
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        outer_html(&self.tree, self.tree.root())
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        outer_html(&self.tree, node)
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        inner_html(&self.tree, node)
    }

    pub fn text_content(&self, node: NodeId) -> String {
        text_content(&self.tree, node)
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        self.tree.element(node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.parent(node)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.tree.children(node)
    }

    /// Whether `node` is still reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let root = self.tree.root();
        std::iter::successors(Some(node), |current| self.tree.parent(*current))
            .any(|ancestor| ancestor == root)
    }
}

impl Default for HtmlDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for HtmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

impl Document for HtmlDocument {
    type Node = NodeId;
    type Fragment = FragmentId;

    fn select_all(&self, selector: &str) -> Result<Vec<NodeId>, DocumentError> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .tree
            .descendants(self.tree.root())
            .into_iter()
            .filter(|node| list.matches(&self.tree, *node))
            .collect())
    }

    fn select_first(&self, selector: &str) -> Result<Option<NodeId>, DocumentError> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .tree
            .descendants(self.tree.root())
            .into_iter()
            .find(|node| list.matches(&self.tree, *node)))
    }

    fn remove_node(&mut self, node: NodeId) -> Result<(), DocumentError> {
        let node = self.checked(node)?;
        self.tree.detach(node);
        Ok(())
    }

    fn replace_node(&mut self, node: NodeId, fragment: FragmentId) -> Result<(), DocumentError> {
        let node = self.checked(node)?;
        let fragment = self.fragment_node(&fragment)?;
        let (Some(parent), Some(index)) = (self.tree.parent(node), self.tree.index_in_parent(node))
        else {
            return Ok(());
        };
        let contents = self.tree.take_children(fragment);
        self.tree.detach(node);
        for (offset, child) in contents.into_iter().enumerate() {
            self.tree.insert_at(parent, index + offset, child);
        }
        Ok(())
    }

    fn insert_node(
        &mut self,
        reference: NodeId,
        fragment: FragmentId,
        position: Position,
    ) -> Result<(), DocumentError> {
        let reference = self.checked(reference)?;
        let fragment = self.fragment_node(&fragment)?;
        let (Some(parent), Some(index)) = (
            self.tree.parent(reference),
            self.tree.index_in_parent(reference),
        ) else {
            return Err(DocumentError::Detached(reference));
        };
        let start = match position {
            Position::Before => index,
            Position::After => index + 1,
        };
        let contents = self.tree.take_children(fragment);
        for (offset, child) in contents.into_iter().enumerate() {
            self.tree.insert_at(parent, start + offset, child);
        }
        Ok(())
    }

    fn parse_fragment(&mut self, markup: &str) -> Result<FragmentId, DocumentError> {
        let fragment = self.tree.create(NodeData::Fragment);
        parse_into(&mut self.tree, fragment, markup);
        Ok(FragmentId(fragment))
    }

    fn body_markup(&self) -> Result<String, DocumentError> {
        let body = self.body().ok_or(DocumentError::MissingBody)?;
        Ok(inner_html(&self.tree, body))
    }

    fn set_body_markup(&mut self, markup: &str) -> Result<(), DocumentError> {
        let body = self.body().ok_or(DocumentError::MissingBody)?;
        self.tree.take_children(body);
        parse_into(&mut self.tree, body, markup);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_full_documents() {
        let markup = r#"<!DOCTYPE html><html><head><title>T</title></head><body><p class="a">x &amp; y</p><br><img src=a.png alt=""></body></html>"#;
        let document = HtmlDocument::parse(markup);
        assert_eq!(
            document.to_html(),
            r#"<!DOCTYPE html><html><head><title>T</title></head><body><p class="a">x &amp; y</p><br><img src="a.png" alt=""></body></html>"#
        );
    }

    #[test]
    fn synthesizes_missing_body() {
        let document = HtmlDocument::parse("<p>loose</p>");
        assert_eq!(
            document.to_html(),
            "<html><body><p>loose</p></body></html>"
        );

        let with_head = HtmlDocument::parse("<html><head></head><div>x</div></html>");
        assert_eq!(
            with_head.to_html(),
            "<html><head></head><body><div>x</div></body></html>"
        );
    }

    #[test]
    fn body_markup_round_trip() {
        let mut document = HtmlDocument::parse("<body><p>a</p></body>");
        assert_eq!(document.body_markup().unwrap(), "<p>a</p>");
        document.set_body_markup("<div>b</div>").unwrap();
        assert_eq!(document.body_markup().unwrap(), "<div>b</div>");
    }

    #[test]
    fn replace_keeps_position() {
        let mut document = HtmlDocument::parse("<body><i>1</i><b>2</b><i>3</i></body>");
        let target = document.select_first("b").unwrap().unwrap();
        let fragment = document.parse_fragment("<u>x</u><u>y</u>").unwrap();
        document.replace_node(target, fragment).unwrap();
        assert_eq!(
            document.body_markup().unwrap(),
            "<i>1</i><u>x</u><u>y</u><i>3</i>"
        );
        assert!(!document.is_attached(target));
    }

    #[test]
    fn insert_before_and_after() {
        let mut document = HtmlDocument::parse("<body><p id=t>t</p></body>");
        let target = document.select_first("#t").unwrap().unwrap();
        let before = document.parse_fragment("<a></a>").unwrap();
        document
            .insert_node(target, before, Position::Before)
            .unwrap();
        let after = document.parse_fragment("<b></b>").unwrap();
        document.insert_node(target, after, Position::After).unwrap();
        assert_eq!(
            document.body_markup().unwrap(),
            r#"<a></a><p id="t">t</p><b></b>"#
        );
    }

    #[test]
    fn insert_next_to_detached_node_fails() {
        let mut document = HtmlDocument::parse("<body><p>t</p></body>");
        let target = document.select_first("p").unwrap().unwrap();
        document.remove_node(target).unwrap();
        let fragment = document.parse_fragment("<b></b>").unwrap();
        assert_eq!(
            document.insert_node(target, fragment, Position::After),
            Err(DocumentError::Detached(target))
        );
    }

    #[test]
    fn node_handles_are_not_fragments() {
        let mut document = HtmlDocument::parse("<body><p>t</p></body>");
        let target = document.select_first("p").unwrap().unwrap();
        let body = document.body().unwrap();
        assert_eq!(
            document.replace_node(target, FragmentId(body)),
            Err(DocumentError::InvalidHandle(body))
        );
    }
}
