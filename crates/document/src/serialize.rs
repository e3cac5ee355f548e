use crate::parser::is_void;
use crate::tree::{Attribute, NodeData, NodeId, Tree};

pub(crate) fn outer_html(tree: &Tree, node: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, node, &mut out);
    out
}

pub(crate) fn inner_html(tree: &Tree, node: NodeId) -> String {
    let mut out = String::new();
    for child in tree.children(node) {
        write_node(tree, *child, &mut out);
    }
    out
}

pub(crate) fn text_content(tree: &Tree, node: NodeId) -> String {
    let mut out = String::new();
    if let NodeData::Text(text) = tree.data(node) {
        out.push_str(text);
    }
    for descendant in tree.descendants(node) {
        if let NodeData::Text(text) = tree.data(descendant) {
            out.push_str(text);
        }
    }
    out
}

fn write_node(tree: &Tree, node: NodeId, out: &mut String) {
    match tree.data(node) {
        NodeData::Document | NodeData::Fragment => {
            for child in tree.children(node) {
                write_node(tree, *child, out);
            }
        }
        NodeData::Doctype(text) => {
            out.push_str("<!");
            out.push_str(text);
            out.push('>');
        }
        NodeData::Text(text) => out.push_str(text),
        NodeData::ProcessingInstruction(text) => {
            out.push_str("<?");
            out.push_str(text);
            out.push('>');
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for attr in &element.attrs {
                write_attribute(attr, out);
            }
            out.push('>');
            if is_void(&element.name) {
                return;
            }
            for child in tree.children(node) {
                write_node(tree, *child, out);
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
    }
}

fn write_attribute(attr: &Attribute, out: &mut String) {
    out.push(' ');
    out.push_str(&attr.name);
    let Some(value) = &attr.value else {
        return;
    };
    out.push('=');
    if value.contains('"') && !value.contains('\'') {
        out.push('\'');
        out.push_str(value);
        out.push('\'');
    } else {
        out.push('"');
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }
}
