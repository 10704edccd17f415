//! Shared test helpers: a roxmltree-backed loader and structural shapes

#![allow(dead_code)]

use gg_dom::{DomError, DomTree, NodeData, NodeId, NodeOperations, XmlLoader};

/// Route library logs to the test harness; `RUST_LOG=gg_dom=debug` shows
/// why a mutation was rejected
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("parse error: {0}")]
    Parse(#[from] roxmltree::Error),
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

/// Builds the tree through the public mutation API, recording positions
pub struct RoxmlLoader;

impl XmlLoader for RoxmlLoader {
    type Error = LoadError;

    fn load(&mut self, tree: &mut DomTree, xml: &str) -> Result<(), LoadError> {
        let parsed = roxmltree::Document::parse(xml)?;
        let document = tree.root();
        for child in parsed.root().children() {
            build(tree, &parsed, document, child)?;
        }
        Ok(())
    }
}

fn build(
    tree: &mut DomTree,
    parsed: &roxmltree::Document,
    parent: NodeId,
    node: roxmltree::Node,
) -> Result<(), DomError> {
    let id = match node.node_type() {
        roxmltree::NodeType::Element => {
            let element = tree.create_element(node.tag_name().name())?;
            for attr in node.attributes() {
                tree.set_attribute(element, attr.name(), attr.value())?;
            }
            for child in node.children() {
                build(tree, parsed, element, child)?;
            }
            element
        }
        roxmltree::NodeType::Text => tree.create_text_node(node.text().unwrap_or_default()),
        roxmltree::NodeType::Comment => tree.create_comment(node.text().unwrap_or_default()),
        roxmltree::NodeType::PI => {
            let Some(pi) = node.pi() else {
                return Ok(());
            };
            tree.create_processing_instruction(pi.target, pi.value.unwrap_or_default())?
        }
        roxmltree::NodeType::Root => return Ok(()),
    };
    let pos = parsed.text_pos_at(node.range().start);
    tree.set_position(id, pos.row, pos.col)?;
    tree.append_child(parent, id)?;
    Ok(())
}

/// Structure of a subtree with text runs merged and whitespace collapsed,
/// which is what survives a serialize/parse round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
        children: Vec<Shape>,
    },
    Text(String),
    Comment(String),
    Pi(String, String),
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_text(shapes: &mut Vec<Shape>, text: &str) {
    if let Some(Shape::Text(last)) = shapes.last_mut() {
        last.push_str(text);
    } else {
        shapes.push(Shape::Text(text.to_owned()));
    }
}

/// Shapes of the children of a node
pub fn shape_children(tree: &DomTree, id: NodeId) -> Vec<Shape> {
    let mut shapes = Vec::new();
    for &child in tree.child_nodes(id) {
        let Some(entry) = tree.get(child) else { continue };
        match entry.data() {
            NodeData::Text(text) | NodeData::CData(text) => push_text(&mut shapes, text),
            NodeData::Comment(text) => shapes.push(Shape::Comment(text.clone())),
            NodeData::ProcessingInstruction { data } => {
                shapes.push(Shape::Pi(entry.node_name(), data.clone()))
            }
            NodeData::Element { .. } => shapes.push(shape_element(tree, child)),
            _ => {}
        }
    }
    shapes
        .into_iter()
        .filter_map(|shape| match shape {
            Shape::Text(text) => {
                let text = collapse(&text);
                (!text.is_empty()).then_some(Shape::Text(text))
            }
            other => Some(other),
        })
        .collect()
}

pub fn shape_element(tree: &DomTree, id: NodeId) -> Shape {
    let attrs = tree
        .attributes(id)
        .iter()
        .map(|&attr| {
            (
                tree.node_name(attr).unwrap_or_default(),
                tree.attr_value(attr).unwrap_or_default(),
            )
        })
        .collect();
    Shape::Element {
        name: tree.node_name(id).unwrap_or_default(),
        attrs,
        children: shape_children(tree, id),
    }
}

/// Nodes reachable from the document, through children and attributes,
/// document node included
pub fn reachable_count(tree: &DomTree) -> usize {
    let mut stack = vec![tree.root()];
    let mut count = 0;
    while let Some(id) = stack.pop() {
        count += 1;
        stack.extend(tree.child_nodes(id));
        stack.extend(tree.attributes(id));
    }
    count
}

pub fn child_names(tree: &DomTree, id: NodeId) -> Vec<String> {
    tree.child_nodes(id)
        .iter()
        .filter_map(|&c| tree.node_name(c))
        .collect()
}
