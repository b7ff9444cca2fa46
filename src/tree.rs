//! Labeled tree data structures
//!
//! A reference implementation of [`TreeQuery`]: an arena of nodes, each
//! carrying an attribute map, with ordered children. Trees are built once
//! by the caller and only ever read by the feature engine.

use rustc_hash::FxHashMap;

use crate::query::TreeQuery;

/// Unique identifier for a node (index into the tree's arena)
pub type NodeId = usize;

/// Attribute names stamped by [`Tree::from_sentence`]
pub const WORD: &str = "word";
pub const LEMMA: &str = "lemma";
pub const POS: &str = "pos";
pub const NER: &str = "ner";
pub const DEP_LABEL: &str = "dep_label";
pub const DEP_PARENT: &str = "dep_parent";
pub const WORD_IDX: &str = "word_idx";

/// Attribute map of a node (name -> value)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(FxHashMap<String, String>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A node in a labeled tree
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub attributes: Attributes,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    /// Create a detached node with the given attributes
    pub fn new(id: NodeId, attributes: Attributes) -> Self {
        Self {
            id,
            attributes,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Per-token parser output for one sentence.
///
/// Columns left empty are simply not stamped on the nodes. `dep_parents`
/// is 1-based with 0 marking a root, as parsers emit it.
#[derive(Debug, Clone, Default)]
pub struct Sentence {
    pub words: Vec<String>,
    pub lemmas: Vec<String>,
    pub poses: Vec<String>,
    pub ners: Vec<String>,
    pub dep_labels: Vec<String>,
    pub dep_parents: Vec<usize>,
}

/// An ordered, rooted, labeled tree (or forest, when several tokens attach
/// to the artificial root)
#[derive(Debug, Clone, Default)]
pub struct Tree {
    pub nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dependency tree from parser columns.
    ///
    /// Every token becomes one node whose id equals its 0-based sentence
    /// position, stamped as `word_idx`. Children are attached in sentence
    /// order. Heads pointing outside the sentence leave the token as a root.
    pub fn from_sentence(sentence: &Sentence) -> Self {
        let mut tree = Tree::new();

        for i in 0..sentence.words.len() {
            let mut attributes = Attributes::new();
            let columns = [
                (WORD, &sentence.words),
                (LEMMA, &sentence.lemmas),
                (POS, &sentence.poses),
                (NER, &sentence.ners),
                (DEP_LABEL, &sentence.dep_labels),
            ];
            for (name, column) in columns {
                if let Some(value) = column.get(i) {
                    attributes.insert(name, value.as_str());
                }
            }
            if let Some(head) = sentence.dep_parents.get(i) {
                attributes.insert(DEP_PARENT, head.to_string());
            }
            attributes.insert(WORD_IDX, i.to_string());
            tree.add_node(Node::new(i, attributes));
        }

        for (i, &head) in sentence.dep_parents.iter().enumerate() {
            if head > 0 && head <= tree.len() && head - 1 != i {
                tree.set_parent(i, head - 1);
            }
        }

        tree
    }

    /// Add a node to the tree; it stays a root until given a parent
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        self.roots.push(id);
        id
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Set the parent of a node, appending it to the parent's children
    pub fn set_parent(&mut self, child_id: NodeId, parent_id: NodeId) {
        if child_id >= self.nodes.len() || parent_id >= self.nodes.len() {
            return;
        }
        if let Some(old) = self.nodes[child_id].parent.replace(parent_id) {
            self.nodes[old].children.retain(|&c| c != child_id);
        }
        self.nodes[parent_id].children.push(child_id);
        self.roots.retain(|&r| r != child_id);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl TreeQuery for Tree {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get_node(node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.get_node(node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get_node(node).and_then(|n| n.attributes.get(name))
    }
}
