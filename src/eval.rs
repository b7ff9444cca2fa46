//! Selector evaluation
//!
//! Lowers a symbolic [`Expr`] onto a [`TreeQuery`] once the candidate
//! positions are known. Results come back in document order; a selector's
//! sort key, when set, is applied afterwards to restore sentence order.

use log::trace;
use rustc_hash::FxHashSet;

use crate::error::CandidateError;
use crate::query::{DocumentOrder, TreeQuery};
use crate::selector::{Expr, MatchMode, NodeSet};
use crate::tree::{NodeId, WORD};

/// A candidate position (e.g. a word index)
pub type Position = usize;

/// Concrete candidate spans a template set is applied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    spans: Vec<Vec<Position>>,
    position_attribute: String,
}

impl Binding {
    /// Bind candidate spans, matched against `position_attribute` on nodes
    pub fn new(spans: Vec<Vec<Position>>, position_attribute: &str) -> Self {
        Self {
            spans,
            position_attribute: position_attribute.to_string(),
        }
    }

    /// Check the spans before anything is evaluated.
    ///
    /// `required` is the number of candidate slots the templates read.
    pub fn validate(&self, required: usize) -> Result<(), CandidateError> {
        if required > self.spans.len() {
            return Err(CandidateError::MissingCandidate {
                slot: required - 1,
                provided: self.spans.len(),
            });
        }

        let mut bounds = Vec::with_capacity(self.spans.len());
        for (slot, span) in self.spans.iter().enumerate() {
            match (span.iter().min(), span.iter().max()) {
                (Some(&lo), Some(&hi)) => bounds.push((lo, hi)),
                _ => return Err(CandidateError::EmptyCandidate { slot }),
            }
        }

        for (first, &(lo1, hi1)) in bounds.iter().enumerate() {
            for (second, &(lo2, hi2)) in bounds.iter().enumerate().skip(first + 1) {
                if lo1 <= hi2 && lo2 <= hi1 {
                    return Err(CandidateError::OverlappingCandidates { first, second });
                }
            }
        }

        Ok(())
    }

    /// Whether a relation's candidates appear in reverse sentence order
    pub fn is_inverted(&self) -> bool {
        match self.spans.as_slice() {
            [a, b] => a.iter().min() > b.iter().min(),
            _ => false,
        }
    }

    pub fn span(&self, slot: usize) -> Option<&[Position]> {
        self.spans.get(slot).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn position_attribute(&self) -> &str {
        &self.position_attribute
    }
}

/// A tree, its document order and the bound candidates
pub struct Context<'t, T: TreeQuery + ?Sized> {
    tree: &'t T,
    order: DocumentOrder,
    binding: Binding,
}

impl<'t, T: TreeQuery + ?Sized> Context<'t, T> {
    pub fn new(tree: &'t T, binding: Binding) -> Self {
        Self {
            tree,
            order: DocumentOrder::build(tree),
            binding,
        }
    }

    /// Validate `candidates` against the `required` slots and bind them
    pub fn bind(
        tree: &'t T,
        candidates: &[Vec<Position>],
        required: usize,
        position_attribute: &str,
    ) -> Result<Self, CandidateError> {
        let binding = Binding::new(candidates.to_vec(), position_attribute);
        binding.validate(required)?;
        Ok(Self::new(tree, binding))
    }

    pub fn tree(&self) -> &'t T {
        self.tree
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Evaluate a selector, applying its sort key if it has one
    pub fn select(&self, nodes: &NodeSet) -> Vec<NodeId> {
        let mut selected = self.eval(nodes.expr());

        if let Some(key) = nodes.sort_key() {
            // stable: nodes without a numeric key keep document order, last
            selected.sort_by_key(|&n| {
                let value = self.number(n, key);
                (value.is_none(), value.unwrap_or(0))
            });
        }

        trace!("{} matched {} node(s)", nodes.label(), selected.len());
        selected
    }

    fn eval(&self, expr: &Expr) -> Vec<NodeId> {
        match expr {
            Expr::All => self.order.nodes().to_vec(),

            Expr::Mention(slot) => match self.binding.span(*slot) {
                Some(span) => self
                    .order
                    .nodes()
                    .iter()
                    .copied()
                    .filter(|&n| {
                        self.position(n, &self.binding.position_attribute)
                            .is_some_and(|p| span.contains(&p))
                    })
                    .collect(),
                None => Vec::new(),
            },

            Expr::Keyword { source, word } => {
                self.filter(self.eval(source), WORD, word, MatchMode::Exact)
            }

            Expr::Filter {
                source,
                attribute,
                value,
                mode,
            } => self.filter(self.eval(source), attribute, value, *mode),

            Expr::LeftSiblings { source, width } => match self.eval(source).first() {
                Some(&first) => {
                    let siblings = self.siblings(first);
                    let idx = sibling_index(siblings, first);
                    siblings[idx.saturating_sub(*width)..idx].to_vec()
                }
                None => Vec::new(),
            },

            Expr::RightSiblings { source, width } => match self.eval(source).first() {
                Some(&first) => {
                    let siblings = self.siblings(first);
                    let start = sibling_index(siblings, first) + 1;
                    let end = start.saturating_add(*width).min(siblings.len());
                    siblings[start.min(end)..end].to_vec()
                }
                None => Vec::new(),
            },

            Expr::Children { source } => match self.eval(source).first() {
                Some(&first) => self.tree.children(first).to_vec(),
                None => Vec::new(),
            },

            Expr::Parents { source, depth } => match self.eval(source).first() {
                Some(&first) => {
                    let mut ancestors: Vec<NodeId> = self
                        .tree
                        .ancestors_or_self(first)
                        .into_iter()
                        .skip(1)
                        .take(*depth)
                        .collect();
                    self.order.sort(&mut ancestors);
                    ancestors
                }
                None => Vec::new(),
            },

            Expr::Between { left, right } => self.between(&self.eval(left), &self.eval(right)),

            Expr::SeqBetween { attribute } => self.seq_between(attribute),
        }
    }

    fn filter(
        &self,
        nodes: Vec<NodeId>,
        attribute: &str,
        value: &str,
        mode: MatchMode,
    ) -> Vec<NodeId> {
        nodes
            .into_iter()
            .filter(|&n| {
                self.tree
                    .attribute(n, attribute)
                    .is_some_and(|v| mode.matches(v, value))
            })
            .collect()
    }

    /// The ordered sibling group a node belongs to (roots for a root)
    fn siblings(&self, node: NodeId) -> &'t [NodeId] {
        match self.tree.parent(node) {
            Some(parent) => self.tree.children(parent),
            None => self.tree.roots(),
        }
    }

    /// Nodes connecting two selections through their lowest common
    /// ancestor, in document order.
    ///
    /// The ancestor is taken from the first node of each selection. A node
    /// of its subtree is kept when it is a proper ancestor of every node of
    /// one selection, so the endpoints themselves are left out. Empty when
    /// the selections sit in different trees of a forest.
    fn between(&self, left: &[NodeId], right: &[NodeId]) -> Vec<NodeId> {
        let (Some(&a), Some(&b)) = (left.first(), right.first()) else {
            return Vec::new();
        };
        let chain_a = self.tree.ancestors_or_self(a);
        let chain_b = self.tree.ancestors_or_self(b);
        let in_b: FxHashSet<NodeId> = chain_b.iter().copied().collect();

        let Some(depth_a) = chain_a.iter().position(|n| in_b.contains(n)) else {
            trace!("no common ancestor for nodes {a} and {b}");
            return Vec::new();
        };
        let lca = chain_a[depth_a];
        let Some(depth_b) = chain_b.iter().position(|&n| n == lca) else {
            return Vec::new();
        };

        // candidates lie on the chains from each first node up to the ancestor
        let mut path: Vec<NodeId> = Vec::new();
        for (selection, chain) in [(left, &chain_a[..=depth_a]), (right, &chain_b[..=depth_b])] {
            let dominating = self.proper_ancestors_of_all(selection);
            path.extend(chain.iter().copied().filter(|n| dominating.contains(n)));
        }
        self.order.sort(&mut path);
        path
    }

    /// Nodes that are a proper ancestor of every node in `selection`
    fn proper_ancestors_of_all(&self, selection: &[NodeId]) -> FxHashSet<NodeId> {
        let mut chains = selection.iter().map(|&n| {
            self.tree
                .ancestors_or_self(n)
                .into_iter()
                .skip(1)
                .collect::<FxHashSet<_>>()
        });
        let Some(mut common) = chains.next() else {
            return FxHashSet::default();
        };
        for chain in chains {
            common.retain(|n| chain.contains(n));
        }
        common
    }

    /// Nodes whose position lies strictly between candidates 0 and 1
    fn seq_between(&self, attribute: &str) -> Vec<NodeId> {
        let (Some(a), Some(b)) = (self.binding.span(0), self.binding.span(1)) else {
            return Vec::new();
        };
        let (Some(&a_lo), Some(&a_hi), Some(&b_lo), Some(&b_hi)) =
            (a.iter().min(), a.iter().max(), b.iter().min(), b.iter().max())
        else {
            return Vec::new();
        };
        let (lo, hi) = if a_hi < b_lo { (a_hi, b_lo) } else { (b_hi, a_lo) };

        self.order
            .nodes()
            .iter()
            .copied()
            .filter(|&n| self.position(n, attribute).is_some_and(|p| lo < p && p < hi))
            .collect()
    }

    fn position(&self, node: NodeId, attribute: &str) -> Option<Position> {
        self.tree.attribute(node, attribute)?.trim().parse().ok()
    }

    fn number(&self, node: NodeId, attribute: &str) -> Option<i64> {
        self.tree.attribute(node, attribute)?.trim().parse().ok()
    }
}

fn sibling_index(siblings: &[NodeId], node: NodeId) -> usize {
    siblings.iter().position(|&s| s == node).unwrap_or(0)
}
