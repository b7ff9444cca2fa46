//! Structural selectors
//!
//! A [`NodeSet`] describes *which* nodes of a tree a template reads. It is a
//! label, a symbolic [`Expr`] and an optional post-query sort key. Selectors
//! stay symbolic until [`crate::eval`] binds them to concrete candidates.
//! Every transform takes a parent selector and builds a new one; nothing is
//! ever mutated in place.

use std::fmt;

use crate::tree::WORD_IDX;

/// Default number of siblings read by sibling windows
pub const DEFAULT_SIBLING_WIDTH: usize = 3;

/// Default number of ancestor levels read by [`NodeSet::parents`]
pub const DEFAULT_PARENT_DEPTH: usize = 1;

/// How a [`Expr::Filter`] compares attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    Prefix,
}

impl MatchMode {
    pub fn matches(self, candidate: &str, value: &str) -> bool {
        match self {
            MatchMode::Exact => candidate == value,
            MatchMode::Prefix => candidate.starts_with(value),
        }
    }
}

/// Structural query AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Every node of the tree
    All,
    /// Nodes whose position attribute belongs to candidate `slot`
    Mention(usize),
    /// Nodes of `source` whose word equals `word`
    Keyword { source: Box<Expr>, word: String },
    /// Up to `width` siblings immediately preceding the first source node
    LeftSiblings { source: Box<Expr>, width: usize },
    /// Up to `width` siblings immediately following the first source node
    RightSiblings { source: Box<Expr>, width: usize },
    /// Children of the first source node
    Children { source: Box<Expr> },
    /// Up to `depth` ancestors of the first source node
    Parents { source: Box<Expr>, depth: usize },
    /// Nodes of `source` whose `attribute` matches `value`
    Filter {
        source: Box<Expr>,
        attribute: String,
        value: String,
        mode: MatchMode,
    },
    /// Nodes on the tree path connecting the two selections
    Between { left: Box<Expr>, right: Box<Expr> },
    /// Nodes strictly between candidates 0 and 1 in sentence order
    SeqBetween { attribute: String },
}

impl Expr {
    /// Highest candidate slot this expression reads, if any
    pub fn max_slot(&self) -> Option<usize> {
        match self {
            Expr::All => None,
            Expr::Mention(slot) => Some(*slot),
            Expr::SeqBetween { .. } => Some(1),
            Expr::Keyword { source, .. }
            | Expr::LeftSiblings { source, .. }
            | Expr::RightSiblings { source, .. }
            | Expr::Children { source }
            | Expr::Parents { source, .. }
            | Expr::Filter { source, .. } => source.max_slot(),
            Expr::Between { left, right } => left.max_slot().max(right.max_slot()),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::All => write!(f, "all()"),
            Expr::Mention(slot) => write!(f, "mention({slot})"),
            Expr::Keyword { source, word } if **source == Expr::All => {
                write!(f, "keyword({word:?})")
            }
            Expr::Keyword { source, word } => write!(f, "keyword({word:?}, {source})"),
            Expr::LeftSiblings { source, width } => write!(f, "left_siblings({source}, {width})"),
            Expr::RightSiblings { source, width } => {
                write!(f, "right_siblings({source}, {width})")
            }
            Expr::Children { source } => write!(f, "children({source})"),
            Expr::Parents { source, depth } => write!(f, "parents({source}, {depth})"),
            Expr::Filter {
                source,
                attribute,
                value,
                mode,
            } => {
                let mode = match mode {
                    MatchMode::Exact => "exact",
                    MatchMode::Prefix => "prefix",
                };
                write!(f, "filter({source}, {attribute:?}, {value:?}, {mode:?})")
            }
            Expr::Between { left, right } => write!(f, "between({left}, {right})"),
            Expr::SeqBetween { attribute } => write!(f, "seq_between({attribute:?})"),
        }
    }
}

/// A composable, bindable description of "which nodes"
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSet {
    label: String,
    expr: Expr,
    sort_key: Option<String>,
}

impl NodeSet {
    /// Every node in the tree
    pub fn all() -> Self {
        Self {
            label: "NODESET".to_string(),
            expr: Expr::All,
            sort_key: None,
        }
    }

    /// The nodes making up candidate `slot` (0 for a mention, 0/1 for a relation)
    pub fn mention(slot: usize) -> Self {
        Self {
            label: "MENTION".to_string(),
            expr: Expr::Mention(slot),
            sort_key: None,
        }
    }

    /// Nodes anywhere in the tree whose word is `word`
    pub fn keyword(word: &str) -> Self {
        Self {
            label: "KEYWORD".to_string(),
            expr: Expr::Keyword {
                source: Box::new(Expr::All),
                word: word.to_string(),
            },
            sort_key: None,
        }
    }

    /// Nodes of this selection whose word is `word`
    pub fn keyword_in(&self, word: &str) -> Self {
        self.derive(
            format!("KEYWORD-IN-{}", self.label),
            Expr::Keyword {
                source: Box::new(self.expr.clone()),
                word: word.to_string(),
            },
        )
    }

    /// Up to `width` siblings left of the first selected node
    pub fn left_siblings(&self, width: usize) -> Self {
        self.derive(
            format!("LEFT-OF-{}", self.label),
            Expr::LeftSiblings {
                source: Box::new(self.expr.clone()),
                width,
            },
        )
    }

    /// Up to `width` siblings right of the first selected node
    pub fn right_siblings(&self, width: usize) -> Self {
        self.derive(
            format!("RIGHT-OF-{}", self.label),
            Expr::RightSiblings {
                source: Box::new(self.expr.clone()),
                width,
            },
        )
    }

    /// Immediate children of the first selected node
    pub fn children(&self) -> Self {
        self.derive(
            format!("CHILDREN-OF-{}", self.label),
            Expr::Children {
                source: Box::new(self.expr.clone()),
            },
        )
    }

    /// Ancestors of the first selected node, up to `depth` levels
    pub fn parents(&self, depth: usize) -> Self {
        self.derive(
            format!("PARENTS-OF-{}", self.label),
            Expr::Parents {
                source: Box::new(self.expr.clone()),
                depth,
            },
        )
    }

    /// Restrict to nodes whose `attribute` equals (`Exact`) or starts with
    /// (`Prefix`) `value`
    pub fn filter(&self, attribute: &str, value: &str, mode: MatchMode) -> Self {
        self.derive(
            format!("FILTER-BY({attribute}={value}):{}", self.label),
            Expr::Filter {
                source: Box::new(self.expr.clone()),
                attribute: attribute.to_string(),
                value: value.to_string(),
                mode,
            },
        )
    }

    /// Ancestors on the tree path between this selection and `other`.
    /// An endpoint is only kept when it dominates the other side.
    ///
    /// The sort key, if any, comes from `self`.
    pub fn between(&self, other: &NodeSet) -> Self {
        self.derive(
            format!("BETWEEN-{}-and-{}", self.label, other.label),
            Expr::Between {
                left: Box::new(self.expr.clone()),
                right: Box::new(other.expr.clone()),
            },
        )
    }

    /// Nodes strictly between the two relation candidates in sentence order,
    /// using the default position attribute
    pub fn seq_between() -> Self {
        Self::seq_between_by(WORD_IDX)
    }

    /// Like [`NodeSet::seq_between`], reading positions from `attribute`
    pub fn seq_between_by(attribute: &str) -> Self {
        Self {
            label: "SEQ-BETWEEN".to_string(),
            expr: Expr::SeqBetween {
                attribute: attribute.to_string(),
            },
            sort_key: Some(attribute.to_string()),
        }
    }

    /// Override the post-query sort key
    pub fn sorted_by(&self, attribute: &str) -> Self {
        Self {
            label: self.label.clone(),
            expr: self.expr.clone(),
            sort_key: Some(attribute.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key.as_deref()
    }

    fn derive(&self, label: String, expr: Expr) -> Self {
        Self {
            label,
            expr,
            sort_key: self.sort_key.clone(),
        }
    }
}

impl fmt::Display for NodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}>", self.label, self.expr)
    }
}
