//! Indicators and combinators
//!
//! An [`Indicator`] reads one or more attributes off the nodes a selector
//! matches and turns them into feature strings:
//!
//! ```text
//! [INV_]ATTR1|ATTR2:SELECTOR_LABEL[value]
//! ```
//!
//! [`Combinations`] conjoins two indicators into `featureA+featureB`.

use std::fmt;

use crate::config::FeatureConfig;
use crate::error::{CandidateError, TemplateError};
use crate::eval::{Context, Position};
use crate::generator::Generator;
use crate::query::TreeQuery;
use crate::selector::NodeSet;

/// Prefix marking relation features whose candidates appear in reverse order
pub const INVERSION_MARKER: &str = "INV_";

/// Joins the attributes of one node, and their names in the label
pub const ATTRIBUTE_SEPARATOR: &str = "|";

/// Lazily produced feature strings
pub struct Features<'a> {
    inner: Box<dyn Iterator<Item = String> + 'a>,
}

impl<'a> Features<'a> {
    pub fn new(iter: impl Iterator<Item = String> + 'a) -> Self {
        Self {
            inner: Box::new(iter),
        }
    }
}

impl Iterator for Features<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// A selector, the attributes to read and a generation rule
#[derive(Debug, Clone)]
pub struct Indicator {
    nodes: NodeSet,
    attributes: Vec<String>,
    attribute_label: String,
    generator: Generator,
}

impl Indicator {
    /// `attributes` is a comma-separated list of attribute names
    pub fn new(
        nodes: NodeSet,
        attributes: &str,
        generator: Generator,
    ) -> Result<Self, TemplateError> {
        let attributes: Vec<String> = attributes
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
        if attributes.is_empty() {
            return Err(TemplateError::EmptyAttributes);
        }
        let attribute_label = attributes.join(ATTRIBUTE_SEPARATOR).to_uppercase();

        Ok(Self {
            nodes,
            attributes,
            attribute_label,
            generator,
        })
    }

    /// Indicator concatenating the whole selection into one feature
    pub fn concat(nodes: NodeSet, attributes: &str) -> Result<Self, TemplateError> {
        Self::new(nodes, attributes, Generator::Concat)
    }

    pub fn nodes(&self) -> &NodeSet {
        &self.nodes
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Number of candidate slots this indicator reads
    pub fn required_slots(&self) -> usize {
        self.nodes.expr().max_slot().map_or(0, |slot| slot + 1)
    }

    /// Apply to a tree and candidate list with the default configuration
    pub fn apply<T: TreeQuery + ?Sized>(
        &self,
        tree: &T,
        candidates: &[Vec<Position>],
    ) -> Result<Features<'static>, CandidateError> {
        self.apply_with(tree, candidates, &FeatureConfig::default())
    }

    pub fn apply_with<T: TreeQuery + ?Sized>(
        &self,
        tree: &T,
        candidates: &[Vec<Position>],
        config: &FeatureConfig,
    ) -> Result<Features<'static>, CandidateError> {
        let ctx = Context::bind(
            tree,
            candidates,
            self.required_slots(),
            &config.position_attribute,
        )?;
        Ok(Features::new(self.features(&ctx, config).into_iter()))
    }

    pub(crate) fn features<T: TreeQuery + ?Sized>(
        &self,
        ctx: &Context<'_, T>,
        config: &FeatureConfig,
    ) -> Vec<String> {
        let nodes = ctx.select(&self.nodes);
        if nodes.is_empty() {
            return Vec::new();
        }

        let tree = ctx.tree();
        let values: Vec<String> = nodes
            .iter()
            .map(|&node| {
                self.attributes
                    .iter()
                    .map(|a| tree.attribute(node, a).unwrap_or(config.null_marker.as_str()))
                    .collect::<Vec<_>>()
                    .join(ATTRIBUTE_SEPARATOR)
            })
            .collect();

        let generated = self.generator.generate(&values);
        if !config.label_features {
            return generated;
        }

        let inversion = if ctx.binding().is_inverted() {
            INVERSION_MARKER
        } else {
            ""
        };
        generated
            .into_iter()
            .map(|value| {
                format!(
                    "{}{}:{}[{}]",
                    inversion,
                    self.attribute_label,
                    self.nodes.label(),
                    value
                )
            })
            .collect()
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}:{}:{}, {}>",
            self.generator.name(),
            self.attributes.join(","),
            self.nodes.label(),
            self.nodes.expr()
        )
    }
}

/// Every pairing of two indicators' features
#[derive(Debug, Clone)]
pub struct Combinations {
    left: Indicator,
    right: Indicator,
}

impl Combinations {
    pub fn new(left: Indicator, right: Indicator) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &Indicator {
        &self.left
    }

    pub fn right(&self) -> &Indicator {
        &self.right
    }

    pub fn required_slots(&self) -> usize {
        self.left.required_slots().max(self.right.required_slots())
    }

    pub fn apply<T: TreeQuery + ?Sized>(
        &self,
        tree: &T,
        candidates: &[Vec<Position>],
    ) -> Result<Features<'static>, CandidateError> {
        self.apply_with(tree, candidates, &FeatureConfig::default())
    }

    pub fn apply_with<T: TreeQuery + ?Sized>(
        &self,
        tree: &T,
        candidates: &[Vec<Position>],
        config: &FeatureConfig,
    ) -> Result<Features<'static>, CandidateError> {
        let ctx = Context::bind(
            tree,
            candidates,
            self.required_slots(),
            &config.position_attribute,
        )?;
        Ok(self.features(&ctx, config))
    }

    /// Left features in the outer loop, right features in the inner one.
    /// Pairs are formatted as the iterator reaches them.
    pub(crate) fn features<T: TreeQuery + ?Sized>(
        &self,
        ctx: &Context<'_, T>,
        config: &FeatureConfig,
    ) -> Features<'static> {
        let left = self.left.features(ctx, config);
        if left.is_empty() {
            return Features::new(std::iter::empty());
        }
        let right = self.right.features(ctx, config);

        let width = right.len();
        Features::new(
            (0..left.len() * width)
                .map(move |k| format!("{}+{}", left[k / width], right[k % width])),
        )
    }
}

impl fmt::Display for Combinations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Combinations: {} + {}>", self.left, self.right)
    }
}
