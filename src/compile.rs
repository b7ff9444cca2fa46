//! Compiled template sets
//!
//! [`Compile`] flattens a declared, possibly nested, collection of
//! indicators and combinations into one ordered list and applies every
//! entry to a (tree, candidates) pair. Candidates are validated once, up
//! front; features are then produced lazily, template by template.

use std::fmt;

use log::{debug, trace};
use rustc_hash::FxHashSet;

use crate::config::FeatureConfig;
use crate::error::{CandidateError, TemplateError};
use crate::eval::{Context, Position};
use crate::indicator::{Combinations, Features, Indicator};
use crate::parser::parse_templates;
use crate::query::TreeQuery;

/// A template as declared: a single entry or a nested group
#[derive(Debug, Clone)]
pub enum Template {
    Indicator(Indicator),
    Combinations(Combinations),
    Group(Vec<Template>),
}

impl From<Indicator> for Template {
    fn from(indicator: Indicator) -> Self {
        Template::Indicator(indicator)
    }
}

impl From<Combinations> for Template {
    fn from(combinations: Combinations) -> Self {
        Template::Combinations(combinations)
    }
}

impl<T: Into<Template>> From<Vec<T>> for Template {
    fn from(group: Vec<T>) -> Self {
        Template::Group(group.into_iter().map(Into::into).collect())
    }
}

impl From<Entry> for Template {
    fn from(entry: Entry) -> Self {
        match entry {
            Entry::Indicator(ind) => Template::Indicator(ind),
            Entry::Combinations(combo) => Template::Combinations(combo),
        }
    }
}

/// One entry of a flattened template set
#[derive(Debug, Clone)]
pub enum Entry {
    Indicator(Indicator),
    Combinations(Combinations),
}

impl Entry {
    pub fn required_slots(&self) -> usize {
        match self {
            Entry::Indicator(ind) => ind.required_slots(),
            Entry::Combinations(combo) => combo.required_slots(),
        }
    }

    fn features<T: TreeQuery + ?Sized>(
        &self,
        ctx: &Context<'_, T>,
        config: &FeatureConfig,
    ) -> Features<'static> {
        match self {
            Entry::Indicator(ind) => Features::new(ind.features(ctx, config).into_iter()),
            Entry::Combinations(combo) => combo.features(ctx, config),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Indicator(ind) => fmt::Display::fmt(ind, f),
            Entry::Combinations(combo) => fmt::Display::fmt(combo, f),
        }
    }
}

/// A flattened, reusable template set
#[derive(Debug, Clone)]
pub struct Compile {
    entries: Vec<Entry>,
    required_slots: usize,
    config: FeatureConfig,
}

impl Compile {
    pub fn new<I>(templates: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Template>,
    {
        let mut entries = Vec::new();
        for template in templates {
            flatten(template.into(), &mut entries);
        }
        let required_slots = entries.iter().map(Entry::required_slots).max().unwrap_or(0);

        debug!(
            "compiled {} template(s) reading {} candidate slot(s)",
            entries.len(),
            required_slots
        );

        Self {
            entries,
            required_slots,
            config: FeatureConfig::default(),
        }
    }

    /// Compile templates written in the declaration language
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Ok(Self::new(parse_templates(source)?))
    }

    pub fn with_config(mut self, config: FeatureConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of candidate spans `apply` needs
    pub fn required_slots(&self) -> usize {
        self.required_slots
    }

    /// Apply every template, concatenating features in declaration order
    pub fn apply<'a, T>(
        &'a self,
        tree: &'a T,
        candidates: &[Vec<Position>],
    ) -> Result<Features<'a>, CandidateError>
    where
        T: TreeQuery + ?Sized + 'a,
    {
        let ctx = Context::bind(
            tree,
            candidates,
            self.required_slots,
            &self.config.position_attribute,
        )?;
        let config = &self.config;

        Ok(Features::new(self.entries.iter().flat_map(move |entry| {
            trace!("applying {entry}");
            entry.features(&ctx, config)
        })))
    }

    /// Apply to a single mention
    pub fn apply_mention<'a, T>(
        &'a self,
        tree: &'a T,
        positions: &[Position],
    ) -> Result<Features<'a>, CandidateError>
    where
        T: TreeQuery + ?Sized + 'a,
    {
        self.apply(tree, &[positions.to_vec()])
    }

    /// Apply to a pair of mentions
    pub fn apply_relation<'a, T>(
        &'a self,
        tree: &'a T,
        first: &[Position],
        second: &[Position],
    ) -> Result<Features<'a>, CandidateError>
    where
        T: TreeQuery + ?Sized + 'a,
    {
        self.apply(tree, &[first.to_vec(), second.to_vec()])
    }

    /// Distinct features across all templates
    pub fn result_set<T: TreeQuery + ?Sized>(
        &self,
        tree: &T,
        candidates: &[Vec<Position>],
    ) -> Result<FxHashSet<String>, CandidateError> {
        Ok(self.apply(tree, candidates)?.collect())
    }
}

fn flatten(template: Template, entries: &mut Vec<Entry>) {
    match template {
        Template::Indicator(ind) => entries.push(Entry::Indicator(ind)),
        Template::Combinations(combo) => entries.push(Entry::Combinations(combo)),
        Template::Group(group) => {
            for template in group {
                flatten(template, entries);
            }
        }
    }
}

impl fmt::Display for Compile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}
