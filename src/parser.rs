//! Template declaration language parser
//!
//! Parses template source into [`Template`]s using a pest grammar. Every
//! statement is a function call (or a `[...]` group of them) terminated by
//! `;`, built from node-set functions (`mention`, `between`, ...) and
//! indicator functions (`indicator`, `ngrams`, ...).

use log::debug;
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::compile::Template;
use crate::error::TemplateError;
use crate::generator::{DEFAULT_REGEXP_SEPARATOR, Generator};
use crate::indicator::{Combinations, Indicator};
use crate::selector::{DEFAULT_PARENT_DEPTH, DEFAULT_SIBLING_WIDTH, MatchMode, NodeSet};

#[derive(Parser)]
#[grammar = "template_grammar.pest"]
pub struct TemplateParser;

/// An evaluated expression
#[derive(Debug)]
enum Value {
    NodeSet(NodeSet),
    Template(Template),
    Str(String),
    Int(i64),
}

/// Parse template source into one template per statement
pub fn parse_templates(source: &str) -> Result<Vec<Template>, TemplateError> {
    let mut pairs = TemplateParser::parse(Rule::program, source).map_err(Box::new)?;
    let Some(program) = pairs.next() else {
        return Ok(Vec::new());
    };

    let mut templates = Vec::new();
    for statement in program.into_inner() {
        match statement.as_rule() {
            Rule::statement => {
                for expr in statement.into_inner() {
                    match lower(expr)? {
                        Value::Template(template) => templates.push(template),
                        _ => {
                            return Err(TemplateError::ArgumentType {
                                name: "statement".to_string(),
                                position: templates.len() + 1,
                                expected: "a template",
                            });
                        }
                    }
                }
            }
            Rule::EOI => {}
            rule => unreachable!("unexpected {rule:?} in program"),
        }
    }

    debug!("parsed {} template statement(s)", templates.len());
    Ok(templates)
}

fn lower(pair: Pair<Rule>) -> Result<Value, TemplateError> {
    match pair.as_rule() {
        Rule::call => {
            let mut inner = pair.into_inner();
            let name = inner.next().map(|p| p.as_str()).unwrap_or_default();
            let args = inner.map(lower).collect::<Result<Vec<_>, _>>()?;
            lower_call(name, args)
        }

        Rule::group => {
            let mut group = Vec::new();
            for (i, item) in pair.into_inner().enumerate() {
                match lower(item)? {
                    Value::Template(template) => group.push(template),
                    _ => {
                        return Err(TemplateError::ArgumentType {
                            name: "[...]".to_string(),
                            position: i + 1,
                            expected: "a template",
                        });
                    }
                }
            }
            Ok(Value::Template(Template::Group(group)))
        }

        Rule::string => {
            let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or_default();
            Ok(Value::Str(unescape(raw)))
        }

        Rule::integer => {
            let span = pair.as_span();
            pair.as_str().parse().map(Value::Int).map_err(|_| {
                let message = format!("integer out of range: {}", span.as_str());
                TemplateError::Syntax(Box::new(pest::error::Error::new_from_span(
                    pest::error::ErrorVariant::CustomError { message },
                    span,
                )))
            })
        }

        rule => unreachable!("unexpected {rule:?} in expression"),
    }
}

/// Resolve `\"` and `\\`; any other escape is kept as written
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(escaped @ ('"' | '\\')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn lower_call(name: &str, args: Vec<Value>) -> Result<Value, TemplateError> {
    let mut args = Args::new(name, args);

    let value = match name {
        // Node sets
        "all" => {
            args.arity(0, 0, "0")?;
            Value::NodeSet(NodeSet::all())
        }
        "mention" => {
            args.arity(1, 1, "1")?;
            Value::NodeSet(NodeSet::mention(args.count()?))
        }
        "keyword" => {
            args.arity(1, 2, "1 or 2")?;
            let word = args.string()?;
            match args.optional(Args::node_set)? {
                Some(source) => Value::NodeSet(source.keyword_in(&word)),
                None => Value::NodeSet(NodeSet::keyword(&word)),
            }
        }
        "left_siblings" | "right_siblings" => {
            args.arity(1, 2, "1 or 2")?;
            let source = args.node_set()?;
            let width = args.optional(Args::count)?.unwrap_or(DEFAULT_SIBLING_WIDTH);
            if name == "left_siblings" {
                Value::NodeSet(source.left_siblings(width))
            } else {
                Value::NodeSet(source.right_siblings(width))
            }
        }
        "children" => {
            args.arity(1, 1, "1")?;
            Value::NodeSet(args.node_set()?.children())
        }
        "parents" => {
            args.arity(1, 2, "1 or 2")?;
            let source = args.node_set()?;
            let depth = args.optional(Args::count)?.unwrap_or(DEFAULT_PARENT_DEPTH);
            Value::NodeSet(source.parents(depth))
        }
        "filter" => {
            args.arity(3, 4, "3 or 4")?;
            let source = args.node_set()?;
            let attribute = args.string()?;
            let value = args.string()?;
            let mode = args.optional(Args::match_mode)?.unwrap_or(MatchMode::Prefix);
            Value::NodeSet(source.filter(&attribute, &value, mode))
        }
        "between" => {
            args.arity(2, 2, "2")?;
            let left = args.node_set()?;
            let right = args.node_set()?;
            Value::NodeSet(left.between(&right))
        }
        "seq_between" => {
            args.arity(0, 1, "0 or 1")?;
            match args.optional(Args::string)? {
                Some(attribute) => Value::NodeSet(NodeSet::seq_between_by(&attribute)),
                None => Value::NodeSet(NodeSet::seq_between()),
            }
        }
        "sorted" => {
            args.arity(2, 2, "2")?;
            let source = args.node_set()?;
            Value::NodeSet(source.sorted_by(&args.string()?))
        }

        // Indicators
        "indicator" => {
            args.arity(2, 2, "2")?;
            let (nodes, attributes) = (args.node_set()?, args.string()?);
            indicator(nodes, &attributes, Generator::Concat)?
        }
        "ngrams" => {
            args.arity(3, 4, "3 or 4")?;
            let (nodes, attributes) = (args.node_set()?, args.string()?);
            let min = args.integer()?;
            let generator = match args.optional(Args::integer)? {
                Some(max) => Generator::ngram_range(min, max)?,
                None => Generator::ngrams(min)?,
            };
            indicator(nodes, &attributes, generator)?
        }
        "right_ngrams" | "left_ngrams" => {
            args.arity(2, 2, "2")?;
            let (nodes, attributes) = (args.node_set()?, args.string()?);
            let generator = if name == "right_ngrams" {
                Generator::RightNgrams
            } else {
                Generator::LeftNgrams
            };
            indicator(nodes, &attributes, generator)?
        }
        "regexp" => {
            args.arity(4, 5, "4 or 5")?;
            let (nodes, attributes) = (args.node_set()?, args.string()?);
            let (pattern, label) = (args.string()?, args.string()?);
            let separator = args
                .optional(Args::string)?
                .unwrap_or_else(|| DEFAULT_REGEXP_SEPARATOR.to_string());
            let generator = Generator::regexp(&pattern, &label, &separator)?;
            indicator(nodes, &attributes, generator)?
        }
        "combinations" => {
            args.arity(2, 2, "2")?;
            let left = args.indicator()?;
            let right = args.indicator()?;
            Value::Template(Combinations::new(left, right).into())
        }

        _ => {
            return Err(TemplateError::UnknownFunction {
                name: name.to_string(),
            });
        }
    };

    Ok(value)
}

fn indicator(
    nodes: NodeSet,
    attributes: &str,
    generator: Generator,
) -> Result<Value, TemplateError> {
    Ok(Value::Template(
        Indicator::new(nodes, attributes, generator)?.into(),
    ))
}

/// Positional arguments of one call, consumed left to right
struct Args {
    name: String,
    values: std::vec::IntoIter<Value>,
    found: usize,
    position: usize,
    expected: &'static str,
}

impl Args {
    fn new(name: &str, values: Vec<Value>) -> Self {
        Self {
            name: name.to_string(),
            found: values.len(),
            values: values.into_iter(),
            position: 0,
            expected: "",
        }
    }

    fn arity(&mut self, min: usize, max: usize, expected: &'static str) -> Result<(), TemplateError> {
        self.expected = expected;
        if (min..=max).contains(&self.found) {
            Ok(())
        } else {
            Err(self.arity_error())
        }
    }

    fn arity_error(&self) -> TemplateError {
        TemplateError::Arity {
            name: self.name.clone(),
            expected: self.expected,
            found: self.found,
        }
    }

    fn type_error(&self, expected: &'static str) -> TemplateError {
        TemplateError::ArgumentType {
            name: self.name.clone(),
            position: self.position,
            expected,
        }
    }

    fn next(&mut self) -> Result<Value, TemplateError> {
        let value = self.values.next().ok_or_else(|| self.arity_error())?;
        self.position += 1;
        Ok(value)
    }

    /// Read a trailing optional argument, if one is left
    fn optional<T>(
        &mut self,
        read: fn(&mut Self) -> Result<T, TemplateError>,
    ) -> Result<Option<T>, TemplateError> {
        if self.values.as_slice().is_empty() {
            Ok(None)
        } else {
            read(self).map(Some)
        }
    }

    fn node_set(&mut self) -> Result<NodeSet, TemplateError> {
        match self.next()? {
            Value::NodeSet(nodes) => Ok(nodes),
            _ => Err(self.type_error("a node set")),
        }
    }

    fn string(&mut self) -> Result<String, TemplateError> {
        match self.next()? {
            Value::Str(s) => Ok(s),
            _ => Err(self.type_error("a string")),
        }
    }

    fn integer(&mut self) -> Result<i64, TemplateError> {
        match self.next()? {
            Value::Int(n) => Ok(n),
            _ => Err(self.type_error("an integer")),
        }
    }

    fn count(&mut self) -> Result<usize, TemplateError> {
        match self.next()? {
            Value::Int(n) if n >= 0 => Ok(n as usize),
            _ => Err(self.type_error("a non-negative integer")),
        }
    }

    fn match_mode(&mut self) -> Result<MatchMode, TemplateError> {
        match self.next()? {
            Value::Str(s) if s == "exact" => Ok(MatchMode::Exact),
            Value::Str(s) if s == "prefix" => Ok(MatchMode::Prefix),
            _ => Err(self.type_error("\"exact\" or \"prefix\"")),
        }
    }

    fn indicator(&mut self) -> Result<Indicator, TemplateError> {
        match self.next()? {
            Value::Template(Template::Indicator(ind)) => Ok(ind),
            _ => Err(self.type_error("an indicator")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::Compile;
    use crate::selector::Expr;
    use crate::test_utils::create_test_tree;

    fn parse_one(source: &str) -> Template {
        let mut templates = parse_templates(source).unwrap();
        assert_eq!(templates.len(), 1);
        templates.remove(0)
    }

    fn parse_indicator(source: &str) -> Indicator {
        match parse_one(source) {
            Template::Indicator(ind) => ind,
            other => panic!("Expected indicator, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_indicator() {
        let ind = parse_indicator(r#"indicator(mention(0), "word");"#);

        assert_eq!(ind.nodes(), &NodeSet::mention(0));
        assert_eq!(ind.attributes(), &["word"]);
        assert!(matches!(ind.generator(), Generator::Concat));
    }

    #[test]
    fn test_parse_defaults() {
        let ind = parse_indicator(r#"left_ngrams(left_siblings(mention(0)), "word");"#);
        assert_eq!(ind.nodes(), &NodeSet::mention(0).left_siblings(DEFAULT_SIBLING_WIDTH));

        let ind = parse_indicator(r#"indicator(parents(mention(1)), "lemma");"#);
        assert_eq!(ind.nodes(), &NodeSet::mention(1).parents(DEFAULT_PARENT_DEPTH));

        let ind = parse_indicator(r#"indicator(filter(all(), "pos", "VB"), "lemma");"#);
        assert_eq!(
            ind.nodes(),
            &NodeSet::all().filter("pos", "VB", MatchMode::Prefix)
        );

        let ind = parse_indicator(r#"regexp(mention(0), "word", "^[A-Z]", "CAP");"#);
        match ind.generator() {
            Generator::Regexp { separator, .. } => assert_eq!(separator, " "),
            other => panic!("Expected regexp, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_node_set_functions() {
        let ind = parse_indicator(
            r#"
            indicator(
                sorted(filter(between(mention(0), keyword("drug")), "pos", "NN", "exact"), "word_idx"),
                "word"
            );
            "#,
        );
        let expected = NodeSet::mention(0)
            .between(&NodeSet::keyword("drug"))
            .filter("pos", "NN", MatchMode::Exact)
            .sorted_by("word_idx");
        assert_eq!(ind.nodes(), &expected);

        let ind = parse_indicator(r#"indicator(keyword("drug", children(mention(0))), "word");"#);
        assert_eq!(
            ind.nodes(),
            &NodeSet::mention(0).children().keyword_in("drug")
        );

        let ind = parse_indicator(r#"indicator(seq_between("id"), "word");"#);
        assert_eq!(ind.nodes().expr(), &Expr::SeqBetween { attribute: "id".to_string() });
        assert_eq!(ind.nodes().sort_key(), Some("id"));
    }

    #[test]
    fn test_displayed_selectors_parse_back() {
        for nodes in [
            NodeSet::keyword("drug"),
            NodeSet::mention(0).keyword_in("drug"),
            NodeSet::mention(0).between(&NodeSet::keyword("drug")),
        ] {
            let source = format!(r#"indicator({}, "word");"#, nodes.expr());
            assert_eq!(parse_indicator(&source).nodes(), &nodes, "{source}");
        }
    }

    #[test]
    fn test_parse_ngrams() {
        let ind = parse_indicator(r#"ngrams(all(), "lemma", 2, 3);"#);
        assert_eq!(ind.generator().name(), "Ngrams");
        match ind.generator() {
            Generator::Ngrams(range) => assert_eq!((range.min(), range.max()), (2, 3)),
            other => panic!("Expected ngrams, got {other:?}"),
        }

        let ind = parse_indicator(r#"ngrams(all(), "lemma", 2);"#);
        match ind.generator() {
            Generator::Ngrams(range) => assert_eq!((range.min(), range.max()), (2, 2)),
            other => panic!("Expected ngrams, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_program_with_groups_and_comments() {
        let source = r#"
            # mention features
            indicator(mention(0), "word");
            ngrams(between(mention(0), mention(1)), "lemma", 2, 3);
            ngrams(filter(between(mention(0), mention(1)), "pos", "VB"), "lemma", 1, 3);
            right_ngrams(right_siblings(mention(0), 3), "word");
            left_ngrams(left_siblings(mention(0)), "word");
            regexp(mention(0), "word", "^[A-Z].*$", "STARTS_W_CAPITAL");
            combinations(indicator(mention(0), "pos"), indicator(keyword("drug"), "word"));
            [indicator(mention(0), "lemma"), [indicator(mention(0), "ner")]];   # nested group
        "#;

        let templates = parse_templates(source).unwrap();
        assert_eq!(templates.len(), 8);
        assert!(matches!(templates[6], Template::Combinations(_)));
        assert!(matches!(templates[7], Template::Group(_)));

        let compiled = Compile::new(templates);
        assert_eq!(compiled.len(), 9);
        assert_eq!(compiled.required_slots(), 2);
    }

    #[test]
    fn test_parse_and_apply() {
        let tree = create_test_tree();
        let compiled = Compile::parse(
            r#"
            indicator(mention(0), "word");
            indicator(keyword("treats"), "lemma");
            combinations(indicator(mention(0), "pos"), indicator(children(mention(0)), "dep_label"));
            "#,
        )
        .unwrap();

        let features: Vec<String> = compiled.apply_mention(&tree, &[4]).unwrap().collect();
        assert_eq!(
            features,
            vec![
                "WORD:MENTION[headaches]",
                "LEMMA:KEYWORD[treat]",
                "POS:MENTION[NNS]+DEP_LABEL:CHILDREN-OF-MENTION[amod_nmod]",
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        let ind = parse_indicator(r#"regexp(mention(0), "word", "^\"\d+\\.", "QUOTED");"#);
        match ind.generator() {
            Generator::Regexp { regex, .. } => assert_eq!(regex.as_str(), r#"^"\d+\."#),
            other => panic!("Expected regexp, got {other:?}"),
        }
        assert_eq!(unescape(r#"a\"b\\c\d"#), r#"a"b\c\d"#);
    }

    #[test]
    fn test_empty_source() {
        assert!(parse_templates("").unwrap().is_empty());
        assert!(parse_templates("  # nothing here\n").unwrap().is_empty());
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            parse_templates(r#"indicator(mention(0), "word")"#),
            Err(TemplateError::Syntax(_))
        ));
        assert!(matches!(
            parse_templates(r#"indicator(mention(0), "word";"#),
            Err(TemplateError::Syntax(_))
        ));
        assert!(matches!(
            parse_templates("indicator(mention(99999999999999999999), \"word\");"),
            Err(TemplateError::Syntax(_))
        ));
    }

    #[test]
    fn test_unknown_function() {
        assert!(matches!(
            parse_templates(r#"indicator(siblings(mention(0)), "word");"#),
            Err(TemplateError::UnknownFunction { name }) if name == "siblings"
        ));
    }

    #[test]
    fn test_arity_error() {
        assert!(matches!(
            parse_templates(r#"indicator(mention(0));"#),
            Err(TemplateError::Arity { name, expected: "2", found: 1 }) if name == "indicator"
        ));
        assert!(matches!(
            parse_templates(r#"indicator(between(mention(0)), "word");"#),
            Err(TemplateError::Arity { found: 1, .. })
        ));
    }

    #[test]
    fn test_argument_type_errors() {
        assert!(matches!(
            parse_templates(r#"indicator("word", mention(0));"#),
            Err(TemplateError::ArgumentType { position: 1, expected: "a node set", .. })
        ));
        assert!(matches!(
            parse_templates(r#"indicator(left_siblings(mention(0), -1), "word");"#),
            Err(TemplateError::ArgumentType { position: 2, .. })
        ));
        assert!(matches!(
            parse_templates(r#"indicator(filter(all(), "pos", "VB", "fuzzy"), "word");"#),
            Err(TemplateError::ArgumentType { position: 4, .. })
        ));
        assert!(matches!(
            parse_templates(r#"combinations(mention(0), indicator(mention(0), "word"));"#),
            Err(TemplateError::ArgumentType { expected: "an indicator", .. })
        ));
        // a bare node set is not a template
        assert!(matches!(
            parse_templates("mention(0);"),
            Err(TemplateError::ArgumentType { expected: "a template", .. })
        ));
        assert!(matches!(
            parse_templates(r#"[indicator(mention(0), "word"), "word"];"#),
            Err(TemplateError::ArgumentType { position: 2, .. })
        ));
    }

    #[test]
    fn test_template_errors_surface_at_parse() {
        assert!(matches!(
            Compile::parse(r#"ngrams(all(), "word", 0);"#),
            Err(TemplateError::InvalidNgramRange { min: 0, max: 0 })
        ));
        assert!(matches!(
            Compile::parse(r#"ngrams(all(), "word", 3, 2);"#),
            Err(TemplateError::InvalidNgramRange { min: 3, max: 2 })
        ));
        assert!(matches!(
            Compile::parse(r#"regexp(all(), "word", "(", "BAD");"#),
            Err(TemplateError::InvalidRegex { .. })
        ));
        assert!(matches!(
            Compile::parse(r#"indicator(all(), "");"#),
            Err(TemplateError::EmptyAttributes)
        ));
    }
}
