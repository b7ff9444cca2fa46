//! Stock template sets for mentions and relations

use crate::compile::{Compile, Template};
use crate::error::TemplateError;
use crate::generator::{DEFAULT_REGEXP_SEPARATOR, Generator};
use crate::indicator::{Combinations, Indicator};
use crate::selector::{DEFAULT_SIBLING_WIDTH, MatchMode, NodeSet};
use crate::tree::{DEP_LABEL, LEMMA, NER, POS, WORD};

/// Attributes read by the mention templates
pub const BASIC_ATTRIBUTES: [&str; 4] = [WORD, LEMMA, POS, NER];

/// Attributes read by the relation templates
pub const BASIC_RELATION_ATTRIBUTES: [&str; 5] = [WORD, LEMMA, POS, NER, DEP_LABEL];

/// Generic mention features: the span's own attributes, capitalization,
/// sibling windows on either side, and for each keyword its presence in
/// the mention or sentence plus the dependency path to it.
pub fn mention_templates(keywords: &[&str]) -> Result<Compile, TemplateError> {
    let mention = NodeSet::mention(0);
    let mut templates: Vec<Template> = Vec::new();

    for attribute in BASIC_ATTRIBUTES {
        templates.push(Indicator::concat(mention.clone(), attribute)?.into());
    }

    let capital = Generator::regexp("^[A-Z].*$", "STARTS_W_CAPITAL", DEFAULT_REGEXP_SEPARATOR)?;
    templates.push(Indicator::new(mention.clone(), WORD, capital)?.into());

    for attribute in BASIC_ATTRIBUTES {
        let (right, left) = windows(&mention, attribute)?;
        templates.push(right.clone().into());
        templates.push(left.clone().into());
        templates.push(Combinations::new(right, left).into());
    }

    for &keyword in keywords {
        templates.push(Indicator::concat(mention.keyword_in(keyword), WORD)?.into());
        templates.push(Indicator::concat(NodeSet::keyword(keyword), WORD)?.into());

        let path = mention.between(&NodeSet::keyword(keyword));
        for attributes in [DEP_LABEL, LEMMA, "dep_label,lemma"] {
            templates.push(Indicator::concat(path.clone(), attributes)?.into());
        }
    }

    Ok(Compile::new(templates))
}

/// Generic relation features: the dependency path between the two
/// mentions, its 2- and 3-grams, the verbs on it, and both mentions'
/// sibling windows.
pub fn relation_templates() -> Result<Compile, TemplateError> {
    let path = NodeSet::mention(0).between(&NodeSet::mention(1));
    let mut templates: Vec<Template> = Vec::new();

    for attribute in BASIC_RELATION_ATTRIBUTES {
        templates.push(Indicator::concat(path.clone(), attribute)?.into());
    }

    for attribute in BASIC_RELATION_ATTRIBUTES {
        let trigrams = Generator::ngram_range(2, 3)?;
        templates.push(Indicator::new(path.clone(), attribute, trigrams)?.into());
    }

    let verbs = path.filter(POS, "VB", MatchMode::Prefix);
    templates.push(Indicator::new(verbs, LEMMA, Generator::ngram_range(1, 3)?)?.into());

    for slot in [0, 1] {
        let mention = NodeSet::mention(slot);
        for attribute in BASIC_ATTRIBUTES {
            let (right, left) = windows(&mention, attribute)?;
            templates.push(right.into());
            templates.push(left.into());
        }
    }

    Ok(Compile::new(templates))
}

/// Growing sibling windows to the right and left of `mention`
fn windows(mention: &NodeSet, attribute: &str) -> Result<(Indicator, Indicator), TemplateError> {
    Ok((
        Indicator::new(
            mention.right_siblings(DEFAULT_SIBLING_WIDTH),
            attribute,
            Generator::RightNgrams,
        )?,
        Indicator::new(
            mention.left_siblings(DEFAULT_SIBLING_WIDTH),
            attribute,
            Generator::LeftNgrams,
        )?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_tree;

    #[test]
    fn test_mention_template_count() {
        assert_eq!(mention_templates(&[]).unwrap().len(), 4 + 1 + 4 * 3);
        assert_eq!(
            mention_templates(&["treats", "adults"]).unwrap().len(),
            4 + 1 + 4 * 3 + 2 * 5
        );
        assert_eq!(mention_templates(&[]).unwrap().required_slots(), 1);
    }

    #[test]
    fn test_relation_template_count() {
        let compiled = relation_templates().unwrap();
        assert_eq!(compiled.len(), 5 + 5 + 1 + 2 * 4 * 2);
        assert_eq!(compiled.required_slots(), 2);
    }

    #[test]
    fn test_mention_features() {
        let tree = create_test_tree();
        let compiled = mention_templates(&["treats"]).unwrap();
        let features = compiled.result_set(&tree, &[vec![0]]).unwrap();

        for expected in [
            "WORD:MENTION[Aspirin]",
            "LEMMA:MENTION[aspirin]",
            "POS:MENTION[NNP]",
            "NER:MENTION[DRUG]",
            "WORD:MENTION[RGX:STARTS_W_CAPITAL=True]",
            "WORD:RIGHT-OF-MENTION[reliably_headaches]",
            "WORD:KEYWORD[treats]",
            "DEP_LABEL:BETWEEN-MENTION-and-KEYWORD[ROOT]",
            "DEP_LABEL|LEMMA:BETWEEN-MENTION-and-KEYWORD[ROOT|treat]",
        ] {
            assert!(features.contains(expected), "missing {expected}");
        }

        // no left siblings: neither the window nor its combination fires
        assert!(!features.iter().any(|f| f.contains("LEFT-OF-MENTION")));
        // "treats" is not inside the mention
        assert!(!features.iter().any(|f| f.contains("KEYWORD-IN-MENTION")));
    }

    #[test]
    fn test_window_combinations() {
        let tree = create_test_tree();
        let compiled = mention_templates(&[]).unwrap();
        let features: Vec<String> = compiled.apply_mention(&tree, &[1]).unwrap().collect();

        // "reliably": one sibling on each side
        assert!(features.contains(
            &"POS:RIGHT-OF-MENTION[NNS]+POS:LEFT-OF-MENTION[NNP]".to_string()
        ));
    }

    #[test]
    fn test_relation_features() {
        let tree = create_test_tree();
        let compiled = relation_templates().unwrap();
        let features: Vec<String> = compiled.apply_relation(&tree, &[0], &[5]).unwrap().collect();

        // Aspirin -> treats <- headaches <- adults <- in
        for expected in [
            "WORD:BETWEEN-MENTION-and-MENTION[treats_headaches_adults]",
            "DEP_LABEL:BETWEEN-MENTION-and-MENTION[ROOT_dobj_nmod]",
            "LEMMA:BETWEEN-MENTION-and-MENTION[treat_headache]",
            "LEMMA:BETWEEN-MENTION-and-MENTION[headache_adult]",
            "LEMMA:BETWEEN-MENTION-and-MENTION[treat_headache_adult]",
            "LEMMA:FILTER-BY(pos=VB):BETWEEN-MENTION-and-MENTION[treat]",
        ] {
            assert!(features.contains(&expected.to_string()), "missing {expected}");
        }
        assert!(!features.iter().any(|f| f.starts_with(INV)));

        let inverted: Vec<String> = compiled.apply_relation(&tree, &[5], &[0]).unwrap().collect();
        assert_eq!(inverted.len(), features.len());
        assert!(inverted.iter().all(|f| f.starts_with(INV)));
    }

    const INV: &str = crate::indicator::INVERSION_MARKER;
}
