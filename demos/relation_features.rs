//! Relation features end to end: parser columns → Tree → templates → features
//!
//! This example demonstrates the full pipeline:
//! 1. Build a dependency tree from per-token parser output
//! 2. Declare templates, both in code and in the template language
//! 3. Apply them to a mention and to a relation between two mentions
//!
//! Run with: cargo run --example relation_features

use treefeats::{Compile, Indicator, NodeSet, Sentence, Template, Tree, TreeQuery, presets};

fn column(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn main() {
    println!("=== Treefeats: Relation Features Example ===\n");

    // "Aspirin reliably treats severe headaches in adults"
    let sentence = Sentence {
        words: column(&[
            "Aspirin", "reliably", "treats", "severe", "headaches", "in", "adults",
        ]),
        lemmas: column(&[
            "aspirin", "reliably", "treat", "severe", "headache", "in", "adult",
        ]),
        poses: column(&["NNP", "RB", "VBZ", "JJ", "NNS", "IN", "NNS"]),
        ners: column(&["DRUG", "O", "O", "O", "DISEASE", "O", "O"]),
        dep_labels: column(&["nsubj", "advmod", "ROOT", "amod", "dobj", "case", "nmod"]),
        dep_parents: vec![3, 3, 0, 5, 3, 7, 5],
    };

    // Step 1: Build the tree
    println!("🔧 Step 1: Building the tree...");
    let tree = Tree::from_sentence(&sentence);
    for node in &tree.nodes {
        let parent_info = match tree.parent(node.id) {
            Some(parent) => format!("→ {}", tree.attribute(parent, "word").unwrap_or("?")),
            None => "(root)".to_string(),
        };
        println!(
            "   {}: {} [{}] {}",
            node.id,
            tree.attribute(node.id, "word").unwrap_or("?"),
            tree.attribute(node.id, "dep_label").unwrap_or("?"),
            parent_info
        );
    }
    println!();

    // Step 2: Declare templates
    println!("📝 Step 2: Declaring templates...");
    let source = r#"
        # the dependency path between the two mentions
        indicator(between(mention(0), mention(1)), "dep_label");
        ngrams(between(mention(0), mention(1)), "lemma", 2, 3);
        # words strictly between them, in sentence order
        indicator(seq_between(), "word");
        combinations(indicator(mention(0), "ner"), indicator(mention(1), "ner"));
    "#;
    let parsed = match Compile::parse(source) {
        Ok(compiled) => compiled,
        Err(e) => {
            eprintln!("❌ Template error: {}", e);
            return;
        }
    };
    print!("{}", parsed);
    println!();

    // Step 3: Apply
    println!("🔍 Step 3: Relation (Aspirin, headaches)");
    match parsed.apply_relation(&tree, &[0], &[4]) {
        Ok(features) => features.for_each(|f| println!("   {}", f)),
        Err(e) => eprintln!("❌ Candidate error: {}", e),
    }
    println!();

    println!("🔍 Relation (headaches, Aspirin): inverted");
    match parsed.apply_relation(&tree, &[4], &[0]) {
        Ok(features) => features.for_each(|f| println!("   {}", f)),
        Err(e) => eprintln!("❌ Candidate error: {}", e),
    }
    println!();

    println!("🔍 Stock relation templates");
    let stock = presets::relation_templates()
        .map(|compiled| compiled.result_set(&tree, &[vec![0], vec![4]]));
    match stock {
        Ok(Ok(features)) => {
            let mut features: Vec<_> = features.into_iter().collect();
            features.sort();
            println!("   {} distinct features", features.len());
            for f in features.iter().take(10) {
                println!("   {}", f);
            }
        }
        Ok(Err(e)) => eprintln!("❌ Candidate error: {}", e),
        Err(e) => eprintln!("❌ Template error: {}", e),
    }
    println!();

    println!("🔍 Mention (severe headaches) with a keyword");
    let path = NodeSet::mention(0).between(&NodeSet::keyword("Aspirin"));
    let keyword = Indicator::concat(path, "dep_label,lemma");
    let mention = match (keyword, presets::mention_templates(&["treats"])) {
        (Ok(keyword), Ok(stock)) => {
            let mut templates: Vec<Template> =
                stock.entries().iter().cloned().map(Template::from).collect();
            templates.push(keyword.into());
            Compile::new(templates)
        }
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("❌ Template error: {}", e);
            return;
        }
    };
    match mention.apply_mention(&tree, &[3, 4]) {
        Ok(features) => features.for_each(|f| println!("   {}", f)),
        Err(e) => eprintln!("❌ Candidate error: {}", e),
    }
}
