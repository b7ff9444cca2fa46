//! Shared test fixtures

use crate::tree::{Sentence, Tree};

fn column(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// "Aspirin reliably treats severe headaches in adults"
///
/// ```text
/// 2: treats (ROOT)
///   ├─ 0: Aspirin (nsubj)
///   ├─ 1: reliably (advmod)
///   └─ 4: headaches (dobj)
///        ├─ 3: severe (amod)
///        └─ 6: adults (nmod)
///             └─ 5: in (case)
/// ```
///
/// Document order: 2, 0, 1, 4, 3, 6, 5
pub fn sentence() -> Sentence {
    Sentence {
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
    }
}

pub fn create_test_tree() -> Tree {
    Tree::from_sentence(&sentence())
}

/// Same sentence, but "adults" attaches to nothing, leaving a two-root forest
pub fn create_test_forest() -> Tree {
    let mut s = sentence();
    s.dep_parents[6] = 0;
    Tree::from_sentence(&s)
}
