use lrkit::{
    automaton::{Dfa, MultiAcceptNfa},
    regex::Regex,
    SymbolTable,
};
use proptest::prelude::*;

fn pattern() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        "[abc]",
        Just("[ab]".to_owned()),
        Just("[^a]".to_owned()),
        Just(".".to_owned()),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{}{}", l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("({}|{})", l, r)),
            inner.clone().prop_map(|r| format!("({})*", r)),
            inner.clone().prop_map(|r| format!("({})+", r)),
            inner.prop_map(|r| format!("({})?", r)),
        ]
    })
}

fn compile(pattern: &str) -> Dfa {
    let mut symbols = SymbolTable::new();
    let nfa = Regex::parse(pattern).unwrap().to_nfa();
    let mut rules = MultiAcceptNfa::new();
    rules.add_rule(symbols.intern("R"), &nfa);
    rules.to_dfa()
}

proptest! {
    #[test]
    fn dfa_agrees_with_regex_crate(pattern in pattern(), input in "[abc]{1,8}") {
        let dfa = compile(&pattern);
        let reference = regex::Regex::new(&format!("(?s)^(?:{})$", pattern)).unwrap();
        prop_assert_eq!(dfa.matches(&input).is_some(), reference.is_match(&input));
    }

    #[test]
    fn dfa_agrees_with_nfa(pattern in pattern(), input in "[abc]{1,8}") {
        let nfa = Regex::parse(&pattern).unwrap().to_nfa();
        let dfa = compile(&pattern);
        prop_assert_eq!(dfa.matches(&input).is_some(), nfa.matches(&input));
    }

    #[test]
    fn empty_input_never_matches(pattern in pattern()) {
        prop_assert!(compile(&pattern).matches("").is_none());
    }
}
