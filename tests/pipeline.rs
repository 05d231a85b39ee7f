//! End-to-end pipeline tests: author a grammar through the public API, run
//! edit-rule generation, compile, and detect ambiguity, the same sequence a
//! real caller would drive.

use nlqa_grammar::{
    build_verb_set, edit_rules, AmbiguityConfig, CollectingSink, DiagnosticSink,
    GrammarBuilder, NonterminalRuleSpec, Rhs, TerminalRuleSpec, Text, VerbDescriptor,
};

#[test]
fn verb_set_survives_edit_rule_generation_and_compiles() {
    let mut builder = GrammarBuilder::new();
    let start = builder.new_symbol(&["start"]).unwrap();
    builder.set_start_symbol(start);

    let subject = builder.new_symbol(&["subject"]).unwrap();
    builder
        .add_terminal_rule(subject, TerminalRuleSpec { text: Some(Text::Literal("she".into())), ..Default::default() })
        .unwrap();

    let like = build_verb_set(
        &mut builder,
        &["verb", "like"],
        &VerbDescriptor {
            one_sg: "like".into(),
            three_sg: "likes".into(),
            pl: "like".into(),
            past: Some("liked".into()),
            ..Default::default()
        },
        None,
    )
    .unwrap();

    builder
        .add_nonterminal_rule(start, NonterminalRuleSpec { rhs: vec![subject, like], ..Default::default() })
        .unwrap();

    edit_rules::generate(&mut builder);
    let grammar = builder.compile().unwrap();

    // 3 distinct surface forms, all reachable as terminal rules.
    assert_eq!(grammar.authored_rules(like).count(), 3);
    assert_eq!(grammar.authored_rules(start).count(), 1);
}

#[test]
fn ambiguous_grammar_is_flagged_through_collecting_sink() {
    let mut builder = GrammarBuilder::new();
    let s = builder.new_symbol(&["S"]).unwrap();
    builder.set_start_symbol(s);
    let a = builder.new_symbol(&["A"]).unwrap();
    let b = builder.new_symbol(&["B"]).unwrap();
    builder
        .add_terminal_rule(a, TerminalRuleSpec { text: Some(Text::Literal("fruit".into())), ..Default::default() })
        .unwrap();
    builder
        .add_terminal_rule(b, TerminalRuleSpec { text: Some(Text::Literal("fruit".into())), ..Default::default() })
        .unwrap();
    builder.add_nonterminal_rule(s, NonterminalRuleSpec { rhs: vec![a], ..Default::default() }).unwrap();
    builder.add_nonterminal_rule(s, NonterminalRuleSpec { rhs: vec![b], ..Default::default() }).unwrap();

    edit_rules::generate(&mut builder);
    let grammar = builder.compile().unwrap();

    let findings = nlqa_grammar::ambiguity::detect(&grammar, &AmbiguityConfig::default()).unwrap();
    assert_eq!(findings.len(), 1);

    let mut sink = CollectingSink::new();
    for finding in findings {
        sink.report(nlqa_grammar::Diagnostic::Ambiguity(finding));
    }
    assert_eq!(sink.ambiguities().count(), 1);
}

#[test]
fn deletable_stop_word_becomes_free_insertion() {
    let mut builder = GrammarBuilder::new();
    let start = builder.new_symbol(&["start"]).unwrap();
    builder.set_start_symbol(start);

    let the = builder.new_symbol(&["det", "the"]).unwrap();
    builder
        .add_terminal_rule(the, TerminalRuleSpec { text: Some(Text::Literal("the".into())), ..Default::default() })
        .unwrap();
    builder.add_deletable("the");

    let noun = builder.new_symbol(&["noun", "cat"]).unwrap();
    builder
        .add_terminal_rule(noun, TerminalRuleSpec { text: Some(Text::Literal("cat".into())), ..Default::default() })
        .unwrap();

    builder
        .add_nonterminal_rule(start, NonterminalRuleSpec { rhs: vec![the, noun], ..Default::default() })
        .unwrap();

    edit_rules::generate(&mut builder);
    let grammar = builder.compile().unwrap();

    let insertion_rule = grammar
        .rules(start)
        .iter()
        .find(|r| matches!(r.rhs, Rhs::Unary(s) if s == noun) && r.insertion_idx == Some(0))
        .expect("expected `the` to be elidable for free via the deletables set");
    assert_eq!(insertion_rule.cost, grammar.rules(start)[0].cost);
}
