//! End-to-end scenarios across the whole stack: grammars with
//! precedence, ambiguity, mid-parse extension, nullable symbols, and the
//! host language.

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use graft::{char_matcher, graft, keep, skip, Error, Grammar, ParseValue, Parser};
use graft::lang::Loader;

#[derive(Clone, Debug, PartialEq)]
enum Val {
    Ch(char),
    Str(String),
    Num(f64),
    Seq(Vec<Val>),
}

impl ParseValue for Val {
    fn sequence(values: Vec<Val>) -> Val {
        Val::Seq(values)
    }
}

impl From<char> for Val {
    fn from(character: char) -> Val {
        Val::Ch(character)
    }
}

fn text(value: &Val) -> String {
    match value {
        Val::Ch(c) => c.to_string(),
        Val::Str(s) => s.clone(),
        Val::Num(n) => n.to_string(),
        Val::Seq(values) => values.iter().map(text).collect(),
    }
}

fn num(value: &Val) -> f64 {
    match value {
        Val::Num(n) => *n,
        other => panic!("expected a number, got {:?}", other),
    }
}

fn results(grammar: &Grammar<Val>, input: &str) -> Result<Vec<Val>, Error<Val>> {
    Parser::with_matcher(grammar, char_matcher())
        .parse(input.chars())
        .collect()
}

/// `expr ::= expr + mul | mul`, `mul ::= mul * atom | mul / atom | atom`,
/// `atom ::= digit | ( expr )`, evaluated as floats.
fn arithmetic_evaluator() -> Grammar<Val> {
    let mut g: Grammar<Val> = Grammar::new()
        .put_with("__start__", [keep("expr")], |mut values| {
            values.pop().expect("one result")
        })
        .put_with("expr", [keep("add")], |mut values| {
            values.pop().expect("one result")
        })
        .put_with("add", [keep("add"), skip("+"), keep("mul")], |values| {
            Val::Num(num(&values[0]) + num(&values[1]))
        })
        .put_with("add", [keep("add"), skip("-"), keep("mul")], |values| {
            Val::Num(num(&values[0]) - num(&values[1]))
        })
        .put_with("add", [keep("mul")], |mut values| {
            values.pop().expect("one result")
        })
        .put_with("mul", [keep("mul"), skip("*"), keep("atom")], |values| {
            Val::Num(num(&values[0]) * num(&values[1]))
        })
        .put_with("mul", [keep("mul"), skip("/"), keep("atom")], |values| {
            Val::Num(num(&values[0]) / num(&values[1]))
        })
        .put_with("mul", [keep("atom")], |mut values| {
            values.pop().expect("one result")
        })
        .put_with("atom", [skip("("), keep("expr"), skip(")")], |mut values| {
            values.pop().expect("one result")
        })
        .put_with("atom", [keep("digit")], |mut values| {
            values.pop().expect("one result")
        });
    for c in '0'..='9' {
        g = g.put_with("digit", [keep(c)], move |_| {
            Val::Num(c.to_digit(10).expect("a digit") as f64)
        });
    }
    g
}

/// The same shape, formatting S-expressions instead of evaluating.
fn arithmetic_formatter() -> Grammar<Val> {
    let mut g: Grammar<Val> = Grammar::new()
        .put_with("__start__", [keep("expr")], |mut values| {
            values.pop().expect("one result")
        })
        .put_with("expr", [keep("add")], |mut values| {
            values.pop().expect("one result")
        })
        .put_with("add", [keep("add"), skip("+"), keep("mul")], |values| {
            Val::Str(format!("(+ {} {})", text(&values[0]), text(&values[1])))
        })
        .put_with("add", [keep("mul")], |mut values| {
            values.pop().expect("one result")
        })
        .put_with("mul", [keep("mul"), skip("*"), keep("atom")], |values| {
            Val::Str(format!("(* {} {})", text(&values[0]), text(&values[1])))
        })
        .put_with("mul", [keep("mul"), skip("/"), keep("atom")], |values| {
            Val::Str(format!("(/ {} {})", text(&values[0]), text(&values[1])))
        })
        .put_with("mul", [keep("atom")], |mut values| {
            values.pop().expect("one result")
        })
        .put_with("atom", [skip("("), keep("expr"), skip(")")], |mut values| {
            values.pop().expect("one result")
        })
        .put_with("atom", [keep("digit")], |mut values| {
            values.pop().expect("one result")
        });
    for c in '0'..='9' {
        g = g.put_with("digit", [keep(c)], move |_| Val::Str(c.to_string()));
    }
    g
}

#[test]
fn s1_arithmetic_with_precedence() {
    assert_eq!(
        results(&arithmetic_evaluator(), "3*(1/2)").expect("parse succeeds"),
        [Val::Num(1.5)]
    );
    assert_eq!(
        results(&arithmetic_formatter(), "3*(1/2)").expect("parse succeeds"),
        [Val::Str("(* 3 (/ 1 2))".to_string())]
    );
}

/// `S ::= S + S | a`, with folds that keep the bracketing visible.
fn ambiguous_sums() -> Grammar<Val> {
    Grammar::new()
        .put_with("__start__", [keep("S")], |mut values| {
            values.pop().expect("one result")
        })
        .put_with("S", [keep("S"), skip("+"), keep("S")], |values| {
            Val::Str(format!("({} + {})", text(&values[0]), text(&values[1])))
        })
        .put_with("S", [keep("a")], |_| Val::Str("a".to_string()))
}

#[test]
fn s2_ambiguity_yields_all_bracketings() {
    let outcome = results(&ambiguous_sums(), "a+a+a+a").expect("parse succeeds");
    assert_eq!(outcome.len(), 5);
    let mut bracketings: Vec<String> = outcome.iter().map(text).collect();
    bracketings.sort();
    bracketings.dedup();
    assert_eq!(bracketings.len(), 5, "all five bracketings are distinct");
}

#[test]
fn s2_ambiguity_can_be_rejected() {
    let outcome: Vec<_> = Parser::with_matcher(&ambiguous_sums(), char_matcher())
        .allow_ambiguous(false)
        .parse("a+a+a+a".chars())
        .collect();
    match outcome.as_slice() {
        [Err(Error::Ambiguous { candidates })] => assert_eq!(candidates.len(), 5),
        other => panic!("expected one ambiguity error, got {:?}", other),
    }
}

/// `action ::= ! char`, where the graft after `char` makes the defined
/// character itself a legal action.
fn self_extending_actions() -> Grammar<Val> {
    let mut g: Grammar<Val> = Grammar::new()
        .put("__start__", [keep("actions"), skip(".")])
        .put("actions", [])
        .put("actions", [keep("action"), keep("actions")])
        .put("action", [keep("define")])
        .put_with(
            "define",
            [
                skip("!"),
                keep("char"),
                graft(|grammar, values| {
                    let defined = text(&values[0]);
                    grammar.put("action", [keep(defined.as_str())])
                }),
            ],
            |values| Val::Str(format!("!{}", text(&values[0]))),
        );
    for c in 'a'..='z' {
        g = g.put("char", [keep(c)]);
    }
    g
}

#[test]
fn s3_grafted_rules_apply_to_later_input() {
    let grammar = self_extending_actions();
    assert!(results(&grammar, "!aaa!bbababa.").is_ok());

    // A character is only an action after its definition.
    match results(&grammar, "!ab.") {
        Err(Error::Parse { position, .. }) => assert_eq!(position, 2),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn s4_nullable_symbols_complete_invisibly() {
    let grammar: Grammar<Val> = Grammar::new()
        .put_with("__start__", [keep("A")], |mut values| {
            values.pop().expect("one result")
        })
        .put_with("A", [keep("B"), keep("C")], |values| {
            Val::Str(format!("A({}, {})", text(&values[0]), text(&values[1])))
        })
        .put_with("B", [], |_| Val::Str("B()".to_string()))
        .put_with("C", [keep("x")], |values| {
            Val::Str(format!("C({})", text(&values[0])))
        });

    assert_eq!(
        results(&grammar, "x").expect("parse succeeds"),
        [Val::Str("A(B(), C(x))".to_string())]
    );
}

fn run_program(source: &str) -> String {
    let dir = tempfile::tempdir().expect("temporary directory");
    let path = dir.path().join("main").to_string_lossy().into_owned();
    fs::write(format!("{}.graft", path), source).expect("source written");
    let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
    let loader = Loader::with_output(buffer.clone());
    loader.load(&path).expect("program runs");
    let output = String::from_utf8(buffer.borrow().clone()).expect("utf-8 output");
    output
}

#[test]
fn s5_the_host_language_executes() {
    assert_eq!(run_program("var x; x = 2; print(x*x);"), "4\n");
}

#[test]
fn s6_macro_definitions_extend_the_language() {
    let source = "
        macro dbl -> 'd', 'b', 'l', expression { return expression * 2; }
        var x;
        x = dbl 3;
        print(x);
    ";
    assert_eq!(run_program(source), "6\n");

    // Without the macro line, the same use cannot parse.
    let dir = tempfile::tempdir().expect("temporary directory");
    let path = dir.path().join("main").to_string_lossy().into_owned();
    fs::write(format!("{}.graft", path), "var x; x = dbl 3; print(x);")
        .expect("source written");
    assert!(Loader::new().load(&path).is_err());
}
