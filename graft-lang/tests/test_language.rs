use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use graft_earley::Error;
use graft_lang::{EvalError, LoadError, Loader};

/// Writes each `(name, source)` module into a fresh directory, loads
/// `main`, and returns everything `print` wrote.
fn run_modules(modules: &[(&str, &str)]) -> Result<String, LoadError> {
    let dir = tempfile::tempdir().expect("temporary directory");
    for (name, source) in modules {
        fs::write(dir.path().join(format!("{}.graft", name)), source)
            .expect("module source written");
    }
    let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
    let loader = Loader::with_output(buffer.clone());
    let path = dir.path().join("main").to_string_lossy().into_owned();
    loader.load(&path)?;
    Ok(String::from_utf8(buffer.borrow().clone()).expect("utf-8 output"))
}

fn run_program(source: &str) -> Result<String, LoadError> {
    run_modules(&[("main", source)])
}

fn eval_error(result: Result<String, LoadError>) -> EvalError {
    match result {
        Err(LoadError::Eval { source, .. }) => source,
        other => panic!("expected an evaluation error, got {:?}", other.map_err(|e| e.to_string())),
    }
}

#[test]
fn prints_a_computed_square() {
    let output = run_program("var x; x = 2; print(x*x);").expect("program runs");
    assert_eq!(output, "4\n");
}

#[test]
fn arithmetic_has_the_usual_precedence() {
    let output = run_program("print(2 + 3 * 4); print((2 + 3) * 4); print(10 / 4 - 1);")
        .expect("program runs");
    assert_eq!(output, "14\n20\n1.5\n");
}

#[test]
fn unary_minus_binds_tighter_than_multiplication() {
    let output = run_program("print(-2 * 3); print(2 - -3);").expect("program runs");
    assert_eq!(output, "-6\n5\n");
}

#[test]
fn comments_and_whitespace_are_skipped() {
    let output =
        run_program("# leading note\nvar x;\n\n  x = 7; # trailing note\nprint(x);\n")
            .expect("program runs");
    assert_eq!(output, "7\n");
}

#[test]
fn string_escapes_are_decoded() {
    let output = run_program("print('a\\tb\\\\c\\'d\\n');").expect("program runs");
    assert_eq!(output, "a\tb\\c'd\n\n");
}

#[test]
fn string_concatenation_and_comparison() {
    let output =
        run_program("print('ab' + 'cd'); if 'a' < 'b' { print(1); }").expect("program runs");
    assert_eq!(output, "abcd\n1\n");
}

#[test]
fn if_without_else_is_allowed() {
    let output = run_program("if 1 > 2 { print(1); } print(2);").expect("program runs");
    assert_eq!(output, "2\n");
}

#[test]
fn forever_continue_break() {
    let source = "
        var n;
        n = 0;
        forever {
            n = n + 1;
            if n < 3 { continue; }
            break;
        }
        print(n);
    ";
    assert_eq!(run_program(source).expect("program runs"), "3\n");
}

#[test]
fn functions_close_over_their_definition_site() {
    let source = "
        var make;
        make = (n) => { return (m) => { return n + m; }; };
        var add_two;
        add_two = make(2);
        print(add_two(40));
    ";
    assert_eq!(run_program(source).expect("program runs"), "42\n");
}

#[test]
fn function_fallthrough_yields_none() {
    let source = "
        var noop;
        noop = () => {};
        print(noop());
    ";
    assert_eq!(run_program(source).expect("program runs"), "none\n");
}

#[test]
fn objects_hold_attributes() {
    let source = "
        var o;
        o = object();
        o.size = 3;
        o.size = o.size + 1;
        print(o.size);
    ";
    assert_eq!(run_program(source).expect("program runs"), "4\n");
}

#[test]
fn assignment_to_undeclared_fails() {
    assert_eq!(
        eval_error(run_program("x = 1;")),
        EvalError::AssignmentToUndeclared("x".to_string())
    );
}

#[test]
fn reading_an_undeclared_name_fails() {
    assert_eq!(
        eval_error(run_program("print(y);")),
        EvalError::UndeclaredVariable("y".to_string())
    );
}

#[test]
fn reading_a_declared_but_unassigned_name_fails() {
    assert_eq!(
        eval_error(run_program("var z; print(z);")),
        EvalError::UnassignedVariable("z".to_string())
    );
}

#[test]
fn blocks_do_not_leak_declarations() {
    assert_eq!(
        eval_error(run_program("{ var inner; inner = 1; } print(inner);")),
        EvalError::UndeclaredVariable("inner".to_string())
    );
}

#[test]
fn loop_control_at_the_top_level_fails() {
    assert_eq!(
        eval_error(run_program("break;")),
        EvalError::UncaughtLoopControl("break")
    );
    assert_eq!(
        eval_error(run_program("continue;")),
        EvalError::UncaughtLoopControl("continue")
    );
}

#[test]
fn return_at_the_top_level_fails() {
    assert_eq!(
        eval_error(run_program("return 1;")),
        EvalError::ReturnOutsideFunction
    );
}

#[test]
fn arity_mismatches_fail() {
    assert_eq!(
        eval_error(run_program("var f; f = (a, b) => { return a; }; f(1);")),
        EvalError::ArityMismatch {
            expected: 2,
            found: 1
        }
    );
}

#[test]
fn a_macro_extends_the_grammar_for_the_rest_of_the_module() {
    let source = "
        macro dbl -> 'd', 'b', 'l', expression { return expression * 2; }
        var x;
        x = dbl 3;
        print(x);
    ";
    assert_eq!(run_program(source).expect("program runs"), "6\n");
}

#[test]
fn the_same_use_fails_to_parse_without_the_macro() {
    let result = run_program("var x; x = dbl 3; print(x);");
    assert!(matches!(result, Err(LoadError::Parse { .. })));
}

#[test]
fn unmacro_retracts_the_production() {
    let working = "
        macro yell -> expression { return expression * 10; }
        var a;
        a = yell 2;
        print(a);
        unmacro yell -> expression;
    ";
    assert_eq!(run_program(working).expect("program runs"), "20\n");

    let broken = "
        macro yell -> expression { return expression * 10; }
        unmacro yell -> expression;
        var a;
        a = yell 2;
    ";
    assert!(matches!(run_program(broken), Err(LoadError::Parse { .. })));
}

#[test]
fn imports_bring_in_exported_variables() {
    let output = run_modules(&[
        ("main", "import 'lib'; print(shared + 2);"),
        ("lib", "export var shared; shared = 40; print('lib loaded');"),
    ])
    .expect("program runs");
    assert_eq!(output, "lib loaded\n42\n");
}

#[test]
fn modules_execute_at_most_once() {
    let output = run_modules(&[
        ("main", "import 'lib'; import 'lib'; print(shared);"),
        ("lib", "export var shared; shared = 1; print('once');"),
    ])
    .expect("program runs");
    assert_eq!(output, "once\n1\n");
}

#[test]
fn exported_macros_patch_the_importing_parse() {
    let output = run_modules(&[
        ("main", "import 'lib'; var x; x = twice 21; print(x);"),
        ("lib", "export macro twice -> expression { return expression * 2; }"),
    ])
    .expect("program runs");
    assert_eq!(output, "42\n");
}

#[test]
fn unexported_macros_stay_private() {
    let result = run_modules(&[
        ("main", "import 'lib'; var x; x = twice 21;"),
        ("lib", "macro twice -> expression { return expression * 2; }"),
    ]);
    assert!(matches!(result, Err(LoadError::Parse { .. })));
}

#[test]
fn circular_imports_are_reported() {
    let result = run_modules(&[
        ("main", "import 'main';"),
    ]);
    match result {
        Err(LoadError::Eval { source: EvalError::Import(message), .. }) => {
            assert!(message.contains("circular"), "unexpected message: {}", message);
        }
        other => panic!(
            "expected a circular import error, got {:?}",
            other.map_err(|e| e.to_string())
        ),
    }
}

#[test]
fn parse_errors_name_the_file() {
    let result = run_program("var ;");
    match result {
        Err(LoadError::Parse { path, source: Error::Parse { .. } }) => {
            assert!(path.to_string_lossy().ends_with("main.graft"));
        }
        other => panic!(
            "expected a parse error, got {:?}",
            other.map_err(|e| e.to_string())
        ),
    }
}

#[test]
fn the_ast_cache_is_reused_until_sources_change() {
    let dir = tempfile::tempdir().expect("temporary directory");
    let path = dir.path().join("main").to_string_lossy().into_owned();
    fs::write(format!("{}.graft", path), "var x; x = 1; print(x);").expect("source written");

    let (_, changed) = Loader::new().read(&path).expect("first read");
    assert!(changed, "first read parses");

    let (_, changed) = Loader::new().read(&path).expect("cached read");
    assert!(!changed, "second read comes from the cache");

    fs::write(format!("{}.graft", path), "var x; x = 2; print(x);").expect("source rewritten");
    let (_, changed) = Loader::new().read(&path).expect("read after edit");
    assert!(changed, "an edited source re-parses");
}

#[test]
fn a_corrupt_cache_degrades_to_a_parse() {
    let dir = tempfile::tempdir().expect("temporary directory");
    let path = dir.path().join("main").to_string_lossy().into_owned();
    fs::write(format!("{}.graft", path), "print(5);").expect("source written");

    Loader::new().read(&path).expect("first read");
    fs::write(format!("{}.graftc", path), b"not a cache blob").expect("cache clobbered");

    let output = {
        let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
        let loader = Loader::with_output(buffer.clone());
        loader.load(&path).expect("program runs");
        String::from_utf8(buffer.borrow().clone()).expect("utf-8 output")
    };
    assert_eq!(output, "5\n");
}

#[test]
fn an_edited_import_invalidates_the_cache() {
    let dir = tempfile::tempdir().expect("temporary directory");
    let main = dir.path().join("main").to_string_lossy().into_owned();
    let lib = dir.path().join("lib").to_string_lossy().into_owned();
    fs::write(format!("{}.graft", main), "import 'lib'; print(shared);").expect("main written");
    fs::write(format!("{}.graft", lib), "export var shared; shared = 1;").expect("lib written");

    Loader::new().read(&main).expect("first read");
    let (_, changed) = Loader::new().read(&main).expect("cached read");
    assert!(!changed, "nothing changed yet");

    fs::write(format!("{}.graft", lib), "export var shared; shared = 2;").expect("lib rewritten");
    let (_, changed) = Loader::new().read(&main).expect("read after edit");
    assert!(changed, "a changed import re-parses the importer");
}
