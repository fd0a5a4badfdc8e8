//! The hard-coded grammar of the host language.
//!
//! Every terminal is a single character; identifiers, numbers and
//! strings are character-level non-terminals assembled by folds.
//! Whitespace (including `#` line comments) is a nullable non-terminal
//! consumed between any two lexical tokens. The `macro`, `unmacro` and
//! `import` statements carry mid-rule grafts, so the productions they
//! introduce are already in force for the statements that follow them in
//! the same module.

use std::rc::Rc;

use log::warn;

use graft_earley::START;
use graft_grammar::{graft, keep, skip, BodyElement, Grammar};
use graft_symbol::Symbol;

use crate::ast::{BinaryOp, MacroParameter, Node, UnaryOp};
use crate::loader::Loader;
use crate::value::Value;

type Body = Vec<BodyElement<Value>>;

/// A selected symbol.
fn k(symbol: &str) -> Body {
    vec![keep(symbol)]
}

/// A suppressed symbol.
fn s(symbol: &str) -> Body {
    vec![skip(symbol)]
}

/// A graft at the current slot.
fn t(transform: impl Fn(&Grammar<Value>, &[Value]) -> Grammar<Value> + 'static) -> Body {
    vec![graft(transform)]
}

/// Optional whitespace followed by the characters of a keyword or sign,
/// all suppressed.
fn kw(word: &str) -> Body {
    let mut elements: Body = vec![skip("whitespace")];
    elements.extend(word.chars().map(|character| skip(character)));
    elements
}

fn body<const N: usize>(parts: [Body; N]) -> Body {
    parts.into_iter().flatten().collect()
}

/// The fold for forwarding rules with exactly one selected position.
fn solo(mut values: Vec<Value>) -> Value {
    values.pop().expect("exactly one selected value")
}

fn node(node: Node) -> Value {
    Value::node(node)
}

fn empty(_values: Vec<Value>) -> Value {
    Value::Tuple(Vec::new().into())
}

/// `[x]` from one selected value.
fn single(mut values: Vec<Value>) -> Value {
    let first = values.pop().expect("one selected value");
    Value::Tuple(vec![first].into())
}

/// `[first] + rest` from two selected values, the second a tuple.
fn cons(mut values: Vec<Value>) -> Value {
    let rest = values.pop().expect("a rest tuple").into_tuple();
    let first = values.pop().expect("a first value");
    let mut items = Vec::with_capacity(rest.len() + 1);
    items.push(first);
    items.extend(rest.iter().cloned());
    Value::Tuple(items.into())
}

fn cons_node(first: Node, rest: Rc<[Value]>) -> Value {
    let mut items = Vec::with_capacity(rest.len() + 1);
    items.push(node(first));
    items.extend(rest.iter().cloned());
    Value::Tuple(items.into())
}

/// The concatenated text of all selected values.
fn text(values: Vec<Value>) -> String {
    values.iter().map(Value::text).collect()
}

fn nodes_of(value: Value) -> Vec<Node> {
    value
        .into_tuple()
        .iter()
        .map(|value| value.clone().into_node().as_ref().clone())
        .collect()
}

fn params_of(value: Value) -> Vec<MacroParameter> {
    value
        .into_tuple()
        .iter()
        .map(|value| value.clone().into_param().as_ref().clone())
        .collect()
}

fn strings_of(value: Value) -> Vec<String> {
    value.into_tuple().iter().map(Value::text).collect()
}

fn binary_fold(op: BinaryOp) -> impl Fn(Vec<Value>) -> Value {
    move |mut values| {
        let right = values.pop().expect("a right operand").into_node();
        let left = values.pop().expect("a left operand").into_node();
        node(Node::BinaryOperation {
            op,
            left: Box::new(left.as_ref().clone()),
            right: Box::new(right.as_ref().clone()),
        })
    }
}

fn unary_fold(op: UnaryOp) -> impl Fn(Vec<Value>) -> Value {
    move |mut values| {
        let operand = values.pop().expect("an operand").into_node();
        node(Node::UnaryOperation {
            op,
            operand: Box::new(operand.as_ref().clone()),
        })
    }
}

/// What a macro captures for a named parameter: usually a syntax node,
/// but lexical non-terminals hand over plain strings and numbers.
fn syntax_child(value: Value) -> Node {
    match value {
        Value::Node(child) => child.as_ref().clone(),
        Value::Str(text) => Node::StringLiteral(text.to_string()),
        Value::Number(number) => Node::NumberLiteral(number),
        other => panic!("a macro parameter captured {}", other.type_name()),
    }
}

/// The body symbols a macro's parameter list expands to.
fn macro_body_symbols(parameters: &[MacroParameter]) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    for parameter in parameters {
        match parameter {
            MacroParameter::Terminal(parts) => {
                symbols.extend(parts.iter().map(Symbol::from));
            }
            MacroParameter::Nonterminal { symbol, .. } => symbols.push(Symbol::from(symbol)),
        }
    }
    symbols
}

/// Grafts the rule that parses uses of a macro: terminal parameters and
/// unnamed non-terminals are suppressed, named non-terminals are
/// selected and handed to the use's definition at run time.
///
/// A head the grammar has never seen also gets a bridging
/// `primary_expression` rule, so uses are reachable from expressions;
/// a head naming an existing non-terminal is extended in place.
pub fn add_macro_use_rule(
    grammar: &Grammar<Value>,
    head: &str,
    parameters: &[MacroParameter],
) -> Grammar<Value> {
    let mut elements: Body = Vec::new();
    for parameter in parameters {
        match parameter {
            MacroParameter::Terminal(parts) => {
                for part in parts {
                    elements.push(skip(part.as_str()));
                }
            }
            MacroParameter::Nonterminal { symbol, name } => {
                if name.is_some() {
                    elements.push(keep(symbol.as_str()));
                } else {
                    elements.push(skip(symbol.as_str()));
                }
            }
        }
    }
    let fresh = grammar.is_terminal(&Symbol::new(head));
    let fold_head = head.to_string();
    let fold_parameters = parameters.to_vec();
    let mut extended = grammar.put_with(head, elements, move |values| {
        let children = values.into_iter().map(syntax_child).collect();
        node(Node::MacroUse {
            head: fold_head.clone(),
            parameters: fold_parameters.clone(),
            children,
        })
    });
    if fresh {
        extended = extended.put_with(
            "primary_expression",
            body([s("whitespace"), k(head)]),
            solo,
        );
    }
    extended
}

/// Drops a macro's use rule; the bridging rule goes with the head's last
/// alternative.
pub fn drop_macro_use_rule(
    grammar: &Grammar<Value>,
    head: &str,
    parameters: &[MacroParameter],
) -> Grammar<Value> {
    let symbols = macro_body_symbols(parameters);
    let shrunk = grammar.drop_rule(head, &symbols);
    if shrunk.is_terminal(&Symbol::new(head)) {
        shrunk.drop_rule(
            "primary_expression",
            &[Symbol::new("whitespace"), Symbol::new(head)],
        )
    } else {
        shrunk
    }
}

const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";
const WHITESPACE_WITHOUT_NEWLINE: &str = " \t\r\x0b\x0c";

/// Builds the core grammar. The loader is captured weakly by the
/// `import` graft, which patches the grammar with the exported macros of
/// the imported module while the importing module is still being parsed.
pub fn core_grammar(loader: &Loader) -> Grammar<Value> {
    let mut g: Grammar<Value> = Grammar::new();

    g = g.put_with(START, body([k("statement_sequence"), s("whitespace")]), solo);

    // statement sequence
    g = g.put_with("statement_sequence", k("statements"), |mut values| {
        let statements = nodes_of(values.pop().expect("a statement tuple"));
        node(Node::StatementSequence(statements))
    });

    g = g.put_with("statements", [], empty);
    g = g.put_with("statements", body([k("statement"), k("statements")]), cons);

    // call statement
    g = g.put_with("statement", body([k("call"), kw(";")]), solo);

    // export
    g = g.put_with("export", [], |_| Value::Bool(false));
    g = g.put_with("export", kw("export"), |_| Value::Bool(true));

    // import
    let weak = loader.downgrade();
    g = g.put_with(
        "statements",
        body([
            k("export"),
            kw("import"),
            k("string"),
            kw(";"),
            t(move |grammar, values| {
                let path = values[1].text();
                let Some(shared) = weak.upgrade() else {
                    return grammar.clone();
                };
                match Loader::from_shared(shared).grammar_patch(&path, grammar) {
                    Ok(patched) => patched,
                    Err(error) => {
                        warn!("grammar patch for import {:?} failed: {}", path, error);
                        grammar.clone()
                    }
                }
            }),
            k("statements"),
        ]),
        |mut values| {
            let rest = values.pop().expect("a rest tuple").into_tuple();
            let path = values.pop().expect("a module path").text();
            let exported = values.pop().expect("an export flag").into_bool();
            cons_node(Node::Import { exported, path }, rest)
        },
    );

    // variable declaration
    g = g.put_with(
        "statement",
        body([k("export"), kw("var"), k("identifier"), kw(";")]),
        |mut values| {
            let name = values.pop().expect("a variable name").text();
            let exported = values.pop().expect("an export flag").into_bool();
            node(Node::VariableDeclaration { exported, name })
        },
    );

    // macro definition
    g = g.put_with(
        "statements",
        body([
            k("export"),
            kw("macro"),
            k("identifier"),
            kw("->"),
            k("macro_parameters"),
            kw("{"),
            k("statement_sequence"),
            kw("}"),
            t(|grammar, values| {
                let head = values[1].text();
                let parameters = params_of(values[2].clone());
                add_macro_use_rule(grammar, &head, &parameters)
            }),
            k("statements"),
        ]),
        |mut values| {
            let rest = values.pop().expect("a rest tuple").into_tuple();
            let transform_body = values.pop().expect("a macro body").into_node();
            let parameters = params_of(values.pop().expect("a parameter tuple"));
            let head = values.pop().expect("a macro head").text();
            let exported = values.pop().expect("an export flag").into_bool();
            let mut transform_parameters = vec!["__usage_context__".to_string()];
            for parameter in &parameters {
                if let MacroParameter::Nonterminal {
                    name: Some(name), ..
                } = parameter
                {
                    transform_parameters.push(name.clone());
                }
            }
            let definition = Node::FunctionLiteral {
                parameters: transform_parameters,
                body: Box::new(transform_body.as_ref().clone()),
            };
            cons_node(
                Node::MacroDefinition {
                    exported,
                    head,
                    parameters,
                    definition: Box::new(definition),
                },
                rest,
            )
        },
    );

    g = g.put_with("macro_parameters", [], empty);
    g = g.put_with("macro_parameters", k("macro_parameter"), single);
    g = g.put_with(
        "macro_parameters",
        body([k("macro_parameter"), kw(","), k("macro_parameters")]),
        cons,
    );

    g = g.put_with("macro_parameter", k("string"), |mut values| {
        let literal = values.pop().expect("a literal").text();
        let parts = literal.chars().map(|c| c.to_string()).collect();
        Value::Param(Rc::new(MacroParameter::Terminal(parts)))
    });
    // A bare non-terminal is named after itself.
    g = g.put_with("macro_parameter", k("identifier"), |mut values| {
        let symbol = values.pop().expect("a symbol").text();
        Value::Param(Rc::new(MacroParameter::Nonterminal {
            name: Some(symbol.clone()),
            symbol,
        }))
    });
    g = g.put_with(
        "macro_parameter",
        body([k("identifier"), kw("/"), k("identifier")]),
        |mut values| {
            let name = values.pop().expect("a parameter name").text();
            let symbol = values.pop().expect("a symbol").text();
            Value::Param(Rc::new(MacroParameter::Nonterminal {
                symbol,
                name: Some(name),
            }))
        },
    );

    // unmacro
    g = g.put_with(
        "statements",
        body([
            k("export"),
            kw("unmacro"),
            k("identifier"),
            kw("->"),
            k("unmacro_parameters"),
            kw(";"),
            t(|grammar, values| {
                let head = values[1].text();
                let parameters = params_of(values[2].clone());
                drop_macro_use_rule(grammar, &head, &parameters)
            }),
            k("statements"),
        ]),
        |mut values| {
            let rest = values.pop().expect("a rest tuple").into_tuple();
            let parameters = params_of(values.pop().expect("a parameter tuple"));
            let head = values.pop().expect("a macro head").text();
            let exported = values.pop().expect("an export flag").into_bool();
            cons_node(
                Node::MacroUndefinition {
                    exported,
                    head,
                    parameters,
                },
                rest,
            )
        },
    );

    g = g.put_with("unmacro_parameters", [], empty);
    g = g.put_with("unmacro_parameters", k("unmacro_parameter"), single);
    g = g.put_with(
        "unmacro_parameters",
        body([k("unmacro_parameter"), kw(","), k("unmacro_parameters")]),
        cons,
    );

    g = g.put_with("unmacro_parameter", k("string"), |mut values| {
        let literal = values.pop().expect("a literal").text();
        let parts = literal.chars().map(|c| c.to_string()).collect();
        Value::Param(Rc::new(MacroParameter::Terminal(parts)))
    });
    g = g.put_with("unmacro_parameter", k("identifier"), |mut values| {
        let symbol = values.pop().expect("a symbol").text();
        Value::Param(Rc::new(MacroParameter::Nonterminal { symbol, name: None }))
    });

    // block
    g = g.put_with("statement", k("block"), solo);
    g = g.put_with(
        "block",
        body([kw("{"), k("statement_sequence"), kw("}")]),
        |mut values| {
            let sequence = values.pop().expect("a statement sequence").into_node();
            node(Node::Block(Box::new(sequence.as_ref().clone())))
        },
    );

    // if
    g = g.put_with("statement", k("if"), solo);
    g = g.put_with(
        "if",
        body([kw("if"), k("expression"), k("block"), k("if_else")]),
        |mut values| {
            let false_clause = values.pop().expect("an else clause").into_node();
            let true_clause = values.pop().expect("a then block").into_node();
            let condition = values.pop().expect("a condition").into_node();
            node(Node::If {
                condition: Box::new(condition.as_ref().clone()),
                true_clause: Box::new(true_clause.as_ref().clone()),
                false_clause: Box::new(false_clause.as_ref().clone()),
            })
        },
    );
    g = g.put_with("if_else", body([kw("else"), k("block")]), solo);
    g = g.put_with("if_else", [], |_| node(Node::Nothing));

    // forever
    g = g.put_with("statement", k("forever"), solo);
    g = g.put_with("forever", body([kw("forever"), k("block")]), |mut values| {
        let block = values.pop().expect("a loop body").into_node();
        node(Node::Forever(Box::new(block.as_ref().clone())))
    });

    // continue
    g = g.put_with("statement", k("continue"), solo);
    g = g.put_with("continue", body([kw("continue"), kw(";")]), |_| {
        node(Node::Continue)
    });

    // break
    g = g.put_with("statement", k("break"), solo);
    g = g.put_with("break", body([kw("break"), kw(";")]), |_| node(Node::Break));

    // return
    g = g.put_with("statement", k("return"), solo);
    g = g.put_with(
        "return",
        body([kw("return"), k("expression"), kw(";")]),
        |mut values| {
            let value = values.pop().expect("a return value").into_node();
            node(Node::Return(Box::new(value.as_ref().clone())))
        },
    );

    // variable assignment
    g = g.put_with("statement", k("variable_assignment"), solo);
    g = g.put_with(
        "variable_assignment",
        body([k("identifier"), kw("="), k("expression"), kw(";")]),
        |mut values| {
            let value = values.pop().expect("a value").into_node();
            let name = values.pop().expect("a variable name").text();
            node(Node::VariableAssignment {
                name,
                value: Box::new(value.as_ref().clone()),
            })
        },
    );

    // attribute assignment
    g = g.put_with("statement", k("attribute_assignment"), solo);
    g = g.put_with(
        "attribute_assignment",
        body([
            k("postfix_expression"),
            kw("."),
            k("identifier"),
            kw("="),
            k("expression"),
            kw(";"),
        ]),
        |mut values| {
            let value = values.pop().expect("a value").into_node();
            let attribute = values.pop().expect("an attribute name").text();
            let object = values.pop().expect("an object").into_node();
            node(Node::AttributeAssignment {
                object: Box::new(object.as_ref().clone()),
                attribute,
                value: Box::new(value.as_ref().clone()),
            })
        },
    );

    // expression levels, loosest first
    g = g.put_with("expression", k("comparison"), solo);

    g = g.put_with("comparison", k("additive"), solo);
    for (sign, op) in [
        ("==", BinaryOp::Equal),
        ("!=", BinaryOp::NotEqual),
        ("<", BinaryOp::Less),
        (">", BinaryOp::Greater),
    ] {
        g = g.put_with(
            "comparison",
            body([k("additive"), kw(sign), k("additive")]),
            binary_fold(op),
        );
    }

    g = g.put_with("additive", k("multiplicative"), solo);
    for (sign, op) in [("+", BinaryOp::Add), ("-", BinaryOp::Subtract)] {
        g = g.put_with(
            "additive",
            body([k("additive"), kw(sign), k("multiplicative")]),
            binary_fold(op),
        );
    }

    g = g.put_with("multiplicative", k("unary"), solo);
    for (sign, op) in [("*", BinaryOp::Multiply), ("/", BinaryOp::Divide)] {
        g = g.put_with(
            "multiplicative",
            body([k("multiplicative"), kw(sign), k("unary")]),
            binary_fold(op),
        );
    }

    g = g.put_with("unary", k("postfix_expression"), solo);
    g = g.put_with(
        "unary",
        body([kw("-"), k("unary")]),
        unary_fold(UnaryOp::Negative),
    );
    g = g.put_with(
        "unary",
        body([kw("+"), k("unary")]),
        unary_fold(UnaryOp::Positive),
    );

    // attribute access
    g = g.put_with("postfix_expression", k("attribute_access"), solo);
    g = g.put_with(
        "attribute_access",
        body([k("postfix_expression"), kw("."), k("identifier")]),
        |mut values| {
            let attribute = values.pop().expect("an attribute name").text();
            let object = values.pop().expect("an object").into_node();
            node(Node::AttributeAccess {
                object: Box::new(object.as_ref().clone()),
                attribute,
            })
        },
    );

    // call
    g = g.put_with("postfix_expression", k("call"), solo);
    g = g.put_with(
        "call",
        body([
            k("postfix_expression"),
            kw("("),
            k("call_arguments"),
            kw(")"),
        ]),
        |mut values| {
            let arguments = nodes_of(values.pop().expect("an argument tuple"));
            let callee = values.pop().expect("a callee").into_node();
            node(Node::Call {
                callee: Box::new(callee.as_ref().clone()),
                arguments,
            })
        },
    );

    g = g.put_with("call_arguments", [], empty);
    g = g.put_with("call_arguments", k("expression"), single);
    g = g.put_with(
        "call_arguments",
        body([k("expression"), kw(","), k("call_arguments")]),
        cons,
    );

    g = g.put_with("postfix_expression", k("primary_expression"), solo);

    // variable access
    g = g.put_with("primary_expression", k("variable_access"), solo);
    g = g.put_with("variable_access", k("identifier"), |mut values| {
        let name = values.pop().expect("a variable name").text();
        node(Node::VariableAccess(name))
    });

    // number literal
    g = g.put_with("primary_expression", k("number_literal"), solo);
    g = g.put_with("number_literal", k("number"), |mut values| {
        let value = values.pop().expect("a number").into_number();
        node(Node::NumberLiteral(value))
    });

    // string literal
    g = g.put_with("primary_expression", k("string_literal"), solo);
    g = g.put_with("string_literal", k("string"), |mut values| {
        let text = values.pop().expect("a string").text();
        node(Node::StringLiteral(text))
    });

    // function literal
    g = g.put_with("primary_expression", k("function_literal"), solo);
    g = g.put_with(
        "function_literal",
        body([
            kw("("),
            k("function_literal_parameters"),
            kw(")"),
            kw("=>"),
            kw("{"),
            k("statement_sequence"),
            kw("}"),
        ]),
        |mut values| {
            let sequence = values.pop().expect("a function body").into_node();
            let parameters = strings_of(values.pop().expect("a parameter tuple"));
            node(Node::FunctionLiteral {
                parameters,
                body: Box::new(sequence.as_ref().clone()),
            })
        },
    );

    g = g.put_with("function_literal_parameters", [], empty);
    g = g.put_with("function_literal_parameters", k("identifier"), single);
    g = g.put_with(
        "function_literal_parameters",
        body([k("identifier"), kw(","), k("function_literal_parameters")]),
        cons,
    );

    // parenthesized expression
    g = g.put_with("primary_expression", k("parenthesized_expression"), solo);
    g = g.put_with(
        "parenthesized_expression",
        body([kw("("), k("expression"), kw(")")]),
        solo,
    );

    // string
    g = g.put_with(
        "string",
        body([s("whitespace"), s("'"), k("string_items"), s("'")]),
        |values| Value::string(text(values)),
    );

    g = g.put("string_items", []);
    g = g.put(
        "string_items",
        body([k("string_item"), k("string_items")]),
    );

    g = g.put("string_item", k("letter"));
    g = g.put("string_item", k("digit"));
    g = g.put("string_item", k("punctuation_without_backslash_and_quote"));
    g = g.put("string_item", k("whitespace_char"));
    g = g.put("string_item", body([s("\\"), k("\\")]));
    g = g.put("string_item", body([s("\\"), k("'")]));
    g = g.put_with("string_item", body([s("\\"), s("t")]), |_| {
        Value::string("\t")
    });
    g = g.put_with("string_item", body([s("\\"), s("v")]), |_| {
        Value::string("\x0b")
    });
    g = g.put_with("string_item", body([s("\\"), s("f")]), |_| {
        Value::string("\x0c")
    });
    g = g.put_with("string_item", body([s("\\"), s("n")]), |_| {
        Value::string("\n")
    });
    g = g.put_with("string_item", body([s("\\"), s("r")]), |_| {
        Value::string("\r")
    });

    // number
    g = g.put_with(
        "number",
        body([
            s("whitespace"),
            k("number_integer"),
            k("number_fraction_opt"),
            k("number_exponent_opt"),
        ]),
        |values| {
            let digits = text(values);
            Value::Number(digits.parse().expect("the number grammar yields floats"))
        },
    );

    g = g.put("number_integer", k("digit"));
    g = g.put("number_integer", body([k("digit"), k("number_integer")]));

    g = g.put("number_fraction_opt", []);
    g = g.put("number_fraction_opt", body([k("."), k("number_integer")]));

    g = g.put("number_exponent_opt", []);
    g = g.put(
        "number_exponent_opt",
        body([k("e"), k("number_sign_opt"), k("number_integer")]),
    );
    g = g.put(
        "number_exponent_opt",
        body([k("E"), k("number_sign_opt"), k("number_integer")]),
    );

    g = g.put("number_sign_opt", []);
    g = g.put("number_sign_opt", k("+"));
    g = g.put("number_sign_opt", k("-"));

    // identifier
    g = g.put_with(
        "identifier",
        body([s("whitespace"), k("identifier_head"), k("identifier_tail")]),
        |values| Value::string(text(values)),
    );

    g = g.put("identifier_head", k("_"));
    g = g.put("identifier_head", k("letter"));

    g = g.put("identifier_tail", []);
    g = g.put("identifier_tail", body([k("_"), k("identifier_tail")]));
    g = g.put("identifier_tail", body([k("letter"), k("identifier_tail")]));
    g = g.put("identifier_tail", body([k("digit"), k("identifier_tail")]));

    // comment
    g = g.put(
        "whitespace",
        body([s("#"), s("comment_chars"), s("\n"), s("whitespace")]),
    );

    g = g.put("comment_chars", []);
    g = g.put(
        "comment_chars",
        body([s("comment_char"), s("comment_chars")]),
    );

    g = g.put("comment_char", s("letter"));
    g = g.put("comment_char", s("digit"));
    g = g.put("comment_char", s("punctuation"));
    g = g.put("comment_char", s("whitespace_char_without_newline"));

    // character classes
    for c in ('a'..='z').chain('A'..='Z') {
        g = g.put("letter", [keep(c)]);
    }

    for c in '0'..='9' {
        g = g.put("digit", [keep(c)]);
    }

    for c in PUNCTUATION.chars() {
        if c != '\\' && c != '\'' {
            g = g.put("punctuation_without_backslash_and_quote", [keep(c)]);
        }
    }
    g = g.put("punctuation", k("punctuation_without_backslash_and_quote"));
    g = g.put("punctuation", k("\\"));
    g = g.put("punctuation", k("'"));

    for c in WHITESPACE_WITHOUT_NEWLINE.chars() {
        g = g.put("whitespace_char_without_newline", [keep(c)]);
    }
    g = g.put("whitespace_char", k("whitespace_char_without_newline"));
    g = g.put("whitespace_char", k("\n"));

    g = g.put("whitespace", []);
    g = g.put(
        "whitespace",
        body([s("whitespace_char"), s("whitespace")]),
    );

    g
}
