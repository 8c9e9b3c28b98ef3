//! End-to-end tests: GFSLang source through the full pipeline to
//! TypeScript, JSON, and evaluation.

use gfs_compiler::{compile, compile_to_json, compile_to_result, compile_to_ts, CompileResult};
use gfs_eval::{evaluate, load_statements, run, AttributeStore, JsonStore, RunOptions};
use gfs_types::gfs::{Expression, Statement, StatementOperator, MAX_TREE_DEPTH};
use serde_json::{json, Map, Value};

const STRENGTH_SOURCE: &str =
    "0.5: attributes.strength.modifier = max(floor((attributes.strength.value - 10) * 0.5), -5)\n";

const STRENGTH_MACRO_SOURCE: &str = "\
# ability modifier, clamped at -5
!half = 0.5
!mod(score) = max(floor((!score - 10) * !half), -5)

0.5: attributes.strength.modifier = !mod(attributes.strength.value)
";

const SPEED_SOURCE: &str =
    "0: speed = baseSpeedModifier * max(1, (attributes.dexterity.value - 10) // 2) + 15\n";

const STRENGTH_TS: &str = "\
[
    {
        precedence: 0.5,
        target: `attributes.strength.modifier`,
        operator: StatementOperators.SET,
        operand: {
            operator: ExpressionOperators.MAX,
            operands: [
                {
                    operator: ExpressionOperators.FLOOR,
                    operands: [
                        {
                            operator: ExpressionOperators.MULTIPLY,
                            operands: [
                                {
                                    operator: ExpressionOperators.ADD,
                                    operands: [
                                        {
                                            operator: ExpressionOperators.DYNAMIC_VALUE,
                                            operands: `attributes.strength.value`
                                        },
                                        {
                                            operator: ExpressionOperators.STATIC_VALUE,
                                            operands: -10
                                        }
                                    ]
                                },
                                {
                                    operator: ExpressionOperators.STATIC_VALUE,
                                    operands: 0.5
                                }
                            ]
                        }
                    ]
                },
                {
                    operator: ExpressionOperators.STATIC_VALUE,
                    operands: -5
                }
            ]
        }
    }
]";

const SPEED_TS: &str = "\
[
    {
        precedence: 0.0,
        target: `speed`,
        operator: StatementOperators.SET,
        operand: {
            operator: ExpressionOperators.ADD,
            operands: [
                {
                    operator: ExpressionOperators.MULTIPLY,
                    operands: [
                        {
                            operator: ExpressionOperators.DYNAMIC_VALUE,
                            operands: `baseSpeedModifier`
                        },
                        {
                            operator: ExpressionOperators.MAX,
                            operands: [
                                {
                                    operator: ExpressionOperators.STATIC_VALUE,
                                    operands: 1
                                },
                                {
                                    operator: ExpressionOperators.FLOOR,
                                    operands: [
                                        {
                                            operator: ExpressionOperators.MULTIPLY,
                                            operands: [
                                                {
                                                    operator: ExpressionOperators.ADD,
                                                    operands: [
                                                        {
                                                            operator: ExpressionOperators.DYNAMIC_VALUE,
                                                            operands: `attributes.dexterity.value`
                                                        },
                                                        {
                                                            operator: ExpressionOperators.STATIC_VALUE,
                                                            operands: -10
                                                        }
                                                    ]
                                                },
                                                {
                                                    operator: ExpressionOperators.STATIC_VALUE,
                                                    operands: 0.5
                                                }
                                            ]
                                        }
                                    ]
                                }
                            ]
                        }
                    ]
                },
                {
                    operator: ExpressionOperators.STATIC_VALUE,
                    operands: 15
                }
            ]
        }
    }
]";

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn compile_ok(source: &str) -> Vec<Statement> {
    match compile(source, "feature.gfsl") {
        Ok(statements) => statements,
        Err(errors) => panic!("unexpected compile errors:\n{errors}"),
    }
}

fn strength_tree() -> Expression {
    Expression::Max(vec![
        Expression::floor(Expression::Multiply(vec![
            Expression::Add(vec![
                Expression::dynamic("attributes.strength.value"),
                Expression::StaticValue(-10.0),
            ]),
            Expression::StaticValue(0.5),
        ])),
        Expression::StaticValue(-5.0),
    ])
}

fn speed_tree() -> Expression {
    Expression::Add(vec![
        Expression::Multiply(vec![
            Expression::dynamic("baseSpeedModifier"),
            Expression::Max(vec![
                Expression::StaticValue(1.0),
                Expression::floor(Expression::Multiply(vec![
                    Expression::Add(vec![
                        Expression::dynamic("attributes.dexterity.value"),
                        Expression::StaticValue(-10.0),
                    ]),
                    Expression::StaticValue(0.5),
                ])),
            ]),
        ]),
        Expression::StaticValue(15.0),
    ])
}

/// Compile, round-trip through JSON, and run against `initial`.
fn compile_and_run(source: &str, initial: Value) -> JsonStore {
    let json = compile_to_json(source, "feature.gfsl").unwrap();
    let statements = load_statements(&json).unwrap();
    let mut store = JsonStore::from_value(initial).unwrap();
    run(&statements, &mut store, &RunOptions::default()).unwrap();
    store
}

// ─────────────────────────────────────────────────────────────────────
// Reference features
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_strength_tree() {
    assert_eq!(
        compile_ok(STRENGTH_SOURCE),
        vec![Statement::new(
            0.5,
            "attributes.strength.modifier",
            StatementOperator::Set,
            strength_tree()
        )]
    );
}

#[test]
fn test_strength_via_macros_matches_inline() {
    assert_eq!(compile_ok(STRENGTH_MACRO_SOURCE), compile_ok(STRENGTH_SOURCE));
}

#[test]
fn test_speed_tree() {
    assert_eq!(
        compile_ok(SPEED_SOURCE),
        vec![Statement::new(0.0, "speed", StatementOperator::Set, speed_tree())]
    );
}

#[test]
fn test_strength_typescript() {
    assert_eq!(compile_to_ts(STRENGTH_SOURCE, "test.gfsl").unwrap(), STRENGTH_TS);
}

#[test]
fn test_speed_typescript() {
    assert_eq!(compile_to_ts(SPEED_SOURCE, "jason.gfsl").unwrap(), SPEED_TS);
}

// ─────────────────────────────────────────────────────────────────────
// JSON output
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_json_document_shape() {
    let json = compile_to_json("0: a.b = 2 * c\n1: list ++ 3", "doc.gfsl").unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value,
        json!([
            {
                "precedence": 0.0,
                "target": "a.b",
                "operator": "SET",
                "operand": {
                    "operator": "MULTIPLY",
                    "operands": [
                        {"operator": "STATIC_VALUE", "operands": 2},
                        {"operator": "DYNAMIC_VALUE", "operands": "c"}
                    ]
                }
            },
            {
                "precedence": 1.0,
                "target": "list",
                "operator": "PUSH",
                "operand": {"operator": "STATIC_VALUE", "operands": 3}
            }
        ])
    );
}

#[test]
fn test_json_output_loads_back() {
    let source = format!("{STRENGTH_SOURCE}{SPEED_SOURCE}");
    let statements = compile_ok(&source);
    let json = compile_to_json(&source, "feature.gfsl").unwrap();
    assert_eq!(load_statements(&json).unwrap(), statements);
}

#[test]
fn test_compile_result_serde() {
    let ok = compile_to_result(SPEED_SOURCE, "jason.gfsl");
    assert!(ok.success);
    let text = serde_json::to_string(&ok).unwrap();
    let back: CompileResult = serde_json::from_str(&text).unwrap();
    assert_eq!(back.statements, ok.statements);

    let failed = compile_to_result("0: x = a / b", "bad.gfsl");
    assert!(!failed.success);
    assert!(failed.statements.is_none());
    let value = serde_json::to_value(&failed).unwrap();
    assert_eq!(value["success"], json!(false));
    assert_eq!(value["statements"], json!(null));
    assert_eq!(failed.errors.total_errors, 1);
}

// ─────────────────────────────────────────────────────────────────────
// Evaluation
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_strength_evaluates() {
    let store = compile_and_run(
        STRENGTH_MACRO_SOURCE,
        json!({"attributes": {"strength": {"value": 9}}}),
    );
    assert_eq!(store.get("attributes.strength.modifier"), Ok(-1.0));
}

#[test]
fn test_speed_evaluates() {
    let store = compile_and_run(
        SPEED_SOURCE,
        json!({"attributes": {"dexterity": {"value": 14}}, "baseSpeedModifier": 1.1}),
    );
    let speed = store.get("speed").unwrap();
    assert!((speed - 17.2).abs() < 1e-9, "speed = {speed}");
}

#[test]
fn test_later_rules_see_earlier_writes() {
    let source = "\
1: attributes.strength.modifier = (attributes.strength.value - 10) // 2
0: attributes.strength.value = 16
2: carry = attributes.strength.modifier * 5
";
    let store = compile_and_run(source, json!({}));
    assert_eq!(store.get("attributes.strength.modifier"), Ok(3.0));
    assert_eq!(store.get("carry"), Ok(15.0));
}

#[test]
fn test_deepest_compiled_tree_reloads_and_evaluates() {
    let terms: Vec<String> = (0..MAX_TREE_DEPTH).map(|i| format!("a{i}")).collect();
    let source = format!("0: total = {}\n", terms.join(" + "));
    let statements = compile_ok(&source);
    assert_eq!(statements[0].operand.depth(), MAX_TREE_DEPTH);

    let initial: Map<String, Value> = terms.iter().map(|t| (t.clone(), json!(1))).collect();
    let store = JsonStore::from_value(Value::Object(initial.clone())).unwrap();
    assert_eq!(
        evaluate(&statements[0].operand, &store),
        Ok(MAX_TREE_DEPTH as f64)
    );

    let store = compile_and_run(&source, Value::Object(initial));
    assert_eq!(store.get("total"), Ok(MAX_TREE_DEPTH as f64));
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_determinism_100_iterations() {
    let source = format!("{STRENGTH_MACRO_SOURCE}{SPEED_SOURCE}");
    let first_ts = compile_to_ts(&source, "feature.gfsl").unwrap();
    let first_json = compile_to_json(&source, "feature.gfsl").unwrap();
    for i in 0..100 {
        assert_eq!(
            first_ts,
            compile_to_ts(&source, "feature.gfsl").unwrap(),
            "Determinism failure at iteration {i}"
        );
        assert_eq!(
            first_json,
            compile_to_json(&source, "feature.gfsl").unwrap(),
            "Determinism failure at iteration {i}"
        );
    }
}
