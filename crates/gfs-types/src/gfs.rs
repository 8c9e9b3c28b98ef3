//! The GFS statement tree: the compiler's output and the evaluator's input.
//!
//! On the wire every expression is an `{ "operator": TAG, "operands": ... }`
//! object where the shape of `operands` depends on the tag. In memory the
//! arity is explicit per operator, so decoding is where unknown tags and
//! malformed operands are rejected.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

// ══════════════════════════════════════════════════════════════════════════════
// Operator tags
// ══════════════════════════════════════════════════════════════════════════════

/// Expression operator tags as they appear in GFS documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionOperator {
    Add,
    Min,
    Max,
    Floor,
    Multiply,
    DynamicValue,
    StaticValue,
}

impl ExpressionOperator {
    pub const ALL: [ExpressionOperator; 7] = [
        Self::Add,
        Self::Min,
        Self::Max,
        Self::Floor,
        Self::Multiply,
        Self::DynamicValue,
        Self::StaticValue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Floor => "FLOOR",
            Self::Multiply => "MULTIPLY",
            Self::DynamicValue => "DYNAMIC_VALUE",
            Self::StaticValue => "STATIC_VALUE",
        }
    }

    /// Look up a wire tag. Tags are case-sensitive.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == tag)
    }
}

impl fmt::Display for ExpressionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statement operator tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementOperator {
    /// Overwrite the target with the value.
    Set,
    /// Append the value to the list at the target.
    Push,
}

impl StatementOperator {
    pub const ALL: [StatementOperator; 2] = [Self::Set, Self::Push];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Push => "PUSH",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == tag)
    }
}

impl fmt::Display for StatementOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Tree
// ══════════════════════════════════════════════════════════════════════════════

/// Deepest expression tree the compiler emits and the evaluator accepts by
/// default. Encoded as JSON, every level is an object plus its `operands`
/// array, so a tree this deep stays under serde_json's nesting limit of 128.
pub const MAX_TREE_DEPTH: usize = 60;

/// A GFS expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    StaticValue(f64),
    /// Dotted attribute path, resolved at evaluation time.
    DynamicValue(String),
    Add(Vec<Expression>),
    Multiply(Vec<Expression>),
    Min(Vec<Expression>),
    Max(Vec<Expression>),
    Floor(Box<Expression>),
}

impl Expression {
    pub fn floor(operand: Expression) -> Self {
        Expression::Floor(Box::new(operand))
    }

    pub fn dynamic(path: impl Into<String>) -> Self {
        Expression::DynamicValue(path.into())
    }

    pub fn operator(&self) -> ExpressionOperator {
        match self {
            Expression::StaticValue(_) => ExpressionOperator::StaticValue,
            Expression::DynamicValue(_) => ExpressionOperator::DynamicValue,
            Expression::Add(_) => ExpressionOperator::Add,
            Expression::Multiply(_) => ExpressionOperator::Multiply,
            Expression::Min(_) => ExpressionOperator::Min,
            Expression::Max(_) => ExpressionOperator::Max,
            Expression::Floor(_) => ExpressionOperator::Floor,
        }
    }

    /// The literal value, if this is a `STATIC_VALUE` node.
    pub fn as_static(&self) -> Option<f64> {
        match self {
            Expression::StaticValue(v) => Some(*v),
            _ => None,
        }
    }

    /// Nesting depth; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Expression::StaticValue(_) | Expression::DynamicValue(_) => 1,
            Expression::Floor(inner) => 1 + inner.depth(),
            Expression::Add(ops)
            | Expression::Multiply(ops)
            | Expression::Min(ops)
            | Expression::Max(ops) => 1 + ops.iter().map(Expression::depth).max().unwrap_or(0),
        }
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Expression::StaticValue(_) | Expression::DynamicValue(_) => 1,
            Expression::Floor(inner) => 1 + inner.size(),
            Expression::Add(ops)
            | Expression::Multiply(ops)
            | Expression::Min(ops)
            | Expression::Max(ops) => 1 + ops.iter().map(Expression::size).sum::<usize>(),
        }
    }

    pub fn to_json(&self) -> Value {
        let operands = match self {
            Expression::StaticValue(v) => number_to_json(*v),
            Expression::DynamicValue(path) => Value::String(path.clone()),
            Expression::Floor(inner) => Value::Array(vec![inner.to_json()]),
            Expression::Add(ops)
            | Expression::Multiply(ops)
            | Expression::Min(ops)
            | Expression::Max(ops) => Value::Array(ops.iter().map(Expression::to_json).collect()),
        };
        json!({ "operator": self.operator().as_str(), "operands": operands })
    }

    pub fn from_json(value: &Value) -> Result<Self, DecodeError> {
        decode_expression(value, "")
    }
}

/// One assignment rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub precedence: f64,
    /// Dotted path of the attribute written.
    pub target: String,
    pub operator: StatementOperator,
    pub operand: Expression,
}

impl Statement {
    pub fn new(
        precedence: f64,
        target: impl Into<String>,
        operator: StatementOperator,
        operand: Expression,
    ) -> Self {
        Self {
            precedence,
            target: target.into(),
            operator,
            operand,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "precedence": Value::from(self.precedence),
            "target": self.target,
            "operator": self.operator.as_str(),
            "operand": self.operand.to_json(),
        })
    }

    pub fn from_json(value: &Value) -> Result<Self, DecodeError> {
        decode_statement(value, "")
    }
}

/// Encode a list of statements as a GFS JSON document.
pub fn encode_document(statements: &[Statement]) -> Value {
    Value::Array(statements.iter().map(Statement::to_json).collect())
}

/// Decode a GFS JSON document (an array of statements).
pub fn decode_document(text: &str) -> Result<Vec<Statement>, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    decode_document_value(&value)
}

pub fn decode_document_value(value: &Value) -> Result<Vec<Statement>, DecodeError> {
    let items = value
        .as_array()
        .ok_or_else(|| DecodeError::malformed("", "document must be an array of statements"))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| decode_statement(item, &format!("/{i}")))
        .collect()
}

/// Integral values are written without a fractional part; non-finite
/// values have no JSON form and become `null`.
fn number_to_json(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
        Value::from(v as i64)
    } else {
        serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Decoding
// ══════════════════════════════════════════════════════════════════════════════

/// Errors raised while reading a GFS document.
///
/// `at` is a JSON pointer to the offending node (empty for the root).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{at}: unknown {kind} operator '{tag}'")]
    UnknownOperator {
        kind: &'static str,
        tag: String,
        at: String,
    },

    #[error("{at}: {message}")]
    Malformed { at: String, message: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl DecodeError {
    fn malformed(at: &str, message: impl Into<String>) -> Self {
        DecodeError::Malformed {
            at: at.to_string(),
            message: message.into(),
        }
    }
}

fn field<'v>(obj: &'v Map<String, Value>, name: &str, at: &str) -> Result<&'v Value, DecodeError> {
    obj.get(name)
        .ok_or_else(|| DecodeError::malformed(at, format!("missing field '{name}'")))
}

fn decode_statement(value: &Value, at: &str) -> Result<Statement, DecodeError> {
    let obj = value
        .as_object()
        .ok_or_else(|| DecodeError::malformed(at, "statement must be an object"))?;

    let precedence = field(obj, "precedence", at)?
        .as_f64()
        .ok_or_else(|| DecodeError::malformed(at, "'precedence' must be a number"))?;
    let target = field(obj, "target", at)?
        .as_str()
        .ok_or_else(|| DecodeError::malformed(at, "'target' must be a string"))?;
    let tag = field(obj, "operator", at)?
        .as_str()
        .ok_or_else(|| DecodeError::malformed(at, "'operator' must be a string"))?;
    let operator = StatementOperator::from_tag(tag).ok_or_else(|| DecodeError::UnknownOperator {
        kind: "statement",
        tag: tag.to_string(),
        at: at.to_string(),
    })?;
    let operand = decode_expression(field(obj, "operand", at)?, &format!("{at}/operand"))?;

    Ok(Statement {
        precedence,
        target: target.to_string(),
        operator,
        operand,
    })
}

fn decode_expression(value: &Value, at: &str) -> Result<Expression, DecodeError> {
    let obj = value
        .as_object()
        .ok_or_else(|| DecodeError::malformed(at, "expression must be an object"))?;
    let tag = field(obj, "operator", at)?
        .as_str()
        .ok_or_else(|| DecodeError::malformed(at, "'operator' must be a string"))?;
    let operator = ExpressionOperator::from_tag(tag).ok_or_else(|| DecodeError::UnknownOperator {
        kind: "expression",
        tag: tag.to_string(),
        at: at.to_string(),
    })?;
    let operands = field(obj, "operands", at)?;
    let operands_at = format!("{at}/operands");

    match operator {
        ExpressionOperator::StaticValue => operands
            .as_f64()
            .map(Expression::StaticValue)
            .ok_or_else(|| DecodeError::malformed(&operands_at, "STATIC_VALUE takes a number")),
        ExpressionOperator::DynamicValue => operands
            .as_str()
            .map(Expression::dynamic)
            .ok_or_else(|| DecodeError::malformed(&operands_at, "DYNAMIC_VALUE takes a path string")),
        ExpressionOperator::Floor => {
            let inner = match operands {
                Value::Array(items) if items.len() == 1 => {
                    decode_expression(&items[0], &format!("{operands_at}/0"))?
                }
                Value::Array(items) => {
                    return Err(DecodeError::malformed(
                        &operands_at,
                        format!("FLOOR takes exactly one operand, got {}", items.len()),
                    ))
                }
                Value::Object(_) => decode_expression(operands, &operands_at)?,
                _ => {
                    return Err(DecodeError::malformed(
                        &operands_at,
                        "FLOOR takes an expression",
                    ))
                }
            };
            Ok(Expression::floor(inner))
        }
        ExpressionOperator::Add
        | ExpressionOperator::Multiply
        | ExpressionOperator::Min
        | ExpressionOperator::Max => {
            let items = operands.as_array().ok_or_else(|| {
                DecodeError::malformed(&operands_at, format!("{operator} takes an array of expressions"))
            })?;
            let ops = items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_expression(item, &format!("{operands_at}/{i}")))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(match operator {
                ExpressionOperator::Add => Expression::Add(ops),
                ExpressionOperator::Multiply => Expression::Multiply(ops),
                ExpressionOperator::Min => Expression::Min(ops),
                _ => Expression::Max(ops),
            })
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// serde
// ══════════════════════════════════════════════════════════════════════════════

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Expression::from_json(&value).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Statement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Statement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Statement::from_json(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strength_modifier() -> Statement {
        Statement::new(
            0.5,
            "attributes.strength.modifier",
            StatementOperator::Set,
            Expression::Max(vec![
                Expression::floor(Expression::Multiply(vec![
                    Expression::Add(vec![
                        Expression::dynamic("attributes.strength.value"),
                        Expression::StaticValue(-10.0),
                    ]),
                    Expression::StaticValue(0.5),
                ])),
                Expression::StaticValue(-5.0),
            ]),
        )
    }

    #[test]
    fn test_operator_tags() {
        for op in ExpressionOperator::ALL {
            assert_eq!(ExpressionOperator::from_tag(op.as_str()), Some(op));
        }
        for op in StatementOperator::ALL {
            assert_eq!(StatementOperator::from_tag(op.as_str()), Some(op));
        }
        assert_eq!(ExpressionOperator::from_tag("add"), None);
        assert_eq!(StatementOperator::from_tag("INCREMENT"), None);
    }

    #[test]
    fn test_encode_shape() {
        let json = strength_modifier().to_json();
        assert_eq!(json["precedence"], 0.5);
        assert_eq!(json["operator"], "SET");
        assert_eq!(json["operand"]["operator"], "MAX");
        let floor = &json["operand"]["operands"][0];
        assert_eq!(floor["operator"], "FLOOR");
        assert!(floor["operands"].is_array());
        assert_eq!(json["operand"]["operands"][1]["operands"], -5);
    }

    #[test]
    fn test_decode_document() {
        let doc = serde_json::to_string(&encode_document(&[strength_modifier()])).unwrap();
        let statements = decode_document(&doc).unwrap();
        assert_eq!(statements, vec![strength_modifier()]);
    }

    #[test]
    fn test_decode_floor_accepts_bare_object() {
        let value = json!({
            "operator": "FLOOR",
            "operands": { "operator": "STATIC_VALUE", "operands": 1.5 }
        });
        assert_eq!(
            Expression::from_json(&value).unwrap(),
            Expression::floor(Expression::StaticValue(1.5))
        );
    }

    #[test]
    fn test_decode_unknown_expression_operator() {
        let value = json!({
            "operator": "ADD",
            "operands": [{ "operator": "POWER", "operands": [] }]
        });
        match Expression::from_json(&value) {
            Err(DecodeError::UnknownOperator { kind, tag, at }) => {
                assert_eq!(kind, "expression");
                assert_eq!(tag, "POWER");
                assert_eq!(at, "/operands/0");
            }
            other => panic!("expected UnknownOperator, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_unknown_statement_operator() {
        let doc = r#"[{"precedence": 0, "target": "speed", "operator": "INCREMENT",
                       "operand": {"operator": "STATIC_VALUE", "operands": 1}}]"#;
        let err = decode_document(doc).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownOperator { kind: "statement", .. }));
        assert_eq!(err.to_string(), "/0: unknown statement operator 'INCREMENT'");
    }

    #[test]
    fn test_decode_rejects_wrong_operand_shapes() {
        let cases = [
            json!({ "operator": "STATIC_VALUE", "operands": "15" }),
            json!({ "operator": "DYNAMIC_VALUE", "operands": 15 }),
            json!({ "operator": "ADD", "operands": 15 }),
            json!({ "operator": "FLOOR", "operands": [] }),
            json!({ "operator": "MAX" }),
            json!([1, 2]),
        ];
        for case in cases {
            assert!(
                matches!(Expression::from_json(&case), Err(DecodeError::Malformed { .. })),
                "accepted {case}"
            );
        }
    }

    #[test]
    fn test_serde_delegates_to_codec() {
        let text = serde_json::to_string(&strength_modifier()).unwrap();
        let back: Statement = serde_json::from_str(&text).unwrap();
        assert_eq!(back, strength_modifier());

        let bad = r#"{"operator": "SQRT", "operands": []}"#;
        let err = serde_json::from_str::<Expression>(bad).unwrap_err();
        assert!(err.to_string().contains("unknown expression operator 'SQRT'"));
    }

    #[test]
    fn test_depth_and_size() {
        assert_eq!(Expression::StaticValue(1.0).depth(), 1);
        assert_eq!(strength_modifier().operand.depth(), 5);
        assert_eq!(Expression::Add(vec![]).depth(), 1);
        assert_eq!(strength_modifier().operand.size(), 8);
        assert_eq!(Expression::Add(vec![]).size(), 1);
    }

    #[test]
    fn test_deepest_tree_decodes() {
        let mut operand = Expression::dynamic("a");
        while operand.depth() < MAX_TREE_DEPTH {
            operand = Expression::Add(vec![operand, Expression::StaticValue(1.0)]);
        }
        let statements = vec![Statement::new(0.0, "x", StatementOperator::Set, operand)];
        let pretty = format!("{:#}", encode_document(&statements));
        assert_eq!(decode_document(&pretty).unwrap(), statements);
    }

    #[test]
    fn test_non_integral_static_values_keep_fraction() {
        let json = Expression::StaticValue(0.5).to_json();
        assert_eq!(json["operands"], 0.5);
        let json = Expression::StaticValue(f64::NAN).to_json();
        assert!(json["operands"].is_null());
    }
}
