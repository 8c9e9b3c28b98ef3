//! Output renderers for compiled GFS statements.
//!
//! - [`render_ts`]: a TypeScript object literal referencing the host's
//!   `StatementOperators` / `ExpressionOperators` enums.
//! - [`render_json`]: the pretty-printed GFS JSON document the evaluator
//!   reads.

use gfs_types::gfs::{encode_document, Expression, Statement};

const INDENT: &str = "    ";

// ══════════════════════════════════════════════════════════════════════════════
// TypeScript
// ══════════════════════════════════════════════════════════════════════════════

/// Render statements as a TypeScript array literal.
///
/// ```text
/// [
///     {
///         precedence: 0.0,
///         target: `speed`,
///         operator: StatementOperators.SET,
///         operand: {
///             operator: ExpressionOperators.STATIC_VALUE,
///             operands: 15
///         }
///     }
/// ]
/// ```
pub fn render_ts(statements: &[Statement]) -> String {
    let items: Vec<String> = statements.iter().map(render_statement).collect();
    render_list(&items)
}

fn render_statement(statement: &Statement) -> String {
    format!(
        "{{\n{INDENT}precedence: {},\n{INDENT}target: `{}`,\n{INDENT}operator: StatementOperators.{},\n{INDENT}operand: {}\n}}",
        format_precedence(statement.precedence),
        statement.target,
        statement.operator.as_str(),
        indent_tail(&render_expression(&statement.operand)),
    )
}

fn render_expression(expr: &Expression) -> String {
    let operands = match expr {
        Expression::StaticValue(v) => format_number(*v),
        Expression::DynamicValue(path) => format!("`{path}`"),
        Expression::Floor(inner) => indent_tail(&render_list(&[render_expression(inner)])),
        Expression::Add(ops)
        | Expression::Multiply(ops)
        | Expression::Min(ops)
        | Expression::Max(ops) => {
            let items: Vec<String> = ops.iter().map(render_expression).collect();
            indent_tail(&render_list(&items))
        }
    };
    format!(
        "{{\n{INDENT}operator: ExpressionOperators.{},\n{INDENT}operands: {operands}\n}}",
        expr.operator().as_str(),
    )
}

fn render_list(items: &[String]) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }
    let body: Vec<String> = items.iter().map(|item| indent_all(item)).collect();
    format!("[\n{}\n]", body.join(",\n"))
}

/// Indent every non-empty line.
fn indent_all(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{INDENT}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indent every line but the first, for values that follow a `key: ` prefix.
fn indent_tail(text: &str) -> String {
    match text.split_once('\n') {
        Some((first, rest)) => format!("{first}\n{}", indent_all(rest)),
        None => text.to_string(),
    }
}

/// Integral values print without a fractional part (`15`, `-10`).
fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Precedences always carry a fractional part (`0.0`, `0.5`).
fn format_precedence(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// JSON
// ══════════════════════════════════════════════════════════════════════════════

/// Render statements as a pretty-printed GFS JSON document.
pub fn render_json(statements: &[Statement]) -> String {
    format!("{:#}", encode_document(statements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfs_types::gfs::StatementOperator;

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(15.0), "15");
        assert_eq!(format_number(-10.0), "-10");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_precedence(0.0), "0.0");
        assert_eq!(format_precedence(0.5), "0.5");
        assert_eq!(format_precedence(-2.0), "-2.0");
    }

    #[test]
    fn test_indent_tail_leaves_first_line() {
        assert_eq!(indent_tail("{\na\n}"), "{\n    a\n    }");
        assert_eq!(indent_tail("x"), "x");
    }

    #[test]
    fn test_render_single_static_statement() {
        let statements = vec![Statement::new(
            0.0,
            "speed",
            StatementOperator::Set,
            Expression::StaticValue(15.0),
        )];
        let expected = "[
    {
        precedence: 0.0,
        target: `speed`,
        operator: StatementOperators.SET,
        operand: {
            operator: ExpressionOperators.STATIC_VALUE,
            operands: 15
        }
    }
]";
        assert_eq!(render_ts(&statements), expected);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_ts(&[]), "[]");
        assert_eq!(render_json(&[]), "[]");
    }

    #[test]
    fn test_render_push_with_dynamic_operand() {
        let statements = vec![Statement::new(
            1.0,
            "features.list",
            StatementOperator::Push,
            Expression::dynamic("level"),
        )];
        let out = render_ts(&statements);
        assert!(out.contains("operator: StatementOperators.PUSH,"));
        assert!(out.contains("operands: `level`"));
    }
}
