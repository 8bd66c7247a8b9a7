//! PEST-based parser for cadence module scripts
//!
//! Produces the executor's AST, with span information for error reporting.

use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use serde::{Deserialize, Serialize};

use super::executor::types::ast::{
    AssignOp, BinaryOp, DeclareTarget, Expr, ForLoopKind, MemberAccess, Span, Stmt, UnaryOp,
    VarKind,
};

pub mod semantic_validator;


/* ===================== Module Definition ===================== */

/// Module definition - represents a complete script file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDef {
    /// Module body (statements to execute)
    pub body: Stmt,
    /// Span of the entire module
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

fn is_default_span(span: &Span) -> bool {
    *span == Span::default()
}

/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "parser/script.pest"]
struct ScriptParser;

/* ===================== Error Types ===================== */

#[derive(Debug)]
pub enum ParseError {
    PestError(String, Option<Span>),
    BuildError(String, Option<Span>),
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::PestError(_, span) => *span,
            ParseError::BuildError(_, span) => *span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParseError::PestError(msg, _) => msg,
            ParseError::BuildError(msg, _) => msg,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::PestError(msg, _) => write!(f, "{}", msg),
            ParseError::BuildError(msg, _) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let span = match err.line_col {
            pest::error::LineColLocation::Pos((line, col)) => Some(Span {
                start: 0,
                end: 0,
                start_line: line.saturating_sub(1),
                start_col: col.saturating_sub(1),
                end_line: line.saturating_sub(1),
                end_col: col,
            }),
            pest::error::LineColLocation::Span((start_line, start_col), (end_line, end_col)) => {
                Some(Span {
                    start: 0,
                    end: 0,
                    start_line: start_line.saturating_sub(1),
                    start_col: start_col.saturating_sub(1),
                    end_line: end_line.saturating_sub(1),
                    end_col: end_col.saturating_sub(1),
                })
            }
        };
        ParseError::PestError(err.to_string(), span)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/* ===================== Span Helpers ===================== */

/// Convert a PEST pair's span to our Span type
fn pair_to_span(pair: &Pair<Rule>, source: &str) -> Span {
    let pest_span = pair.as_span();
    let start = pest_span.start();
    let end = pest_span.end();

    let (start_line, start_col) = offset_to_line_col(source, start);
    let (end_line, end_col) = offset_to_line_col(source, end);

    Span::new(start, end, start_line, start_col, end_line, end_col)
}

/// Convert byte offset to (line, column) - 0-indexed
fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 0;
    let mut col = 0;
    let mut current_offset = 0;

    for ch in source.chars() {
        if current_offset >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
        current_offset += ch.len_utf8();
    }

    (line, col)
}

/// Next inner pair, which the grammar guarantees is present
fn next_pair<'a>(inner: &mut Pairs<'a, Rule>, what: &str, span: Span) -> ParseResult<Pair<'a, Rule>> {
    inner
        .next()
        .ok_or_else(|| ParseError::BuildError(format!("Missing {}", what), Some(span)))
}

/* ===================== Public API ===================== */

/// Parse a script source string into a module definition
pub fn parse_module(source: &str) -> ParseResult<ModuleDef> {
    let mut pairs = ScriptParser::parse(Rule::program, source)?;
    let program = pairs.next().ok_or_else(|| {
        ParseError::BuildError("Empty parse result".to_string(), None)
    })?;
    let program_span = pair_to_span(&program, source);

    let mut statements = Vec::new();
    for pair in program.into_inner() {
        match pair.as_rule() {
            Rule::statement => statements.push(build_statement(pair, source)?),
            Rule::EOI => {}
            _ => {
                return Err(ParseError::BuildError(
                    format!("Unexpected module content: {:?}", pair.as_rule()),
                    Some(pair_to_span(&pair, source)),
                ))
            }
        }
    }

    let body_span = match (statements.first(), statements.last()) {
        (Some(first), Some(last)) => first.span().merge(&last.span()),
        _ => program_span,
    };

    Ok(ModuleDef {
        body: Stmt::Block {
            body: statements,
            span: body_span,
        },
        span: program_span,
    })
}

/// Parse a script source string into an AST statement (testing API)
pub fn parse(source: &str) -> ParseResult<Stmt> {
    parse_module(source).map(|module| module.body)
}

/* ===================== AST Builder ===================== */

fn build_block(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);
    let statements: Result<Vec<Stmt>, ParseError> = pair
        .into_inner()
        .map(|stmt_pair| build_statement(stmt_pair, source))
        .collect();

    Ok(Stmt::Block {
        body: statements?,
        span,
    })
}

fn build_if_stmt(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();

    let test = build_expression(next_pair(&mut inner, "if condition", span)?, source)?;
    let then_s = build_statement(next_pair(&mut inner, "if body", span)?, source)?;

    let else_s = match inner.next() {
        Some(else_clause) => {
            let else_span = pair_to_span(&else_clause, source);
            let mut else_inner = else_clause.into_inner();
            let stmt = next_pair(&mut else_inner, "else body", else_span)?;
            Some(Box::new(build_statement(stmt, source)?))
        }
        None => None,
    };

    Ok(Stmt::If {
        test,
        then_s: Box::new(then_s),
        else_s,
        span,
    })
}

fn build_while_stmt(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();

    let test = build_expression(next_pair(&mut inner, "while condition", span)?, source)?;
    let body = build_statement(next_pair(&mut inner, "while body", span)?, source)?;

    Ok(Stmt::While {
        test,
        body: Box::new(body),
        span,
    })
}

fn build_var_kind(pair: &Pair<Rule>, source: &str) -> ParseResult<VarKind> {
    match pair.as_str() {
        "let" => Ok(VarKind::Let),
        "const" => Ok(VarKind::Const),
        other => Err(ParseError::BuildError(
            format!("Expected 'let' or 'const', got: {}", other),
            Some(pair_to_span(pair, source)),
        )),
    }
}

fn build_for_loop_stmt(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();

    // The binding is always a fresh per-iteration variable
    build_var_kind(&next_pair(&mut inner, "loop binding kind", span)?, source)?;

    let binding_pair = next_pair(&mut inner, "loop binding", span)?;
    let binding_span = pair_to_span(&binding_pair, source);
    let binding = binding_pair.as_str().to_string();

    let kind_pair = next_pair(&mut inner, "'of' or 'in'", span)?;
    let kind = match kind_pair.as_str() {
        "of" => ForLoopKind::Of,
        "in" => ForLoopKind::In,
        _ => {
            return Err(ParseError::BuildError(
                format!("Expected 'of' or 'in', got: {}", kind_pair.as_str()),
                Some(pair_to_span(&kind_pair, source)),
            ))
        }
    };

    let iterable = build_expression(next_pair(&mut inner, "loop iterable", span)?, source)?;
    let body = build_statement(next_pair(&mut inner, "loop body", span)?, source)?;

    Ok(Stmt::ForLoop {
        kind,
        binding,
        binding_span,
        iterable,
        body: Box::new(body),
        span,
    })
}

fn build_declare_stmt(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();

    let var_kind = build_var_kind(&next_pair(&mut inner, "'let' or 'const'", span)?, source)?;
    let target = build_declare_target(next_pair(&mut inner, "declaration target", span)?, source)?;

    let init = match inner.next() {
        Some(expr_pair) => Some(build_expression(expr_pair, source)?),
        None => None,
    };

    if matches!(target, DeclareTarget::Destructure { .. }) && init.is_none() {
        return Err(ParseError::BuildError(
            "Destructuring declaration requires an initializer".to_string(),
            Some(span),
        ));
    }
    if var_kind == VarKind::Const && init.is_none() {
        return Err(ParseError::BuildError(
            "Missing initializer in const declaration".to_string(),
            Some(span),
        ));
    }

    Ok(Stmt::Declare {
        var_kind,
        target,
        init,
        span,
    })
}

fn build_declare_target(pair: Pair<Rule>, source: &str) -> ParseResult<DeclareTarget> {
    let span = pair_to_span(&pair, source);
    let inner = next_pair(&mut pair.into_inner(), "declaration target", span)?;
    let inner_span = pair_to_span(&inner, source);

    match inner.as_rule() {
        Rule::identifier => Ok(DeclareTarget::Simple {
            name: inner.as_str().to_string(),
            span: inner_span,
        }),
        Rule::destructure_pattern => {
            let props_pair = next_pair(&mut inner.into_inner(), "destructured names", inner_span)?;
            let mut names = Vec::new();
            let mut spans = Vec::new();
            for id in props_pair.into_inner() {
                names.push(id.as_str().to_string());
                spans.push(pair_to_span(&id, source));
            }
            Ok(DeclareTarget::Destructure {
                names,
                spans,
                span: inner_span,
            })
        }
        _ => Err(ParseError::BuildError(
            format!("Unexpected declare target rule: {:?}", inner.as_rule()),
            Some(inner_span),
        )),
    }
}

fn build_try_stmt(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();

    let body = build_statement(next_pair(&mut inner, "try block", span)?, source)?;

    let catch_var_pair = next_pair(&mut inner, "catch binding", span)?;
    let catch_var_span = pair_to_span(&catch_var_pair, source);
    let catch_var = catch_var_pair.as_str().to_string();

    let catch_body = build_statement(next_pair(&mut inner, "catch block", span)?, source)?;

    Ok(Stmt::Try {
        body: Box::new(body),
        catch_var,
        catch_var_span,
        catch_body: Box::new(catch_body),
        span,
    })
}

fn build_assign_stmt(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();

    let var_pair = next_pair(&mut inner, "assignment target", span)?;
    let var_span = pair_to_span(&var_pair, source);
    let var = var_pair.as_str().to_string();

    let mut path = Vec::new();
    let mut op = AssignOp::Set;
    let mut value = None;

    for pair in inner {
        match pair.as_rule() {
            Rule::assign_path_segment => {
                let segment_span = pair_to_span(&pair, source);
                let segment_inner = next_pair(&mut pair.into_inner(), "member", segment_span)?;
                match segment_inner.as_rule() {
                    Rule::property_name => path.push(MemberAccess::Prop {
                        property: segment_inner.as_str().to_string(),
                        span: segment_span,
                    }),
                    _ => path.push(MemberAccess::Index {
                        expr: build_expression(segment_inner, source)?,
                        span: segment_span,
                    }),
                }
            }
            Rule::assign_op => {
                op = match pair.as_str() {
                    "+=" => AssignOp::Add,
                    "-=" => AssignOp::Sub,
                    "*=" => AssignOp::Mul,
                    "/=" => AssignOp::Div,
                    _ => AssignOp::Set,
                };
            }
            Rule::expression => {
                value = Some(build_expression(pair, source)?);
            }
            _ => {}
        }
    }

    let value = value.ok_or_else(|| {
        ParseError::BuildError("Missing assigned value".to_string(), Some(span))
    })?;
    Ok(Stmt::Assign {
        var,
        var_span,
        path,
        op,
        value,
        span,
    })
}

fn binary_op_for(rule: Rule) -> Option<BinaryOp> {
    Some(match rule {
        Rule::op_and => BinaryOp::And,
        Rule::op_or => BinaryOp::Or,
        Rule::op_nullish => BinaryOp::Nullish,
        Rule::op_eq | Rule::op_seq => BinaryOp::Eq,
        Rule::op_ne | Rule::op_sne => BinaryOp::Ne,
        Rule::op_lt => BinaryOp::Lt,
        Rule::op_lte => BinaryOp::Lte,
        Rule::op_gt => BinaryOp::Gt,
        Rule::op_gte => BinaryOp::Gte,
        Rule::op_add => BinaryOp::Add,
        Rule::op_sub => BinaryOp::Sub,
        Rule::op_mul => BinaryOp::Mul,
        Rule::op_div => BinaryOp::Div,
        Rule::op_mod => BinaryOp::Mod,
        _ => return None,
    })
}

/// Fold `operand (op operand)*` into left-associative binary nodes
fn build_binary_expr(pair: Pair<Rule>, source: &str) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();

    let mut left = build_expression(next_pair(&mut inner, "operand", span)?, source)?;

    while let Some(op_pair) = inner.next() {
        let op = binary_op_for(op_pair.as_rule()).ok_or_else(|| {
            ParseError::BuildError(
                format!("Expected operator, got {:?}", op_pair.as_rule()),
                Some(pair_to_span(&op_pair, source)),
            )
        })?;
        let right_pair = inner.next().ok_or_else(|| {
            ParseError::BuildError(
                "Missing right operand after operator".to_string(),
                Some(span),
            )
        })?;
        let right = build_expression(right_pair, source)?;
        let new_span = left.span().merge(&right.span());

        left = Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span: new_span,
        };
    }

    Ok(left)
}

fn build_statement(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);

    match pair.as_rule() {
        Rule::statement => build_statement(next_pair(&mut pair.into_inner(), "statement", span)?, source),
        Rule::return_stmt => {
            let value = match pair.into_inner().next() {
                Some(expr_pair) => Some(build_expression(expr_pair, source)?),
                None => None,
            };
            Ok(Stmt::Return { value, span })
        }
        Rule::throw_stmt => {
            let expr_pair = next_pair(&mut pair.into_inner(), "thrown value", span)?;
            Ok(Stmt::Throw {
                value: build_expression(expr_pair, source)?,
                span,
            })
        }
        Rule::if_stmt => build_if_stmt(pair, source),
        Rule::while_stmt => build_while_stmt(pair, source),
        Rule::for_loop_stmt => build_for_loop_stmt(pair, source),
        Rule::try_stmt => build_try_stmt(pair, source),
        Rule::break_stmt => Ok(Stmt::Break { span }),
        Rule::continue_stmt => Ok(Stmt::Continue { span }),
        Rule::block => build_block(pair, source),
        Rule::declare_stmt => build_declare_stmt(pair, source),
        Rule::assign_stmt => build_assign_stmt(pair, source),
        Rule::expr_stmt => {
            let expr_pair = next_pair(&mut pair.into_inner(), "expression", span)?;
            let expr = build_expression(expr_pair, source)?;
            Ok(Stmt::Expr { expr, span })
        }
        _ => Err(ParseError::BuildError(
            format!("Unexpected statement rule: {:?}", pair.as_rule()),
            Some(span),
        )),
    }
}

fn build_expression(pair: Pair<Rule>, source: &str) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, source);

    match pair.as_rule() {
        Rule::expression | Rule::primary | Rule::literal => {
            build_expression(next_pair(&mut pair.into_inner(), "expression", span)?, source)
        }
        Rule::ternary_expr => {
            let mut inner = pair.into_inner();
            let condition = build_expression(next_pair(&mut inner, "condition", span)?, source)?;

            match inner.next() {
                Some(consequent_pair) => {
                    let consequent = build_expression(consequent_pair, source)?;
                    let alternate =
                        build_expression(next_pair(&mut inner, "alternate", span)?, source)?;
                    Ok(Expr::Ternary {
                        condition: Box::new(condition),
                        consequent: Box::new(consequent),
                        alternate: Box::new(alternate),
                        span,
                    })
                }
                None => Ok(condition),
            }
        }
        Rule::nullish_expr
        | Rule::logical_or_expr
        | Rule::logical_and_expr
        | Rule::equality_expr
        | Rule::comparison_expr
        | Rule::additive_expr
        | Rule::multiplicative_expr => build_binary_expr(pair, source),
        Rule::unary_expr => {
            let mut inner = pair.into_inner();
            let first = next_pair(&mut inner, "operand", span)?;

            let op = match first.as_rule() {
                Rule::op_not => UnaryOp::Not,
                Rule::op_neg => UnaryOp::Neg,
                _ => return build_expression(first, source),
            };
            let operand = build_expression(next_pair(&mut inner, "operand", span)?, source)?;
            Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            })
        }
        Rule::call_expr => build_call_expr(pair, source),
        Rule::identifier => Ok(Expr::Ident {
            name: pair.as_str().to_string(),
            span,
        }),
        Rule::number => {
            let num_str = pair.as_str();
            let value = num_str.parse::<f64>().map_err(|e| {
                ParseError::BuildError(
                    format!("Failed to parse number '{}': {}", num_str, e),
                    Some(span),
                )
            })?;
            Ok(Expr::LitNum { v: value, span })
        }
        Rule::boolean => Ok(Expr::LitBool {
            v: pair.as_str() == "true",
            span,
        }),
        Rule::string => Ok(Expr::LitStr {
            v: string_value(pair, span)?,
            span,
        }),
        Rule::null_lit => Ok(Expr::LitNull { span }),
        Rule::object_lit => build_object_literal(pair, source),
        Rule::array_lit => build_array_literal(pair, source),
        _ => Err(ParseError::BuildError(
            format!("Unexpected expression rule: {:?}", pair.as_rule()),
            Some(span),
        )),
    }
}

fn build_call_expr(pair: Pair<Rule>, source: &str) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();
    let mut expr = build_expression(next_pair(&mut inner, "callee", span)?, source)?;

    for postfix_pair in inner {
        let postfix_span = pair_to_span(&postfix_pair, source);
        let postfix_inner = next_pair(&mut postfix_pair.into_inner(), "postfix", postfix_span)?;
        let new_span = expr.span().merge(&postfix_span);

        expr = match postfix_inner.as_rule() {
            Rule::call_suffix => {
                let args = match postfix_inner.into_inner().next() {
                    Some(arg_list_pair) => build_expression_list(arg_list_pair, source)?,
                    None => vec![],
                };
                Expr::Call {
                    callee: Box::new(expr),
                    args,
                    span: new_span,
                }
            }
            rule @ (Rule::optional_access | Rule::regular_access) => {
                let prop_pair = next_pair(&mut postfix_inner.into_inner(), "property", postfix_span)?;
                Expr::Member {
                    object: Box::new(expr),
                    property: prop_pair.as_str().to_string(),
                    property_span: pair_to_span(&prop_pair, source),
                    optional: rule == Rule::optional_access,
                    span: new_span,
                }
            }
            Rule::index_access => {
                let index_pair = next_pair(&mut postfix_inner.into_inner(), "index", postfix_span)?;
                Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(build_expression(index_pair, source)?),
                    span: new_span,
                }
            }
            other => {
                return Err(ParseError::BuildError(
                    format!("Unexpected postfix rule: {:?}", other),
                    Some(postfix_span),
                ))
            }
        };
    }

    Ok(expr)
}

fn build_expression_list(pair: Pair<Rule>, source: &str) -> ParseResult<Vec<Expr>> {
    pair.into_inner()
        .map(|expr_pair| build_expression(expr_pair, source))
        .collect()
}

fn build_object_literal(pair: Pair<Rule>, source: &str) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, source);

    let properties = match pair.into_inner().next() {
        Some(property_list_pair) => property_list_pair
            .into_inner()
            .map(|property_pair| build_property(property_pair, source))
            .collect::<ParseResult<Vec<_>>>()?,
        None => vec![],
    };

    Ok(Expr::LitObj { properties, span })
}

fn build_property(pair: Pair<Rule>, source: &str) -> ParseResult<(String, Span, Expr)> {
    let span = pair_to_span(&pair, source);
    let inner = next_pair(&mut pair.into_inner(), "property", span)?;
    let inner_span = pair_to_span(&inner, source);

    match inner.as_rule() {
        Rule::property_pair => {
            let mut inner_pairs = inner.into_inner();
            let key_pair = next_pair(&mut inner_pairs, "property key", inner_span)?;
            let key_span = pair_to_span(&key_pair, source);
            let key = match key_pair.as_rule() {
                Rule::string => string_value(key_pair, key_span)?,
                _ => key_pair.as_str().to_string(),
            };
            let value = build_expression(next_pair(&mut inner_pairs, "property value", inner_span)?, source)?;
            Ok((key, key_span, value))
        }
        Rule::property_shorthand => {
            let key = inner.as_str().to_string();
            let value = Expr::Ident {
                name: key.clone(),
                span: inner_span,
            };
            Ok((key, inner_span, value))
        }
        _ => Err(ParseError::BuildError(
            format!("Unexpected property rule: {:?}", inner.as_rule()),
            Some(inner_span),
        )),
    }
}

fn build_array_literal(pair: Pair<Rule>, source: &str) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, source);

    let elements = match pair.into_inner().next() {
        Some(element_list_pair) => build_expression_list(element_list_pair, source)?,
        None => vec![],
    };

    Ok(Expr::LitList { elements, span })
}

/* ===================== String Literals ===================== */

fn string_value(pair: Pair<Rule>, span: Span) -> ParseResult<String> {
    let content = next_pair(&mut pair.into_inner(), "string content", span)?;
    unescape(content.as_str()).ok_or_else(|| {
        ParseError::BuildError("Invalid escape sequence in string".to_string(), Some(span))
    })
}

/// Resolve backslash escapes; unknown escapes keep the escaped character
fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 {
                    return None;
                }
                let code = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(code)?);
            }
            other => out.push(other),
        }
    }

    Some(out)
}
