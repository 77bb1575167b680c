//! Expression parser using nom
//!
//! Parses the statement language into an [`Ast`]. Names stay unresolved here;
//! the compiler maps them to variable slots, constants and built-ins.
//!
//! Precedence, loosest first: assignment, `?:`, `||`, `&&`, `== !=`,
//! `< <= > >=`, `+ -`, `* / %`, unary `- + !` and prefix `++ --`, `^`
//! (right-associative), postfix `++ --`.

use std::cell::Cell;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{cut, map, not, opt, recognize, value, verify},
    error::ErrorKind,
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

use super::ast::{AssignOp, Ast, BinaryOp, Node, UnaryOp};
use super::error::CompileError;

type PError<'a> = nom::error::Error<&'a str>;
type PResult<'a, T> = IResult<&'a str, T>;

const KEYWORDS: &[&str] = &[
    "if", "else", "while", "do", "for", "break", "continue", "return",
];

/// Nesting levels (statements, operands, sub-expressions and chained
/// operators) allowed before parsing fails with `NestingTooDeep`
pub const MAX_NESTING: usize = 200;

thread_local! {
    static NESTING: Cell<usize> = const { Cell::new(0) };
}

/// One level of parser nesting, released on drop
struct NestingGuard;

impl NestingGuard {
    fn enter(input: &str) -> Result<Self, nom::Err<PError<'_>>> {
        let depth = NESTING.with(|n| {
            n.set(n.get() + 1);
            n.get()
        });
        let guard = NestingGuard;
        if depth > MAX_NESTING {
            return Err(nom::Err::Failure(PError::new(input, ErrorKind::TooLarge)));
        }
        Ok(guard)
    }
}

impl Drop for NestingGuard {
    fn drop(&mut self) {
        NESTING.with(|n| n.set(n.get().saturating_sub(1)));
    }
}

fn spaces(input: &str) -> PResult<'_, &str> {
    take_while(|c: char| c.is_ascii_whitespace()).parse(input)
}

/// Whitespace and `//` line comments
fn ws(input: &str) -> PResult<'_, ()> {
    let (mut remaining, _) = spaces(input)?;
    while remaining.starts_with("//") {
        let (input, _) = take_while(|c: char| c != '\n').parse(remaining)?;
        let (input, _) = spaces(input)?;
        remaining = input;
    }
    Ok((remaining, ()))
}

/// A literal token after optional whitespace
fn sym<'a>(token: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = PError<'a>> {
    preceded(ws, tag(token))
}

/// Operator token that must not be followed by any of `forbidden_next`
/// (keeps `=` apart from `==`, `!` apart from `!=`, ...)
fn op<'a>(
    token: &'static str,
    forbidden_next: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = PError<'a>> {
    terminated(sym(token), not(one_of(forbidden_next)))
}

/// Parse an identifier (starts with letter or _, followed by letters, digits, _)
fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// Identifier that is not a keyword
fn name(input: &str) -> PResult<'_, &str> {
    preceded(ws, verify(identifier, |s: &str| !KEYWORDS.contains(&s))).parse(input)
}

fn keyword<'a>(word: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = PError<'a>> {
    preceded(ws, verify(identifier, move |s: &str| s == word))
}

/// Decimal literal: `12`, `1.5`, `.5`, `2.`, `1e-3`
fn number(input: &str) -> PResult<'_, Ast> {
    // not `digit0`: at end of input it misplaces the remainder `recognize` measures
    let (rest, text) = recognize(pair(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), opt(digit1))))),
            recognize(pair(char('.'), digit1)),
        )),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)?;

    match text.parse::<f64>() {
        Ok(v) => Ok((rest, Node::Number(v))),
        Err(_) => Err(nom::Err::Failure(PError::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

fn parenthesized(input: &str) -> PResult<'_, Ast> {
    delimited(sym("("), expression, cut(sym(")"))).parse(input)
}

/// Function call: `name(arg, ...)`
fn call(input: &str) -> PResult<'_, Ast> {
    let (input, func) = name(input)?;
    let (input, _) = sym("(").parse(input)?;
    let (input, args) = separated_list0(sym(","), expression).parse(input)?;
    let (input, _) = cut(sym(")")).parse(input)?;
    Ok((
        input,
        Node::Call {
            func: func.to_string(),
            args,
        },
    ))
}

fn primary(input: &str) -> PResult<'_, Ast> {
    preceded(
        ws,
        alt((
            number,
            call,
            parenthesized,
            map(name, |n| Node::Var(n.to_string())),
        )),
    )
    .parse(input)
}

fn step(target: &str, delta: f64, prefix: bool) -> Ast {
    Node::Step {
        target: target.to_string(),
        delta,
        prefix,
    }
}

/// Postfix increment/decrement
fn postfix(input: &str) -> PResult<'_, Ast> {
    alt((
        map(terminated(name, sym("++")), |n| step(n, 1.0, false)),
        map(terminated(name, sym("--")), |n| step(n, -1.0, false)),
        primary,
    ))
    .parse(input)
}

/// Power operator (right-associative, binds tighter than unary minus)
fn power(input: &str) -> PResult<'_, Ast> {
    let (input, base) = postfix(input)?;
    match op("^", "=").parse(input) {
        Ok((input, _)) => {
            let (input, exponent) = cut(unary).parse(input)?;
            Ok((input, Node::binary(BinaryOp::Pow, base, exponent)))
        }
        Err(nom::Err::Error(_)) => Ok((input, base)),
        Err(e) => Err(e),
    }
}

fn unary(input: &str) -> PResult<'_, Ast> {
    let _nesting = NestingGuard::enter(input)?;
    alt((
        map(preceded(sym("++"), cut(name)), |n| step(n, 1.0, true)),
        map(preceded(sym("--"), cut(name)), |n| step(n, -1.0, true)),
        map(preceded(sym("-"), unary), |e| Node::unary(UnaryOp::Neg, e)),
        preceded(sym("+"), unary),
        map(preceded(op("!", "="), unary), |e| Node::unary(UnaryOp::Not, e)),
        power,
    ))
    .parse(input)
}

/// Left-associative chain of `operand (operator operand)*`
fn chain<'a>(
    input: &'a str,
    operand: fn(&'a str) -> PResult<'a, Ast>,
    mut operator: impl Parser<&'a str, Output = BinaryOp, Error = PError<'a>>,
) -> PResult<'a, Ast> {
    let (mut input, mut lhs) = operand(input)?;
    // every operator adds a level to the left-leaning tree
    let mut levels = Vec::new();
    loop {
        match operator.parse(input) {
            Ok((rest, op)) => {
                levels.push(NestingGuard::enter(rest)?);
                let (rest, rhs) = cut(operand).parse(rest)?;
                lhs = Node::binary(op, lhs, rhs);
                input = rest;
            }
            Err(nom::Err::Error(_)) => return Ok((input, lhs)),
            Err(e) => return Err(e),
        }
    }
}

fn multiplicative(input: &str) -> PResult<'_, Ast> {
    chain(
        input,
        unary,
        alt((
            value(BinaryOp::Mul, op("*", "=")),
            value(BinaryOp::Div, op("/", "=")),
            value(BinaryOp::Rem, op("%", "=")),
        )),
    )
}

fn additive(input: &str) -> PResult<'_, Ast> {
    chain(
        input,
        multiplicative,
        alt((
            value(BinaryOp::Add, op("+", "+=")),
            value(BinaryOp::Sub, op("-", "-=")),
        )),
    )
}

fn relational(input: &str) -> PResult<'_, Ast> {
    chain(
        input,
        additive,
        alt((
            value(BinaryOp::Le, sym("<=")),
            value(BinaryOp::Ge, sym(">=")),
            value(BinaryOp::Lt, sym("<")),
            value(BinaryOp::Gt, sym(">")),
        )),
    )
}

fn equality(input: &str) -> PResult<'_, Ast> {
    chain(
        input,
        relational,
        alt((
            value(BinaryOp::Eq, sym("==")),
            value(BinaryOp::Ne, sym("!=")),
        )),
    )
}

fn logical_and(input: &str) -> PResult<'_, Ast> {
    chain(input, equality, value(BinaryOp::And, sym("&&")))
}

fn logical_or(input: &str) -> PResult<'_, Ast> {
    chain(input, logical_and, value(BinaryOp::Or, sym("||")))
}

/// Ternary `cond ? a : b`
fn conditional(input: &str) -> PResult<'_, Ast> {
    let (input, cond) = logical_or(input)?;
    match sym("?").parse(input) {
        Ok((input, _)) => {
            let (input, then_branch) = cut(assignment).parse(input)?;
            let (input, _) = cut(sym(":")).parse(input)?;
            let (input, else_branch) = cut(assignment).parse(input)?;
            Ok((
                input,
                Node::Conditional {
                    cond: Box::new(cond),
                    then_branch: Box::new(then_branch),
                    else_branch: Some(Box::new(else_branch)),
                },
            ))
        }
        Err(nom::Err::Error(_)) => Ok((input, cond)),
        Err(e) => Err(e),
    }
}

fn assign_op(input: &str) -> PResult<'_, AssignOp> {
    alt((
        value(AssignOp::Add, sym("+=")),
        value(AssignOp::Sub, sym("-=")),
        value(AssignOp::Mul, sym("*=")),
        value(AssignOp::Div, sym("/=")),
        value(AssignOp::Rem, sym("%=")),
        value(AssignOp::Pow, sym("^=")),
        value(AssignOp::Set, op("=", "=")),
    ))
    .parse(input)
}

/// Assignment (right-associative) or conditional expression
fn assignment(input: &str) -> PResult<'_, Ast> {
    let _nesting = NestingGuard::enter(input)?;
    alt((
        map((name, assign_op, cut(assignment)), |(target, op, value)| {
            Node::Assign {
                target: target.to_string(),
                op,
                value: Box::new(value),
            }
        }),
        conditional,
    ))
    .parse(input)
}

fn expression(input: &str) -> PResult<'_, Ast> {
    assignment(input)
}

fn block(input: &str) -> PResult<'_, Ast> {
    delimited(sym("{"), statement_list, cut(sym("}"))).parse(input)
}

fn if_statement(input: &str) -> PResult<'_, Ast> {
    let (input, _) = keyword("if").parse(input)?;
    let (input, cond) = cut(parenthesized).parse(input)?;
    let (input, then_branch) = cut(statement).parse(input)?;
    let (input, else_branch) =
        opt(preceded((opt(sym(";")), keyword("else")), cut(statement))).parse(input)?;
    Ok((
        input,
        Node::Conditional {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        },
    ))
}

fn while_statement(input: &str) -> PResult<'_, Ast> {
    let (input, _) = keyword("while").parse(input)?;
    let (input, cond) = cut(parenthesized).parse(input)?;
    let (input, body) = cut(statement).parse(input)?;
    Ok((
        input,
        Node::While {
            cond: Box::new(cond),
            body: Box::new(body),
            test_first: true,
        },
    ))
}

fn do_statement(input: &str) -> PResult<'_, Ast> {
    let (input, _) = keyword("do").parse(input)?;
    let (input, body) = cut(statement).parse(input)?;
    let (input, _) = opt(sym(";")).parse(input)?;
    let (input, _) = cut(keyword("while")).parse(input)?;
    let (input, cond) = cut(parenthesized).parse(input)?;
    Ok((
        input,
        Node::While {
            cond: Box::new(cond),
            body: Box::new(body),
            test_first: false,
        },
    ))
}

/// `for (i = first, last) body` or `for (init; cond; step) body`
fn for_statement(input: &str) -> PResult<'_, Ast> {
    let (input, _) = keyword("for").parse(input)?;
    let (input, _) = cut(sym("(")).parse(input)?;

    if let Ok((rest, (counter, _, first, _, last, _))) = (
        name,
        op("=", "="),
        expression,
        sym(","),
        expression,
        sym(")"),
    )
        .parse(input)
    {
        let (rest, body) = cut(statement).parse(rest)?;
        return Ok((
            rest,
            Node::RangeFor {
                counter: counter.to_string(),
                first: Box::new(first),
                last: Box::new(last),
                body: Box::new(body),
            },
        ));
    }

    let (input, init) = opt(expression).parse(input)?;
    let (input, _) = cut(sym(";")).parse(input)?;
    let (input, cond) = opt(expression).parse(input)?;
    let (input, _) = cut(sym(";")).parse(input)?;
    let (input, step) = opt(expression).parse(input)?;
    let (input, _) = cut(sym(")")).parse(input)?;
    let (input, body) = cut(statement).parse(input)?;
    Ok((
        input,
        Node::For {
            init: init.map(Box::new),
            cond: cond.map(Box::new),
            step: step.map(Box::new),
            body: Box::new(body),
        },
    ))
}

fn return_statement(input: &str) -> PResult<'_, Ast> {
    let (input, _) = keyword("return").parse(input)?;
    let (input, result) = opt(expression).parse(input)?;
    Ok((input, Node::Return(result.map(Box::new))))
}

fn statement(input: &str) -> PResult<'_, Ast> {
    let _nesting = NestingGuard::enter(input)?;
    alt((
        block,
        if_statement,
        while_statement,
        do_statement,
        for_statement,
        value(Node::Break, keyword("break")),
        value(Node::Continue, keyword("continue")),
        return_statement,
        value(Node::Sequence(Vec::new()), sym(";")),
        expression,
    ))
    .parse(input)
}

fn statement_list(input: &str) -> PResult<'_, Ast> {
    map(many0(terminated(statement, opt(sym(";")))), Node::Sequence).parse(input)
}

fn snippet(input: &str) -> String {
    input.chars().take(20).collect()
}

/// Parse expression source into an unresolved syntax tree
pub fn parse_program(source: &str) -> Result<Ast, CompileError> {
    let (remaining, program) = terminated(statement_list, ws)
        .parse(source)
        .map_err(|e| match e {
            nom::Err::Incomplete(_) => CompileError::UnexpectedEnd,
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                if e.code == ErrorKind::TooLarge {
                    return CompileError::NestingTooDeep {
                        position: source.len() - e.input.len(),
                    };
                }
                if e.input.is_empty() {
                    return CompileError::UnexpectedEnd;
                }
                CompileError::Syntax {
                    position: source.len() - e.input.len(),
                    message: format!("unexpected `{}` ({:?})", snippet(e.input), e.code),
                }
            }
        })?;

    if !remaining.is_empty() {
        return Err(CompileError::Syntax {
            position: source.len() - remaining.len(),
            message: format!("unexpected input `{}`", snippet(remaining)),
        });
    }

    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Ast {
        Node::Var(name.to_string())
    }

    fn num(v: f64) -> Ast {
        Node::Number(v)
    }

    fn single(source: &str) -> Ast {
        match parse_program(source).unwrap() {
            Node::Sequence(mut items) if items.len() == 1 => items.remove(0),
            other => panic!("expected one statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(single("42"), num(42.0));
        assert_eq!(single("3.25"), num(3.25));
        assert_eq!(single("2."), num(2.0));
        assert_eq!(single("10.125;"), num(10.125));
        assert_eq!(single("1.5e2"), num(150.0));
        assert_eq!(single(".5"), num(0.5));
        assert_eq!(single("1e3"), num(1000.0));
        assert_eq!(single("-2.5"), Node::unary(UnaryOp::Neg, num(2.5)));
    }

    #[test]
    fn test_parse_precedence() {
        assert_eq!(
            single("1 + 2 * 3"),
            Node::binary(
                BinaryOp::Add,
                num(1.0),
                Node::binary(BinaryOp::Mul, num(2.0), num(3.0))
            )
        );
        assert_eq!(
            single("x - y - z"),
            Node::binary(
                BinaryOp::Sub,
                Node::binary(BinaryOp::Sub, var("x"), var("y")),
                var("z")
            )
        );
    }

    #[test]
    fn test_parse_power_binds_tighter_than_negation() {
        assert_eq!(
            single("-2^2"),
            Node::unary(UnaryOp::Neg, Node::binary(BinaryOp::Pow, num(2.0), num(2.0)))
        );
        assert_eq!(
            single("2^3^2"),
            Node::binary(
                BinaryOp::Pow,
                num(2.0),
                Node::binary(BinaryOp::Pow, num(3.0), num(2.0))
            )
        );
    }

    #[test]
    fn test_parse_assignment_is_right_associative() {
        let parsed = single("x = y += 2");
        assert_eq!(
            parsed,
            Node::Assign {
                target: "x".to_string(),
                op: AssignOp::Set,
                value: Box::new(Node::Assign {
                    target: "y".to_string(),
                    op: AssignOp::Add,
                    value: Box::new(num(2.0)),
                }),
            }
        );
    }

    #[test]
    fn test_parse_comparison_not_assignment() {
        assert_eq!(
            single("x == 1"),
            Node::binary(BinaryOp::Eq, var("x"), num(1.0))
        );
        assert_eq!(
            single("x <= 1 && !y"),
            Node::binary(
                BinaryOp::And,
                Node::binary(BinaryOp::Le, var("x"), num(1.0)),
                Node::unary(UnaryOp::Not, var("y"))
            )
        );
    }

    #[test]
    fn test_parse_increments() {
        assert_eq!(single("i++"), step("i", 1.0, false));
        assert_eq!(single("--i"), step("i", -1.0, true));
    }

    #[test]
    fn test_parse_statements() {
        let program = parse_program("x = 1; y = 2 z = 3;").unwrap();
        match program {
            Node::Sequence(items) => assert_eq!(items.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_else() {
        let parsed = single("if (x > 0) y = 1; else { y = 2 }");
        match parsed {
            Node::Conditional {
                else_branch: Some(_),
                ..
            } => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_loops() {
        assert!(matches!(
            single("while (x < 10) x++"),
            Node::While {
                test_first: true,
                ..
            }
        ));
        assert!(matches!(
            single("do { x++ } while (x < 10)"),
            Node::While {
                test_first: false,
                ..
            }
        ));
        assert!(matches!(
            single("for (i = 0, 3) x += i"),
            Node::RangeFor { .. }
        ));
        assert!(matches!(
            single("for (i = 0; i < 3; i++) { if (i == 1) continue; x += i }"),
            Node::For { .. }
        ));
        assert!(matches!(single("for (;;) break"), Node::For { cond: None, .. }));
    }

    #[test]
    fn test_parse_ternary_and_call() {
        assert_eq!(
            single("x > 0 ? sin(x) : max(1, 2, 3)"),
            Node::Conditional {
                cond: Box::new(Node::binary(BinaryOp::Gt, var("x"), num(0.0))),
                then_branch: Box::new(Node::Call {
                    func: "sin".to_string(),
                    args: vec![var("x")],
                }),
                else_branch: Some(Box::new(Node::Call {
                    func: "max".to_string(),
                    args: vec![num(1.0), num(2.0), num(3.0)],
                })),
            }
        );
    }

    #[test]
    fn test_parse_comments_and_whitespace() {
        let program = parse_program("  // shift\n x = x + 1 // done\n").unwrap();
        assert_eq!(
            program,
            Node::Sequence(vec![Node::Assign {
                target: "x".to_string(),
                op: AssignOp::Set,
                value: Box::new(Node::binary(BinaryOp::Add, var("x"), num(1.0))),
            }])
        );
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_program("").unwrap(), Node::Sequence(Vec::new()));
    }

    #[test]
    fn test_parse_error_position() {
        match parse_program("x = (1 + 2") {
            Err(CompileError::UnexpectedEnd) => {}
            other => panic!("unexpected {:?}", other),
        }
        match parse_program("x = 1 )") {
            Err(CompileError::Syntax { position, .. }) => assert_eq!(position, 6),
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse_program("x = ").is_err());
        assert!(parse_program("while x").is_err());
    }

    #[test]
    fn test_parse_deep_nesting_is_rejected() {
        let sources = [
            format!("x = {}1{}", "(".repeat(5_000), ")".repeat(5_000)),
            format!("x = {}1", "- ".repeat(5_000)),
            format!("x = 1{}", " + 1".repeat(5_000)),
            format!("{}x = 1", "if (1) ".repeat(5_000)),
            format!("x = {}0{}", "sin(".repeat(5_000), ")".repeat(5_000)),
        ];
        for source in &sources {
            assert!(
                matches!(parse_program(source), Err(CompileError::NestingTooDeep { .. })),
                "{}",
                snippet(source)
            );
        }

        // levels are released after a failure
        let nested = format!("x = {}1{}", "(".repeat(40), ")".repeat(40));
        assert!(parse_program(&nested).is_ok());
        assert!(parse_program(&format!("x = 1{}", " + 1".repeat(100))).is_ok());
    }
}
