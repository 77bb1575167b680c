//! Expression syntax tree and operator semantics.
//!
//! `Node` is generic over how variables and functions are referenced: the
//! parser produces names (`Ast`), the compiler replaces them with slot indices
//! and resolved built-ins.

use super::error::EvalError;

/// Binary operators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

/// Unary operators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Assignment operators (`=`, `+=`, ...)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

/// A value is true iff it is strictly positive.
pub fn truthy(v: f64) -> bool {
    v > 0.0
}

/// 1.0 for true, 0.0 for false
pub fn bool_value(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

impl BinaryOp {
    /// Apply to two evaluated operands.
    ///
    /// `And`/`Or` are evaluated eagerly here; the interpreter short-circuits
    /// them before reaching this point.
    pub fn apply(self, a: f64, b: f64) -> Result<f64, EvalError> {
        Ok(match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => {
                if b == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                a / b
            }
            BinaryOp::Rem => {
                if b == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                a % b
            }
            BinaryOp::Pow => a.powf(b),
            BinaryOp::Lt => bool_value(a < b),
            BinaryOp::Le => bool_value(a <= b),
            BinaryOp::Gt => bool_value(a > b),
            BinaryOp::Ge => bool_value(a >= b),
            BinaryOp::Eq => bool_value(a == b),
            BinaryOp::Ne => bool_value(a != b),
            BinaryOp::And => bool_value(truthy(a) && truthy(b)),
            BinaryOp::Or => bool_value(truthy(a) || truthy(b)),
        })
    }
}

impl UnaryOp {
    pub fn apply(self, v: f64) -> f64 {
        match self {
            UnaryOp::Neg => -v,
            UnaryOp::Not => bool_value(!truthy(v)),
        }
    }
}

impl AssignOp {
    /// Operator combining the old value with the right-hand side, if any.
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Set => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
            AssignOp::Rem => Some(BinaryOp::Rem),
            AssignOp::Pow => Some(BinaryOp::Pow),
        }
    }
}

/// Expression tree node. Every node evaluates to a number; statements yield
/// the value of their last evaluated expression (loops yield 0).
#[derive(Clone, Debug, PartialEq)]
pub enum Node<V, F> {
    Number(f64),
    Var(V),
    Assign {
        target: V,
        op: AssignOp,
        value: Box<Node<V, F>>,
    },
    /// `++x`, `x++`, `--x`, `x--`
    Step {
        target: V,
        delta: f64,
        prefix: bool,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node<V, F>>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Node<V, F>>,
        rhs: Box<Node<V, F>>,
    },
    /// `if`/`else` statements and `?:`
    Conditional {
        cond: Box<Node<V, F>>,
        then_branch: Box<Node<V, F>>,
        else_branch: Option<Box<Node<V, F>>>,
    },
    Call {
        func: F,
        args: Vec<Node<V, F>>,
    },
    Sequence(Vec<Node<V, F>>),
    /// `while (cond) body` or, with `test_first == false`, `do body while (cond)`
    While {
        cond: Box<Node<V, F>>,
        body: Box<Node<V, F>>,
        test_first: bool,
    },
    /// `for (init; cond; step) body`
    For {
        init: Option<Box<Node<V, F>>>,
        cond: Option<Box<Node<V, F>>>,
        step: Option<Box<Node<V, F>>>,
        body: Box<Node<V, F>>,
    },
    /// `for (counter = first, last) body`, inclusive, step 1
    RangeFor {
        counter: V,
        first: Box<Node<V, F>>,
        last: Box<Node<V, F>>,
        body: Box<Node<V, F>>,
    },
    Break,
    Continue,
    Return(Option<Box<Node<V, F>>>),
}

/// Parsed, unresolved tree: variables and functions by name.
pub type Ast = Node<String, String>;

impl<V, F> Node<V, F> {
    pub fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        Node::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: UnaryOp, operand: Self) -> Self {
        Node::Unary {
            op,
            operand: Box::new(operand),
        }
    }
}
