//! Name resolution and constant folding.
//!
//! Variables become slot indices: the three bound variables occupy slots 0..3,
//! locals follow in order of first appearance. Constants are inlined and calls
//! are bound to [`Builtin`]s with their arity checked.

use std::collections::HashSet;

use super::ast::{Ast, BinaryOp, Node, truthy};
use super::error::CompileError;
use super::functions::Builtin;

/// Resolved program: variables by slot, functions by built-in
pub type Program = Node<usize, Builtin>;

/// Number of externally bound variables
pub const PARAMETER_COUNT: usize = 3;

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        "true" => Some(1.0),
        "false" => Some(0.0),
        _ => None,
    }
}

/// Compile a parsed tree, returning the program and the name of every slot.
pub fn compile(
    ast: &Ast,
    variables: [&str; PARAMETER_COUNT],
) -> Result<(Program, Vec<String>), CompileError> {
    let mut resolver = Resolver::new(variables, ast)?;
    let program = resolver.resolve(ast, 0)?;
    Ok((fold(program), resolver.names))
}

struct Resolver {
    names: Vec<String>,
    assigned: HashSet<String>,
}

impl Resolver {
    fn new(variables: [&str; PARAMETER_COUNT], ast: &Ast) -> Result<Self, CompileError> {
        let mut names: Vec<String> = Vec::with_capacity(PARAMETER_COUNT);
        for v in variables {
            if names.iter().any(|n| n == v) {
                return Err(CompileError::DuplicateVariable(v.to_string()));
            }
            names.push(v.to_string());
        }

        let mut assigned = HashSet::new();
        collect_assigned(ast, &mut assigned);

        Ok(Self { names, assigned })
    }

    fn slot(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn allocate(&mut self, name: &str) -> usize {
        self.names.push(name.to_string());
        self.names.len() - 1
    }

    fn read(&mut self, name: &str) -> Result<Program, CompileError> {
        if let Some(slot) = self.slot(name) {
            return Ok(Node::Var(slot));
        }
        if let Some(v) = constant(name) {
            return Ok(Node::Number(v));
        }
        if self.assigned.contains(name) {
            return Ok(Node::Var(self.allocate(name)));
        }
        Err(CompileError::UnresolvedIdentifier(name.to_string()))
    }

    fn write(&mut self, name: &str) -> Result<usize, CompileError> {
        if let Some(slot) = self.slot(name) {
            return Ok(slot);
        }
        if constant(name).is_some() {
            return Err(CompileError::ReadOnly(name.to_string()));
        }
        Ok(self.allocate(name))
    }

    fn boxed(&mut self, node: &Ast, depth: usize) -> Result<Box<Program>, CompileError> {
        Ok(Box::new(self.resolve(node, depth)?))
    }

    fn optional(
        &mut self,
        node: &Option<Box<Ast>>,
        depth: usize,
    ) -> Result<Option<Box<Program>>, CompileError> {
        node.as_deref().map(|n| self.boxed(n, depth)).transpose()
    }

    /// `depth` counts enclosing loops for `break`/`continue` validation.
    fn resolve(&mut self, node: &Ast, depth: usize) -> Result<Program, CompileError> {
        Ok(match node {
            Node::Number(v) => Node::Number(*v),
            Node::Var(name) => self.read(name)?,
            Node::Assign { target, op, value } => {
                let value = self.boxed(value, depth)?;
                Node::Assign {
                    target: self.write(target)?,
                    op: *op,
                    value,
                }
            }
            Node::Step {
                target,
                delta,
                prefix,
            } => Node::Step {
                target: self.write(target)?,
                delta: *delta,
                prefix: *prefix,
            },
            Node::Unary { op, operand } => Node::Unary {
                op: *op,
                operand: self.boxed(operand, depth)?,
            },
            Node::Binary { op, lhs, rhs } => Node::Binary {
                op: *op,
                lhs: self.boxed(lhs, depth)?,
                rhs: self.boxed(rhs, depth)?,
            },
            Node::Conditional {
                cond,
                then_branch,
                else_branch,
            } => Node::Conditional {
                cond: self.boxed(cond, depth)?,
                then_branch: self.boxed(then_branch, depth)?,
                else_branch: self.optional(else_branch, depth)?,
            },
            Node::Call { func, args } => {
                let builtin = Builtin::from_name(func)
                    .ok_or_else(|| CompileError::UnknownFunction(func.clone()))?;
                let (lo, hi) = builtin.arity();
                if args.len() < lo || args.len() > hi {
                    return Err(CompileError::Arity {
                        name: func.clone(),
                        expected: builtin.arity_description(),
                        found: args.len(),
                    });
                }
                Node::Call {
                    func: builtin,
                    args: args
                        .iter()
                        .map(|a| self.resolve(a, depth))
                        .collect::<Result<_, _>>()?,
                }
            }
            Node::Sequence(items) => Node::Sequence(
                items
                    .iter()
                    .map(|item| self.resolve(item, depth))
                    .collect::<Result<_, _>>()?,
            ),
            Node::While {
                cond,
                body,
                test_first,
            } => Node::While {
                cond: self.boxed(cond, depth)?,
                body: self.boxed(body, depth + 1)?,
                test_first: *test_first,
            },
            Node::For {
                init,
                cond,
                step,
                body,
            } => Node::For {
                init: self.optional(init, depth)?,
                cond: self.optional(cond, depth)?,
                step: self.optional(step, depth)?,
                body: self.boxed(body, depth + 1)?,
            },
            Node::RangeFor {
                counter,
                first,
                last,
                body,
            } => {
                let first = self.boxed(first, depth)?;
                let last = self.boxed(last, depth)?;
                Node::RangeFor {
                    counter: self.write(counter)?,
                    first,
                    last,
                    body: self.boxed(body, depth + 1)?,
                }
            }
            Node::Break if depth == 0 => return Err(CompileError::MisplacedControl("break")),
            Node::Continue if depth == 0 => {
                return Err(CompileError::MisplacedControl("continue"));
            }
            Node::Break => Node::Break,
            Node::Continue => Node::Continue,
            Node::Return(value) => Node::Return(self.optional(value, depth)?),
        })
    }
}

/// Every name that is the target of an assignment anywhere in the tree
fn collect_assigned(node: &Ast, out: &mut HashSet<String>) {
    match node {
        Node::Number(_) | Node::Var(_) | Node::Break | Node::Continue => {}
        Node::Assign { target, value, .. } => {
            out.insert(target.clone());
            collect_assigned(value, out);
        }
        Node::Step { target, .. } => {
            out.insert(target.clone());
        }
        Node::Unary { operand, .. } => collect_assigned(operand, out),
        Node::Binary { lhs, rhs, .. } => {
            collect_assigned(lhs, out);
            collect_assigned(rhs, out);
        }
        Node::Conditional {
            cond,
            then_branch,
            else_branch,
        } => {
            collect_assigned(cond, out);
            collect_assigned(then_branch, out);
            if let Some(e) = else_branch {
                collect_assigned(e, out);
            }
        }
        Node::Call { args, .. } => args.iter().for_each(|a| collect_assigned(a, out)),
        Node::Sequence(items) => items.iter().for_each(|i| collect_assigned(i, out)),
        Node::While { cond, body, .. } => {
            collect_assigned(cond, out);
            collect_assigned(body, out);
        }
        Node::For {
            init,
            cond,
            step,
            body,
        } => {
            for part in [init, cond, step].into_iter().flatten() {
                collect_assigned(part, out);
            }
            collect_assigned(body, out);
        }
        Node::RangeFor {
            counter,
            first,
            last,
            body,
        } => {
            out.insert(counter.clone());
            collect_assigned(first, out);
            collect_assigned(last, out);
            collect_assigned(body, out);
        }
        Node::Return(value) => {
            if let Some(v) = value {
                collect_assigned(v, out);
            }
        }
    }
}

fn fold_boxed(node: Box<Program>) -> Box<Program> {
    Box::new(fold(*node))
}

fn fold_optional(node: Option<Box<Program>>) -> Option<Box<Program>> {
    node.map(fold_boxed)
}

/// Evaluate constant subtrees. Operations that would raise at runtime (such
/// as division by a constant zero) are left in place.
pub fn fold(node: Program) -> Program {
    match node {
        Node::Unary { op, operand } => match fold(*operand) {
            Node::Number(v) => Node::Number(op.apply(v)),
            operand => Node::unary(op, operand),
        },
        Node::Binary { op, lhs, rhs } => {
            let lhs = fold(*lhs);
            let rhs = fold(*rhs);
            match (&lhs, &rhs) {
                (Node::Number(a), _) if op == BinaryOp::And && !truthy(*a) => Node::Number(0.0),
                (Node::Number(a), _) if op == BinaryOp::Or && truthy(*a) => Node::Number(1.0),
                (Node::Number(a), Node::Number(b)) => match op.apply(*a, *b) {
                    Ok(v) => Node::Number(v),
                    Err(_) => Node::binary(op, lhs, rhs),
                },
                _ => Node::binary(op, lhs, rhs),
            }
        }
        Node::Conditional {
            cond,
            then_branch,
            else_branch,
        } => match fold(*cond) {
            Node::Number(c) if truthy(c) => fold(*then_branch),
            Node::Number(_) => match else_branch {
                Some(e) => fold(*e),
                None => Node::Number(0.0),
            },
            cond => Node::Conditional {
                cond: Box::new(cond),
                then_branch: fold_boxed(then_branch),
                else_branch: fold_optional(else_branch),
            },
        },
        Node::Call { func, args } => {
            let args: Vec<Program> = args.into_iter().map(fold).collect();
            let constants: Option<Vec<f64>> = args
                .iter()
                .map(|a| match a {
                    Node::Number(v) => Some(*v),
                    _ => None,
                })
                .collect();
            match constants {
                Some(values) => Node::Number(func.apply(&values)),
                None => Node::Call { func, args },
            }
        }
        Node::Sequence(items) => {
            let mut flat = Vec::with_capacity(items.len());
            for item in items {
                match fold(item) {
                    Node::Sequence(inner) => flat.extend(inner),
                    other => flat.push(other),
                }
            }
            if flat.len() == 1 {
                flat.remove(0)
            } else {
                Node::Sequence(flat)
            }
        }
        Node::Assign { target, op, value } => Node::Assign {
            target,
            op,
            value: fold_boxed(value),
        },
        Node::While {
            cond,
            body,
            test_first,
        } => Node::While {
            cond: fold_boxed(cond),
            body: fold_boxed(body),
            test_first,
        },
        Node::For {
            init,
            cond,
            step,
            body,
        } => Node::For {
            init: fold_optional(init),
            cond: fold_optional(cond),
            step: fold_optional(step),
            body: fold_boxed(body),
        },
        Node::RangeFor {
            counter,
            first,
            last,
            body,
        } => Node::RangeFor {
            counter,
            first: fold_boxed(first),
            last: fold_boxed(last),
            body: fold_boxed(body),
        },
        Node::Return(value) => Node::Return(fold_optional(value)),
        leaf @ (Node::Number(_) | Node::Var(_) | Node::Step { .. } | Node::Break | Node::Continue) => {
            leaf
        }
    }
}
