//! Tree-walking interpreter for compiled programs

use std::time::Instant;

use super::ast::{BinaryOp, Node, bool_value, truthy};
use super::compiler::{PARAMETER_COUNT, Program};
use super::error::EvalError;
use super::functions::MAX_ARITY;
use super::{Bindings, EvalLimits, Evaluation};

/// Loop iterations between deadline checks
const DEADLINE_POLL_INTERVAL: u64 = 256;

/// Non-local exits unwinding through the evaluator
enum Interrupt {
    Break,
    Continue,
    Return(f64),
    Error(EvalError),
}

impl From<EvalError> for Interrupt {
    fn from(e: EvalError) -> Self {
        Interrupt::Error(e)
    }
}

type Exec = Result<f64, Interrupt>;

/// What a loop does after its body ran
enum LoopControl {
    Next,
    Exit,
}

pub struct Machine<'a> {
    slots: Vec<Option<f64>>,
    names: &'a [String],
    limits: &'a EvalLimits,
    iterations: u64,
}

impl<'a> Machine<'a> {
    /// Evaluate `program` once. Locals start unbound on every run.
    pub fn run(
        program: &Program,
        names: &'a [String],
        bindings: Bindings,
        limits: &'a EvalLimits,
    ) -> Result<Evaluation, EvalError> {
        let mut slots = vec![None; names.len().max(PARAMETER_COUNT)];
        slots[0] = Some(bindings.x);
        slots[1] = Some(bindings.y);
        slots[2] = Some(bindings.z);

        let mut machine = Machine {
            slots,
            names,
            limits,
            iterations: 0,
        };

        let value = match machine.exec(program) {
            Ok(v) | Err(Interrupt::Return(v)) => v,
            Err(Interrupt::Error(e)) => return Err(e),
            // Rejected at compile time
            Err(Interrupt::Break | Interrupt::Continue) => 0.0,
        };

        Ok(Evaluation {
            bindings: Bindings {
                x: machine.slots[0].unwrap_or_default(),
                y: machine.slots[1].unwrap_or_default(),
                z: machine.slots[2].unwrap_or_default(),
            },
            value,
        })
    }

    fn read(&self, slot: usize) -> Result<f64, EvalError> {
        self.slots[slot].ok_or_else(|| {
            EvalError::UnboundVariable(self.names.get(slot).cloned().unwrap_or_default())
        })
    }

    /// Count one loop iteration against the configured limits
    fn tick(&mut self) -> Result<(), EvalError> {
        self.iterations += 1;
        if let Some(max) = self.limits.max_loop_iterations {
            if self.iterations > max {
                return Err(EvalError::LoopLimitExceeded(max));
            }
        }
        if self.iterations % DEADLINE_POLL_INTERVAL == 0 {
            if let Some(deadline) = self.limits.deadline {
                if Instant::now() >= deadline {
                    return Err(EvalError::DeadlineExceeded);
                }
            }
        }
        Ok(())
    }

    /// Run a loop body once, translating `break`/`continue`
    fn body(&mut self, body: &Program) -> Result<LoopControl, Interrupt> {
        self.tick()?;
        match self.exec(body) {
            Ok(_) | Err(Interrupt::Continue) => Ok(LoopControl::Next),
            Err(Interrupt::Break) => Ok(LoopControl::Exit),
            Err(e) => Err(e),
        }
    }

    fn condition(&mut self, cond: &Program) -> Result<bool, Interrupt> {
        Ok(truthy(self.exec(cond)?))
    }

    fn exec(&mut self, node: &Program) -> Exec {
        match node {
            Node::Number(v) => Ok(*v),
            Node::Var(slot) => Ok(self.read(*slot)?),
            Node::Assign { target, op, value } => {
                let rhs = self.exec(value)?;
                let result = match op.binary() {
                    None => rhs,
                    Some(bin) => bin.apply(self.read(*target)?, rhs)?,
                };
                self.slots[*target] = Some(result);
                Ok(result)
            }
            Node::Step {
                target,
                delta,
                prefix,
            } => {
                let old = self.read(*target)?;
                let new = old + delta;
                self.slots[*target] = Some(new);
                Ok(if *prefix { new } else { old })
            }
            Node::Unary { op, operand } => Ok(op.apply(self.exec(operand)?)),
            Node::Binary {
                op: BinaryOp::And,
                lhs,
                rhs,
            } => {
                if !self.condition(lhs)? {
                    return Ok(0.0);
                }
                Ok(bool_value(self.condition(rhs)?))
            }
            Node::Binary {
                op: BinaryOp::Or,
                lhs,
                rhs,
            } => {
                if self.condition(lhs)? {
                    return Ok(1.0);
                }
                Ok(bool_value(self.condition(rhs)?))
            }
            Node::Binary { op, lhs, rhs } => {
                let a = self.exec(lhs)?;
                let b = self.exec(rhs)?;
                Ok(op.apply(a, b)?)
            }
            Node::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.condition(cond)? {
                    self.exec(then_branch)
                } else if let Some(e) = else_branch {
                    self.exec(e)
                } else {
                    Ok(0.0)
                }
            }
            Node::Call { func, args } => {
                let mut values = [0.0; MAX_ARITY];
                for (slot, arg) in values.iter_mut().zip(args) {
                    *slot = self.exec(arg)?;
                }
                Ok(func.apply(&values[..args.len()]))
            }
            Node::Sequence(items) => {
                let mut last = 0.0;
                for item in items {
                    last = self.exec(item)?;
                }
                Ok(last)
            }
            Node::While {
                cond,
                body,
                test_first,
            } => {
                if *test_first {
                    while self.condition(cond)? {
                        if let LoopControl::Exit = self.body(body)? {
                            break;
                        }
                    }
                } else {
                    loop {
                        if let LoopControl::Exit = self.body(body)? {
                            break;
                        }
                        if !self.condition(cond)? {
                            break;
                        }
                    }
                }
                Ok(0.0)
            }
            Node::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.exec(init)?;
                }
                loop {
                    if let Some(cond) = cond {
                        if !self.condition(cond)? {
                            break;
                        }
                    }
                    if let LoopControl::Exit = self.body(body)? {
                        break;
                    }
                    if let Some(step) = step {
                        self.exec(step)?;
                    }
                }
                Ok(0.0)
            }
            Node::RangeFor {
                counter,
                first,
                last,
                body,
            } => {
                let mut i = self.exec(first)?;
                let last = self.exec(last)?;
                while i <= last {
                    self.slots[*counter] = Some(i);
                    if let LoopControl::Exit = self.body(body)? {
                        break;
                    }
                    i += 1.0;
                }
                Ok(0.0)
            }
            Node::Break => Err(Interrupt::Break),
            Node::Continue => Err(Interrupt::Continue),
            Node::Return(value) => {
                let v = match value {
                    Some(v) => self.exec(v)?,
                    None => 0.0,
                };
                Err(Interrupt::Return(v))
            }
        }
    }
}
