//! Expression language
//!
//! Small statement language over `f64` values used to remap coordinates.
//! Source is parsed once with nom, names are resolved to slots and constant
//! subtrees are folded; the resulting [`Expression`] can then be evaluated any
//! number of times. Each evaluation starts from freshly bound variables and
//! unbound locals, so results never leak between calls.
//!
//! ```
//! use voxdeform::expression::{Bindings, Expression};
//!
//! let expr = Expression::compile("x = x * 2; y = -y").unwrap();
//! let out = expr.evaluate(Bindings::new(1.5, 2.0, 0.0)).unwrap();
//! assert_eq!(out.bindings, Bindings::new(3.0, -2.0, 0.0));
//! ```

pub mod ast;
mod compiler;
mod error;
mod eval;
pub mod functions;
pub mod parser;

use std::fmt;
use std::time::Instant;

use glam::DVec3;

pub use error::{CompileError, EvalError};
pub use functions::Builtin;

use compiler::Program;

/// Variable names bound by [`Expression::compile`]
pub const DEFAULT_VARIABLES: [&str; 3] = ["x", "y", "z"];

/// Values of the three bound variables
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bindings {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Bindings {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<DVec3> for Bindings {
    fn from(v: DVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Bindings> for DVec3 {
    fn from(b: Bindings) -> Self {
        DVec3::new(b.x, b.y, b.z)
    }
}

/// Bounds on a single evaluation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvalLimits {
    /// Total loop iterations allowed across all loops
    pub max_loop_iterations: Option<u64>,
    /// Evaluation fails once this instant has passed (checked inside loops)
    pub deadline: Option<Instant>,
}

impl EvalLimits {
    pub fn with_max_loop_iterations(mut self, max: u64) -> Self {
        self.max_loop_iterations = Some(max);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Result of one evaluation: final variable values and the program's value
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub bindings: Bindings,
    pub value: f64,
}

/// A compiled expression
#[derive(Clone, Debug)]
pub struct Expression {
    source: String,
    program: Program,
    slot_names: Vec<String>,
}

impl Expression {
    /// Compile with the variables `x`, `y` and `z`
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        Self::compile_with(source, DEFAULT_VARIABLES)
    }

    /// Compile with custom names for the three bound variables
    pub fn compile_with(source: &str, variables: [&str; 3]) -> Result<Self, CompileError> {
        let ast = parser::parse_program(source)?;
        let (program, slot_names) = compiler::compile(&ast, variables)?;
        log::debug!(
            "Compiled expression `{}` ({} locals)",
            source,
            slot_names.len() - variables.len()
        );
        Ok(Self {
            source: source.to_string(),
            program,
            slot_names,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of the bound variables, in binding order
    pub fn variables(&self) -> [&str; 3] {
        [
            self.slot_names[0].as_str(),
            self.slot_names[1].as_str(),
            self.slot_names[2].as_str(),
        ]
    }

    /// Evaluate without limits
    pub fn evaluate(&self, bindings: Bindings) -> Result<Evaluation, EvalError> {
        self.evaluate_with(bindings, &EvalLimits::default())
    }

    pub fn evaluate_with(
        &self,
        bindings: Bindings,
        limits: &EvalLimits,
    ) -> Result<Evaluation, EvalError> {
        eval::Machine::run(&self.program, &self.slot_names, bindings, limits)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
