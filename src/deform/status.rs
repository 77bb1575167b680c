//! Status descriptors reported by running operations

use std::fmt;

use serde::Serialize;

/// Message key for expression deformations
pub const DEFORM_EXPRESSION_KEY: &str = "operation.deform.expression";

/// Localizable status line: a message key plus its argument.
/// Formatting and translation are up to the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub key: &'static str,
    pub text: String,
}

impl StatusMessage {
    pub fn deform_expression(source: &str) -> Self {
        Self {
            key: DEFORM_EXPRESSION_KEY,
            text: source.to_string(),
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.text)
    }
}
