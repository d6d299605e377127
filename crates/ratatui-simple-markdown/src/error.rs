use thiserror::Error;

/// A failure anywhere in a render pass (rule lookup, parsing, rendering).
///
/// All variants belong to the same category: the pass produces no content and the error is
/// handed to the caller's error handler, or logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("no rule named `{rule}` in the rule table")]
    MissingRule { rule: String },

    #[error("document nesting exceeds {depth} levels")]
    NestingTooDeep { depth: usize },

    #[error("rule `{rule}` failed: {message}")]
    Rule { rule: String, message: String },
}

impl RenderError {
    pub fn missing_rule(rule: impl Into<String>) -> Self {
        RenderError::MissingRule { rule: rule.into() }
    }

    /// Builds the error a custom rule output returns when it cannot render a node.
    pub fn rule(rule: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::Rule {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
