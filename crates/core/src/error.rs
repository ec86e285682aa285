use crate::ast::{FieldType, LimitKind, Pos};

/// Failures reported by an [`Emitter`](crate::emitter::Emitter) or by the
/// checkpoint tracker it hands out for a rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmitError {
    /// A rule with this name has already been committed.
    #[error("rule '{name}' is already defined")]
    RuleExists { name: String },

    /// A checkpoint was registered under a path the rule has already left.
    #[error("'{path}' is re-entered after its scope was left")]
    ScopeReentered { path: String },

    /// A scope close with no scope open.
    #[error("no open scope to close")]
    UnbalancedScope,

    /// An operation arrived outside of a begun rule.
    #[error("no rule is being composed")]
    NoActiveRule,

    #[error("{0}")]
    Rejected(String),
}

/// What went wrong while composing one rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComposeError {
    #[error("cannot {what} while being in anonymous area")]
    ScopeViolation { what: &'static str },

    #[error("wrong {what} identifier {name}, must be {expected}")]
    InvalidIdentifier {
        what: &'static str,
        name: String,
        expected: String,
    },

    #[error("field {path} of type {ty} is already declared")]
    DuplicateField { path: String, ty: FieldType },

    #[error("{action}: integrity error, unexpected delimiter {kind} with value {value:?}")]
    MalformedLimit {
        action: &'static str,
        kind: LimitKind,
        value: String,
    },

    #[error("checkpoint rejected: {0}")]
    CheckpointViolation(#[source] EmitError),

    #[error(transparent)]
    EmitterRejection(EmitError),
}

impl ComposeError {
    /// Stable machine-readable name of the error class.
    pub fn code(&self) -> &'static str {
        match self {
            ComposeError::ScopeViolation { .. } => "scope_violation",
            ComposeError::InvalidIdentifier { .. } => "invalid_identifier",
            ComposeError::DuplicateField { .. } => "duplicate_field",
            ComposeError::MalformedLimit { .. } => "malformed_limit",
            ComposeError::CheckpointViolation(_) => "checkpoint_violation",
            ComposeError::EmitterRejection(_) => "emitter_rejection",
        }
    }
}

/// A composition failure located at the offending token of a rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{pos}: {error}")]
pub struct RuleError {
    pub rule: String,
    pub pos: Pos,
    #[source]
    pub error: ComposeError,
}

impl RuleError {
    pub fn new(rule: &str, pos: Pos, error: ComposeError) -> Self {
        RuleError {
            rule: rule.to_owned(),
            pos,
            error,
        }
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "code":    self.error.code(),
            "column":  self.pos.column,
            "line":    self.pos.line,
            "message": self.error.to_string(),
            "rule":    self.rule,
        })
    }
}

/// Errors raised while loading a rule set.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("error reading '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing rules in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
