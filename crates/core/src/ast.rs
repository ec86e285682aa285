//! Grammar AST consumed by the rule composer.
//!
//! These types are produced by an external grammar front end and read by
//! the composer. They derive serde traits so that a front end can hand the
//! tree over as JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

// ──────────────────────────────────────────────
// Source positions
// ──────────────────────────────────────────────

/// 1-based line/column of the token an item was parsed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Pos { line, column }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ──────────────────────────────────────────────
// Rules and actions
// ──────────────────────────────────────────────

/// Top-level document handed over by the grammar front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

/// One independently composed extraction rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default)]
    pub pos: Pos,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// A single grammar instruction together with the position of its token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub pos: Pos,
    #[serde(flatten)]
    pub kind: ActionKind,
}

impl Action {
    pub fn new(pos: Pos, kind: ActionKind) -> Self {
        Action { pos, kind }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    /// `( ... )` -- optional region with no name; may not capture.
    AnonymousOption { actions: Vec<Action> },
    /// `?Name( ... )` -- optional region whose captures live under `Name`.
    NamedOptional { name: String, actions: Vec<Action> },
    /// `$` -- the input must be exhausted here.
    AtEnd,
    /// `!` -- subsequent mismatches in the rule are reported as errors.
    ErrorOnMismatch,
    MayBeStartChar { value: char },
    MayBeStartString { value: String },
    StartChar { value: char },
    StartString { value: String },
    /// `_[n:]` -- skip exactly `count` characters.
    PassFirst { count: usize },
    PassUntil { limit: Limit },
    PassUntilOrIgnore { limit: Limit },
    Take { field: Field, limit: Limit },
    TakeRest { field: Field },
    TakeUntilOrRest { field: Field, limit: Limit },
}

impl ActionKind {
    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::AnonymousOption { .. } => "anonymous_option",
            ActionKind::NamedOptional { .. } => "named_optional",
            ActionKind::AtEnd => "at_end",
            ActionKind::ErrorOnMismatch => "error_on_mismatch",
            ActionKind::MayBeStartChar { .. } => "may_be_start_char",
            ActionKind::MayBeStartString { .. } => "may_be_start_string",
            ActionKind::StartChar { .. } => "start_char",
            ActionKind::StartString { .. } => "start_string",
            ActionKind::PassFirst { .. } => "pass_first",
            ActionKind::PassUntil { .. } => "pass_until",
            ActionKind::PassUntilOrIgnore { .. } => "pass_until_or_ignore",
            ActionKind::Take { .. } => "take",
            ActionKind::TakeRest { .. } => "take_rest",
            ActionKind::TakeUntilOrRest { .. } => "take_until_or_rest",
        }
    }
}

// ──────────────────────────────────────────────
// Fields
// ──────────────────────────────────────────────

/// A named, typed output slot populated by a capture action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default)]
    pub pos: Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
    Bytes,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Int8 => "int8",
            FieldType::Int16 => "int16",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Uint8 => "uint8",
            FieldType::Uint16 => "uint16",
            FieldType::Uint32 => "uint32",
            FieldType::Uint64 => "uint64",
            FieldType::Float32 => "float32",
            FieldType::Float64 => "float64",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────────────────────────
// Limits
// ──────────────────────────────────────────────

/// Delimiter kind as written by the front end. Unknown kinds are kept
/// rather than rejected at load time so the composer can report them
/// against the offending action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LimitKind {
    Char,
    String,
    Unrecognized(String),
}

impl From<String> for LimitKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "char" => LimitKind::Char,
            "string" => LimitKind::String,
            _ => LimitKind::Unrecognized(s),
        }
    }
}

impl From<LimitKind> for String {
    fn from(kind: LimitKind) -> Self {
        match kind {
            LimitKind::Char => "char".to_string(),
            LimitKind::String => "string".to_string(),
            LimitKind::Unrecognized(s) => s,
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitKind::Char => f.write_str("char"),
            LimitKind::String => f.write_str("string"),
            LimitKind::Unrecognized(s) => write!(f, "'{}'", s),
        }
    }
}

/// Delimiter specification bounding a skip or capture.
///
/// `lower`/`upper` are character offsets from the cursor. When they are
/// equal and non-zero the delimiter must sit exactly at that offset;
/// otherwise it is searched for within the window (`0` meaning unbounded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    pub kind: LimitKind,
    pub value: String,
    #[serde(default)]
    pub lower: usize,
    #[serde(default)]
    pub upper: usize,
    /// The delimiter itself is consumed by the match.
    #[serde(default)]
    pub close: bool,
}

/// A delimiter literal with its kind resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Char(char),
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Char(c) => write!(f, "{:?}", c),
            Literal::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl Limit {
    pub fn char(value: char) -> Self {
        Limit {
            kind: LimitKind::Char,
            value: value.to_string(),
            lower: 0,
            upper: 0,
            close: false,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Limit {
            kind: LimitKind::String,
            value: value.into(),
            lower: 0,
            upper: 0,
            close: false,
        }
    }

    pub fn bounded(mut self, lower: usize, upper: usize) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn closed(mut self) -> Self {
        self.close = true;
        self
    }

    /// The delimiter must appear exactly at offset `lower`.
    pub fn is_fixed(&self) -> bool {
        self.lower == self.upper && self.lower > 0
    }

    /// Resolves the delimiter literal. `None` when the kind is not
    /// recognized or a char limit does not hold exactly one character.
    pub fn literal(&self) -> Option<Literal> {
        match self.kind {
            LimitKind::String => Some(Literal::String(self.value.clone())),
            LimitKind::Char => {
                let mut chars = self.value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Literal::Char(c)),
                    _ => None,
                }
            }
            LimitKind::Unrecognized(_) => None,
        }
    }
}
