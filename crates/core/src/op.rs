//! Primitive scan operations in the order an emitter receives them.

use crate::ast::{FieldType, Literal, Pos};
use serde::Serialize;
use std::fmt;

/// One call on the [`Emitter`](crate::emitter::Emitter), captured as a
/// value so that a rule's calls can be queued and replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    OpenUnnamedScope {
        pos: Pos,
    },
    CloseUnnamedScope,
    OpenNamedScope {
        name: String,
        pos: Pos,
    },
    CloseNamedScope,
    Checkpoint {
        path: String,
    },
    AtEnd,
    Stress,
    Head {
        literal: Literal,
        optional: bool,
    },
    PassFirst {
        count: usize,
    },
    /// Delimiter must sit exactly at `offset`.
    LookupFixed {
        literal: Literal,
        offset: usize,
        ignore: bool,
    },
    /// Delimiter is searched for within `[lower, upper]`.
    Lookup {
        literal: Literal,
        lower: usize,
        upper: usize,
        close: bool,
        ignore: bool,
    },
    DeclareField {
        name: String,
        ty: FieldType,
        pos: Pos,
    },
    TakeBefore {
        name: String,
        ty: FieldType,
        literal: Literal,
        lower: usize,
        upper: usize,
        close: bool,
        or_rest: bool,
    },
    TakeRest {
        name: String,
        ty: FieldType,
    },
}

fn window(lower: usize, upper: usize) -> String {
    match (lower, upper) {
        (0, 0) => String::new(),
        (l, 0) => format!("[{}:]", l),
        (l, u) => format!("[{}:{}]", l, u),
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::OpenUnnamedScope { .. } => write!(f, "open ()"),
            Op::CloseUnnamedScope => write!(f, "close ()"),
            Op::OpenNamedScope { name, .. } => write!(f, "open ?{}", name),
            Op::CloseNamedScope => write!(f, "close ?"),
            Op::Checkpoint { path } => write!(f, "checkpoint {:?}", path),
            Op::AtEnd => write!(f, "at end"),
            Op::Stress => write!(f, "stress"),
            Op::Head { literal, optional } => {
                let mark = if *optional { "?" } else { "" };
                write!(f, "head{} {}", mark, literal)
            }
            Op::PassFirst { count } => write!(f, "pass {}", count),
            Op::LookupFixed {
                literal,
                offset,
                ignore,
            } => {
                let mark = if *ignore { "?" } else { "" };
                write!(f, "lookup{} {} at {}", mark, literal, offset)
            }
            Op::Lookup {
                literal,
                lower,
                upper,
                close,
                ignore,
            } => {
                let mark = if *ignore { "?" } else { "" };
                let close = if *close { " close" } else { "" };
                write!(f, "lookup{} {}{}{}", mark, literal, window(*lower, *upper), close)
            }
            Op::DeclareField { name, ty, .. } => write!(f, "field {} {}", name, ty),
            Op::TakeBefore {
                name,
                literal,
                lower,
                upper,
                close,
                or_rest,
                ..
            } => {
                let close = if *close { " close" } else { "" };
                let rest = if *or_rest { " or rest" } else { "" };
                write!(
                    f,
                    "take {} before {}{}{}{}",
                    name,
                    literal,
                    window(*lower, *upper),
                    close,
                    rest
                )
            }
            Op::TakeRest { name, .. } => write!(f, "take {} rest", name),
        }
    }
}
