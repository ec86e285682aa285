#![allow(clippy::result_large_err)]
//! lde-core: rule composer for line data extraction.
//!
//! Takes the parsed grammar of an extraction rule and turns it into an
//! ordered program of primitive line-scanning operations, enforcing the
//! structural rules of the language on the way.
//!
//! # Public API
//!
//! - [`Composer`] -- validates one rule and commits its operations
//! - [`compose_rules()`] -- composes a whole rule set, rule by rule
//! - [`Emitter`] / [`Gravity`] -- the contract an operation sink implements
//! - [`PlanEmitter`] -- reference emitter recording a [`RulePlan`] per rule
//! - [`Normalizer`] -- identifier policies ([`SnakeCase`], [`PublicCamel`])
//! - [`load_rules()`] -- reads a JSON rule set through a [`SourceProvider`]
//! - AST types: [`Rule`], [`Action`], [`ActionKind`], [`Field`], [`Limit`]

pub mod ast;
pub mod compose;
pub mod emitter;
pub mod error;
pub mod normalize;
pub mod op;
pub mod plan;
pub mod session;
pub mod source;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{Action, ActionKind, Field, FieldType, Limit, LimitKind, Literal, Pos, Rule, RuleSet};
pub use compose::Composer;
pub use emitter::{Emitter, Gravity};
pub use error::{ComposeError, EmitError, LoadError, RuleError};
pub use normalize::{NamingPolicy, Normalizer, PublicCamel, SnakeCase};
pub use op::Op;
pub use plan::{PlanEmitter, RulePlan, ScopeGravity};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use session::{compose_rules, SessionReport};
pub use source::{load_rules, FileSystemProvider, InMemoryProvider, SourceProvider};
