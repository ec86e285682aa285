//! Reference emitter that records the committed operations of every rule as
//! a plan, plus the checkpoint policy it enforces.

use crate::ast::{FieldType, Literal, Pos};
use crate::emitter::{Emitter, Gravity};
use crate::error::EmitError;
use crate::op::Op;
use serde::Serialize;
use std::fmt;

// ──────────────────────────────────────────────
// Checkpoint policy
// ──────────────────────────────────────────────

/// Checkpoint policy: a rule walks its qualified paths depth first and never
/// comes back. Once a checkpoint lands outside a path, that path is closed,
/// and any later checkpoint at it or below it is rejected. The root path is
/// never closed.
#[derive(Debug, Default, Clone)]
pub struct ScopeGravity {
    current: String,
    closed: Vec<String>,
}

/// `path` is `scope` or lies below it.
fn within(path: &str, scope: &str) -> bool {
    match path.strip_prefix(scope) {
        Some(rest) => !scope.is_empty() && (rest.is_empty() || rest.starts_with('.')),
        None => false,
    }
}

/// Non-root ancestors of `path`, outermost first, `path` itself included.
fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('.')
        .map(move |(i, _)| &path[..i])
        .chain((!path.is_empty()).then_some(path))
}

impl Gravity for ScopeGravity {
    fn register(&mut self, path: &str) -> Result<(), EmitError> {
        if self.closed.iter().any(|c| within(path, c)) {
            return Err(EmitError::ScopeReentered {
                path: path.to_owned(),
            });
        }
        for scope in ancestors(&self.current) {
            if !within(path, scope) && !self.closed.iter().any(|c| c == scope) {
                self.closed.push(scope.to_owned());
            }
        }
        self.current = path.to_owned();
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Plan emitter
// ──────────────────────────────────────────────

/// The committed operations of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulePlan {
    pub name: String,
    pub pos: Pos,
    pub ops: Vec<Op>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenScope {
    Unnamed,
    Named,
}

/// Records a [`RulePlan`] for every committed rule. Abandoned rules leave no
/// trace.
#[derive(Debug, Default)]
pub struct PlanEmitter {
    rules: Vec<RulePlan>,
    pending: Option<RulePlan>,
    scopes: Vec<OpenScope>,
}

impl PlanEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[RulePlan] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&RulePlan> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn into_rules(self) -> Vec<RulePlan> {
        self.rules
    }

    fn push(&mut self, op: Op) {
        if let Some(plan) = self.pending.as_mut() {
            plan.ops.push(op);
        }
    }

    fn record(&mut self, op: Op) -> Result<(), EmitError> {
        match self.pending.as_mut() {
            Some(plan) => {
                plan.ops.push(op);
                Ok(())
            }
            None => Err(EmitError::NoActiveRule),
        }
    }

    fn open(&mut self, scope: OpenScope, op: Op) -> Result<(), EmitError> {
        self.record(op)?;
        self.scopes.push(scope);
        Ok(())
    }

    fn close(&mut self, scope: OpenScope, op: Op) -> Result<(), EmitError> {
        if self.scopes.last() != Some(&scope) {
            return Err(EmitError::UnbalancedScope);
        }
        self.scopes.pop();
        self.record(op)
    }
}

impl Emitter for PlanEmitter {
    type Gravity = ScopeGravity;

    fn begin_rule(&mut self, name: &str, pos: Pos) -> Result<ScopeGravity, EmitError> {
        if self.rules.iter().any(|r| r.name == name) {
            return Err(EmitError::RuleExists {
                name: name.to_owned(),
            });
        }
        self.pending = Some(RulePlan {
            name: name.to_owned(),
            pos,
            ops: Vec::new(),
        });
        self.scopes.clear();
        Ok(ScopeGravity::default())
    }

    fn abandon_rule(&mut self) {
        self.pending = None;
        self.scopes.clear();
    }

    fn finish_rule(&mut self) -> Result<(), EmitError> {
        if !self.scopes.is_empty() {
            return Err(EmitError::UnbalancedScope);
        }
        let plan = self.pending.take().ok_or(EmitError::NoActiveRule)?;
        self.rules.push(plan);
        Ok(())
    }

    fn open_unnamed_scope(&mut self, pos: Pos) -> Result<(), EmitError> {
        self.open(OpenScope::Unnamed, Op::OpenUnnamedScope { pos })
    }

    fn close_unnamed_scope(&mut self) -> Result<(), EmitError> {
        self.close(OpenScope::Unnamed, Op::CloseUnnamedScope)
    }

    fn open_named_scope(&mut self, name: &str, pos: Pos) -> Result<(), EmitError> {
        self.open(
            OpenScope::Named,
            Op::OpenNamedScope {
                name: name.to_owned(),
                pos,
            },
        )
    }

    fn close_named_scope(&mut self) -> Result<(), EmitError> {
        self.close(OpenScope::Named, Op::CloseNamedScope)
    }

    fn checkpoint(&mut self, path: &str) {
        self.push(Op::Checkpoint {
            path: path.to_owned(),
        });
    }

    fn at_end(&mut self) {
        self.push(Op::AtEnd);
    }

    fn stress(&mut self) {
        self.push(Op::Stress);
    }

    fn head(&mut self, literal: &Literal, optional: bool) {
        self.push(Op::Head {
            literal: literal.clone(),
            optional,
        });
    }

    fn pass_first(&mut self, count: usize) {
        self.push(Op::PassFirst { count });
    }

    fn lookup_fixed(&mut self, literal: &Literal, offset: usize, ignore: bool) {
        self.push(Op::LookupFixed {
            literal: literal.clone(),
            offset,
            ignore,
        });
    }

    fn lookup(&mut self, literal: &Literal, lower: usize, upper: usize, close: bool, ignore: bool) {
        self.push(Op::Lookup {
            literal: literal.clone(),
            lower,
            upper,
            close,
            ignore,
        });
    }

    fn add_field(&mut self, name: &str, ty: FieldType, pos: Pos) -> Result<(), EmitError> {
        self.record(Op::DeclareField {
            name: name.to_owned(),
            ty,
            pos,
        })
    }

    fn take_before(
        &mut self,
        name: &str,
        ty: FieldType,
        literal: &Literal,
        lower: usize,
        upper: usize,
        close: bool,
        or_rest: bool,
    ) -> Result<(), EmitError> {
        self.record(Op::TakeBefore {
            name: name.to_owned(),
            ty,
            literal: literal.clone(),
            lower,
            upper,
            close,
            or_rest,
        })
    }

    fn take_rest(&mut self, name: &str, ty: FieldType) -> Result<(), EmitError> {
        self.record(Op::TakeRest {
            name: name.to_owned(),
            ty,
        })
    }
}

impl fmt::Display for RulePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rule {} ({})", self.name, self.pos)?;
        let mut depth: usize = 1;
        for op in &self.ops {
            if matches!(op, Op::CloseUnnamedScope | Op::CloseNamedScope) {
                depth = depth.saturating_sub(1);
            }
            writeln!(f, "{:indent$}{}", "", op, indent = depth * 2)?;
            if matches!(op, Op::OpenUnnamedScope { .. } | Op::OpenNamedScope { .. }) {
                depth += 1;
            }
        }
        Ok(())
    }
}

impl fmt::Display for PlanEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, plan) in self.rules.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", plan)?;
        }
        Ok(())
    }
}
