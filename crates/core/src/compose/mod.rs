//! Rule composer: walks a rule's action tree, enforces the structural rules
//! of the extraction language and sequences the resulting scan operations.
//!
//! A rule is composed in one depth-first pass over its actions. Validation
//! runs eagerly; the operations it yields are queued and only replayed onto
//! the emitter once the whole rule has been accepted, so a failing rule
//! never leaves a partial plan behind.

mod queue;
mod scope;

pub use queue::replay;

use crate::ast::{Action, ActionKind, Field, Limit, LimitKind, Literal, Pos, Rule};
use crate::emitter::{Emitter, Gravity};
use crate::error::{ComposeError, RuleError};
use crate::normalize::Normalizer;
use crate::op::Op;
use scope::CompositionState;
use tracing::{debug, info, warn};

/// Composes rules against an emitter using one identifier policy.
pub struct Composer<'n> {
    normalizer: &'n dyn Normalizer,
}

impl<'n> Composer<'n> {
    pub fn new(normalizer: &'n dyn Normalizer) -> Self {
        Composer { normalizer }
    }

    /// Validates `rule` and, if it is well formed, commits its operations
    /// to `emitter`. Returns the committed operations.
    ///
    /// On failure the emitter is told to abandon the rule and the first
    /// error is returned, located at the offending token.
    pub fn compose<E: Emitter>(&self, emitter: &mut E, rule: &Rule) -> Result<Vec<Op>, RuleError> {
        info!(rule = %rule.name, "composing rule");
        let gravity = emitter
            .begin_rule(&rule.name, rule.pos)
            .map_err(|e| RuleError::new(&rule.name, rule.pos, ComposeError::EmitterRejection(e)))?;

        let mut state = CompositionState::new(&rule.name, gravity);
        if let Err(err) = self.compose_actions(&mut state, &rule.actions) {
            debug!(rule = %rule.name, pos = ?state.error_pos, "rule rejected");
            emitter.abandon_rule();
            return Err(err);
        }
        debug_assert_eq!(state.prefix_depth(), 0);
        debug_assert_eq!(state.anon_depth, 0);

        let ops = state.queue.into_ops();
        if let Err(e) = replay(emitter, &ops).and_then(|()| emitter.finish_rule()) {
            emitter.abandon_rule();
            return Err(RuleError::new(
                &rule.name,
                rule.pos,
                ComposeError::EmitterRejection(e),
            ));
        }
        info!(rule = %rule.name, ops = ops.len(), "rule committed");
        Ok(ops)
    }

    fn compose_actions<G: Gravity>(
        &self,
        st: &mut CompositionState<G>,
        actions: &[Action],
    ) -> Result<(), RuleError> {
        for action in actions {
            debug!(
                rule = %st.rule,
                action = action.kind.name(),
                pos = %action.pos,
                queued = st.queue.len(),
                "dispatch"
            );
            self.dispatch(st, action)?;
        }
        Ok(())
    }

    fn dispatch<G: Gravity>(
        &self,
        st: &mut CompositionState<G>,
        action: &Action,
    ) -> Result<(), RuleError> {
        let pos = action.pos;
        match &action.kind {
            ActionKind::AnonymousOption { actions } => {
                st.queue.push(Op::OpenUnnamedScope { pos });
                st.anonymous(|st| self.compose_actions(st, actions))?;
                st.queue.push(Op::CloseUnnamedScope);
                debug!(rule = %st.rule, "end of anonymous option");
            }
            ActionKind::NamedOptional { name, actions } => {
                if st.anon_depth > 0 {
                    return Err(fail(
                        st,
                        pos,
                        ComposeError::ScopeViolation {
                            what: "create named optional area",
                        },
                    ));
                }
                self.check_identifier(st, "option", name, pos)?;
                register_gravity(st, pos)?;
                st.queue.push(Op::OpenNamedScope {
                    name: name.clone(),
                    pos,
                });
                st.tied(name, |st| self.compose_actions(st, actions))?;
                st.queue.push(Op::CloseNamedScope);
                info!(rule = %st.rule, option = %name, "end of option");
            }
            ActionKind::AtEnd => {
                register_gravity(st, pos)?;
                st.queue.push(Op::AtEnd);
            }
            ActionKind::ErrorOnMismatch => st.queue.push(Op::Stress),
            ActionKind::MayBeStartChar { value } => {
                head(st, pos, Literal::Char(*value), true)?;
            }
            ActionKind::MayBeStartString { value } => {
                head(st, pos, Literal::String(value.clone()), true)?;
            }
            ActionKind::StartChar { value } => {
                head(st, pos, Literal::Char(*value), false)?;
            }
            ActionKind::StartString { value } => {
                head(st, pos, Literal::String(value.clone()), false)?;
            }
            ActionKind::PassFirst { count } => {
                register_gravity(st, pos)?;
                st.queue.push(Op::PassFirst { count: *count });
            }
            ActionKind::PassUntil { limit } => {
                register_gravity(st, pos)?;
                match delimiter(action, limit) {
                    Ok(literal) => st.queue.push(lookup(limit, literal, false)),
                    Err(e) => return Err(fail(st, pos, e)),
                }
            }
            ActionKind::PassUntilOrIgnore { limit } => {
                register_gravity(st, pos)?;
                if let LimitKind::Unrecognized(kind) = &limit.kind {
                    warn!(
                        rule = %st.rule,
                        pos = %pos,
                        kind = %kind,
                        "skipping pass with unrecognized delimiter kind"
                    );
                    return Ok(());
                }
                match delimiter(action, limit) {
                    Ok(literal) => st.queue.push(lookup(limit, literal, true)),
                    Err(e) => return Err(fail(st, pos, e)),
                }
            }
            ActionKind::Take { field, limit } => {
                self.take(st, action, field, Some(limit), false)?;
            }
            ActionKind::TakeRest { field } => {
                self.take(st, action, field, None, false)?;
            }
            ActionKind::TakeUntilOrRest { field, limit } => {
                self.take(st, action, field, Some(limit), true)?;
            }
        }
        Ok(())
    }

    /// Shared body of the capturing actions. Without a limit the remainder
    /// of the input is captured.
    fn take<G: Gravity>(
        &self,
        st: &mut CompositionState<G>,
        action: &Action,
        field: &Field,
        limit: Option<&Limit>,
        or_rest: bool,
    ) -> Result<(), RuleError> {
        if st.anon_depth > 0 {
            let what = if limit.is_some() { "take" } else { "take the rest" };
            return Err(fail(st, field.pos, ComposeError::ScopeViolation { what }));
        }
        self.check_field(st, field)?;

        st.tied(&field.name, |st| {
            register_gravity(st, field.pos)?;
            let declare = Op::DeclareField {
                name: field.name.clone(),
                ty: field.ty,
                pos: field.pos,
            };
            let Some(limit) = limit else {
                st.queue.push(declare);
                st.queue.push(Op::TakeRest {
                    name: field.name.clone(),
                    ty: field.ty,
                });
                return Ok(());
            };
            let literal = match delimiter(action, limit) {
                Ok(literal) => literal,
                Err(e) => return Err(fail(st, action.pos, e)),
            };
            st.queue.push(declare);
            st.queue.push(Op::TakeBefore {
                name: field.name.clone(),
                ty: field.ty,
                literal,
                lower: limit.lower,
                upper: limit.upper,
                close: limit.close,
                or_rest,
            });
            Ok(())
        })
    }

    fn check_identifier<G>(
        &self,
        st: &mut CompositionState<G>,
        what: &'static str,
        name: &str,
        pos: Pos,
    ) -> Result<(), RuleError> {
        let mut expected = self.normalizer.normalize(name);
        if expected.is_empty() {
            expected = "a non-empty alphanumeric name".to_owned();
        }
        if expected != name {
            return Err(fail(
                st,
                pos,
                ComposeError::InvalidIdentifier {
                    what,
                    name: name.to_owned(),
                    expected,
                },
            ));
        }
        Ok(())
    }

    fn check_field<G>(&self, st: &mut CompositionState<G>, field: &Field) -> Result<(), RuleError> {
        self.check_identifier(st, "field", &field.name, field.pos)?;
        let path = st.qualify(Some(field.name.as_str()));
        if let Some(ty) = st.declare_field(path.clone(), field.ty) {
            return Err(fail(
                st,
                field.pos,
                ComposeError::DuplicateField { path, ty },
            ));
        }
        Ok(())
    }
}

fn fail<G>(st: &mut CompositionState<G>, pos: Pos, error: ComposeError) -> RuleError {
    st.error_pos = Some(pos);
    RuleError::new(&st.rule, pos, error)
}

/// Checks the current path against the rule's checkpoint tracker and queues
/// the checkpoint in front of the operation it guards.
fn register_gravity<G: Gravity>(st: &mut CompositionState<G>, pos: Pos) -> Result<(), RuleError> {
    let path = st.prefix_cur();
    if let Err(e) = st.gravity.register(&path) {
        return Err(fail(st, pos, ComposeError::CheckpointViolation(e)));
    }
    st.queue.push(Op::Checkpoint { path });
    Ok(())
}

fn head<G: Gravity>(
    st: &mut CompositionState<G>,
    pos: Pos,
    literal: Literal,
    optional: bool,
) -> Result<(), RuleError> {
    register_gravity(st, pos)?;
    st.queue.push(Op::Head { literal, optional });
    Ok(())
}

/// Resolves a limit's literal; an unrecognized kind or a char limit that
/// does not hold exactly one character is malformed.
fn delimiter(action: &Action, limit: &Limit) -> Result<Literal, ComposeError> {
    limit.literal().ok_or_else(|| ComposeError::MalformedLimit {
        action: action.kind.name(),
        kind: limit.kind.clone(),
        value: limit.value.clone(),
    })
}

/// Fixed-position lookup when the window collapses to a single positive
/// offset, bounded search otherwise.
fn lookup(limit: &Limit, literal: Literal, ignore: bool) -> Op {
    if limit.is_fixed() {
        Op::LookupFixed {
            literal,
            offset: limit.lower,
            ignore,
        }
    } else {
        Op::Lookup {
            literal,
            lower: limit.lower,
            upper: limit.upper,
            close: limit.close,
            ignore,
        }
    }
}
