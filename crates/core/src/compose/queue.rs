//! Deferred emission queue: validated operations wait here until the owning
//! rule has composed without error, then get replayed in order.

use crate::emitter::Emitter;
use crate::error::EmitError;
use crate::op::Op;

#[derive(Debug, Default)]
pub(crate) struct Queue {
    ops: Vec<Op>,
}

impl Queue {
    pub(crate) fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    pub(crate) fn len(&self) -> usize {
        self.ops.len()
    }

    pub(crate) fn into_ops(self) -> Vec<Op> {
        self.ops
    }
}

/// Feeds `ops` to `emitter` in order, stopping at the first rejection.
pub fn replay<E: Emitter>(emitter: &mut E, ops: &[Op]) -> Result<(), EmitError> {
    for op in ops {
        match op {
            Op::OpenUnnamedScope { pos } => emitter.open_unnamed_scope(*pos)?,
            Op::CloseUnnamedScope => emitter.close_unnamed_scope()?,
            Op::OpenNamedScope { name, pos } => emitter.open_named_scope(name, *pos)?,
            Op::CloseNamedScope => emitter.close_named_scope()?,
            Op::Checkpoint { path } => emitter.checkpoint(path),
            Op::AtEnd => emitter.at_end(),
            Op::Stress => emitter.stress(),
            Op::Head { literal, optional } => emitter.head(literal, *optional),
            Op::PassFirst { count } => emitter.pass_first(*count),
            Op::LookupFixed {
                literal,
                offset,
                ignore,
            } => emitter.lookup_fixed(literal, *offset, *ignore),
            Op::Lookup {
                literal,
                lower,
                upper,
                close,
                ignore,
            } => emitter.lookup(literal, *lower, *upper, *close, *ignore),
            Op::DeclareField { name, ty, pos } => emitter.add_field(name, *ty, *pos)?,
            Op::TakeBefore {
                name,
                ty,
                literal,
                lower,
                upper,
                close,
                or_rest,
            } => emitter.take_before(name, *ty, literal, *lower, *upper, *close, *or_rest)?,
            Op::TakeRest { name, ty } => emitter.take_rest(name, *ty)?,
        }
    }
    Ok(())
}
