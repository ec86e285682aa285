//! The call contract between the composer and an operation emitter.
//!
//! The composer validates a whole rule before the emitter observes any
//! operation of it. Only two things happen up front: [`Emitter::begin_rule`]
//! (which may reject the rule name) and checkpoint registration against the
//! [`Gravity`] tracker that `begin_rule` hands out. Everything else is
//! queued and replayed once the rule has composed cleanly.

use crate::ast::{FieldType, Literal, Pos};
use crate::error::EmitError;

/// Per-rule structural checkpoint tracker owned by the emitter's policy.
///
/// `register` is called with the qualified path of the current position
/// before each content-bearing action and must fail fast.
pub trait Gravity {
    fn register(&mut self, path: &str) -> Result<(), EmitError>;
}

/// Sink for the ordered operations of composed rules.
pub trait Emitter {
    type Gravity: Gravity;

    /// Starts a rule named `name`; fails when the name is already taken.
    fn begin_rule(&mut self, name: &str, pos: Pos) -> Result<Self::Gravity, EmitError>;

    /// Drops whatever `begin_rule` and a partial replay left behind for the
    /// current rule.
    fn abandon_rule(&mut self) {}

    /// Called after the last operation of a rule has been replayed.
    fn finish_rule(&mut self) -> Result<(), EmitError> {
        Ok(())
    }

    /// Opens an anonymous optional area at `pos`.
    fn open_unnamed_scope(&mut self, pos: Pos) -> Result<(), EmitError>;
    /// Closes the innermost anonymous optional area.
    fn close_unnamed_scope(&mut self) -> Result<(), EmitError>;
    /// Opens the optional area `name`; its fields are qualified by it.
    fn open_named_scope(&mut self, name: &str, pos: Pos) -> Result<(), EmitError>;
    /// Closes the innermost named optional area.
    fn close_named_scope(&mut self) -> Result<(), EmitError>;

    /// Marks a checkpoint already accepted by the rule's [`Gravity`].
    fn checkpoint(&mut self, path: &str);

    /// The line must be fully consumed here.
    fn at_end(&mut self);
    /// A mismatch from here on is an error instead of a soft failure.
    fn stress(&mut self);
    /// Matches `literal` at the current position; `optional` tolerates absence.
    fn head(&mut self, literal: &Literal, optional: bool);
    /// Skips exactly `count` characters.
    fn pass_first(&mut self, count: usize);
    /// Skips past `literal` expected exactly `offset` characters ahead.
    /// Absence is tolerated when `ignore`.
    fn lookup_fixed(&mut self, literal: &Literal, offset: usize, ignore: bool);
    /// Skips past the first `literal` found within `lower..upper` (0 is unbounded).
    fn lookup(&mut self, literal: &Literal, lower: usize, upper: usize, close: bool, ignore: bool);

    /// Declares a captured field; called before its capture.
    fn add_field(&mut self, name: &str, ty: FieldType, pos: Pos) -> Result<(), EmitError>;
    /// Captures into `name` up to the delimiter, or to line end when `or_rest`.
    #[allow(clippy::too_many_arguments)]
    fn take_before(
        &mut self,
        name: &str,
        ty: FieldType,
        literal: &Literal,
        lower: usize,
        upper: usize,
        close: bool,
        or_rest: bool,
    ) -> Result<(), EmitError>;
    /// Captures the remainder of the line into `name`.
    fn take_rest(&mut self, name: &str, ty: FieldType) -> Result<(), EmitError>;
}
