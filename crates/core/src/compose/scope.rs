//! Per-rule composition state: anonymity depth, the prefix stack, declared
//! fields and the pending operation queue.

use super::queue::Queue;
use crate::ast::{FieldType, Pos};
use std::collections::HashMap;

/// One entry of the prefix stack. Anonymous scopes push an empty segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScopeFrame {
    pub(crate) segment: String,
}

/// Mutable state of one rule's composition pass. Created when the rule
/// starts and dropped when it ends, whatever the outcome.
#[derive(Debug)]
pub(crate) struct CompositionState<G> {
    pub(crate) rule: String,
    pub(crate) gravity: G,
    pub(crate) queue: Queue,
    pub(crate) anon_depth: usize,
    /// Position of the last failure, kept for diagnostics.
    pub(crate) error_pos: Option<Pos>,
    prefix: Vec<ScopeFrame>,
    fields: HashMap<String, FieldType>,
}

impl<G> CompositionState<G> {
    pub(crate) fn new(rule: &str, gravity: G) -> Self {
        CompositionState {
            rule: rule.to_owned(),
            gravity,
            queue: Queue::default(),
            anon_depth: 0,
            error_pos: None,
            prefix: Vec::new(),
            fields: HashMap::new(),
        }
    }

    /// Qualified path of the current position: the named segments of the
    /// prefix stack joined with `.`.
    pub(crate) fn prefix_cur(&self) -> String {
        self.qualify(None)
    }

    /// Path `name` would get if it were tied at the current position.
    pub(crate) fn qualify(&self, name: Option<&str>) -> String {
        self.prefix
            .iter()
            .map(|f| f.segment.as_str())
            .chain(name)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub(crate) fn prefix_depth(&self) -> usize {
        self.prefix.len()
    }

    /// Runs `body` with `segment` tied onto the prefix stack. The segment is
    /// untied when `body` returns, on success and on failure alike.
    pub(crate) fn tied<R>(&mut self, segment: &str, body: impl FnOnce(&mut Self) -> R) -> R {
        self.prefix.push(ScopeFrame {
            segment: segment.to_owned(),
        });
        let depth = self.prefix.len();
        let out = body(self);
        debug_assert_eq!(self.prefix.len(), depth, "unbalanced prefix stack");
        self.prefix.pop();
        out
    }

    /// Runs `body` inside an anonymous scope: the anonymity depth is raised
    /// and an empty frame tied for its duration.
    pub(crate) fn anonymous<R>(&mut self, body: impl FnOnce(&mut Self) -> R) -> R {
        self.anon_depth += 1;
        let out = self.tied("", body);
        self.anon_depth -= 1;
        out
    }

    /// Records a field under its qualified path. Returns the type of the
    /// earlier declaration if the path is already taken.
    pub(crate) fn declare_field(&mut self, path: String, ty: FieldType) -> Option<FieldType> {
        match self.fields.get(&path) {
            Some(prev) => Some(*prev),
            None => {
                self.fields.insert(path, ty);
                None
            }
        }
    }
}
