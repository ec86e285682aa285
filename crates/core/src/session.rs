//! Session driver: composes the rules of a rule set one after another
//! against a single emitter.

use crate::ast::Rule;
use crate::compose::Composer;
use crate::emitter::Emitter;
use crate::error::RuleError;
use tracing::{debug, info};

/// Outcome of a session.
#[derive(Debug, Default)]
pub struct SessionReport {
    /// Names of the committed rules, in composition order.
    pub composed: Vec<String>,
    pub failures: Vec<RuleError>,
    /// Rules not visited because the session stopped early.
    pub skipped: usize,
}

impl SessionReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Composes `rules` in order. A failed rule never affects the others; with
/// `keep_going` unset the session stops at the first failure.
pub fn compose_rules<E: Emitter>(
    composer: &Composer<'_>,
    emitter: &mut E,
    rules: &[Rule],
    keep_going: bool,
) -> SessionReport {
    let mut report = SessionReport::default();
    for (i, rule) in rules.iter().enumerate() {
        match composer.compose(emitter, rule) {
            Ok(_) => report.composed.push(rule.name.clone()),
            Err(err) => {
                debug!(rule = %rule.name, error = %err, "rule failed");
                report.failures.push(err);
                if !keep_going {
                    report.skipped = rules.len() - i - 1;
                    break;
                }
            }
        }
    }
    info!(
        composed = report.composed.len(),
        failed = report.failures.len(),
        skipped = report.skipped,
        "session finished"
    );
    report
}
