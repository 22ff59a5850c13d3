//! Failure translation
//!
//! Decides what a failure raised by a hidden member looks like to the caller
//! of the mirror:
//!
//! 1. Wrap rules are tried in order: first the method's explicit rules, then
//!    implicit ones derived from declared failure kinds that `mirrors` a hidden
//!    kind. The first rule whose source matches fires; later rules are not
//!    consulted.
//! 2. Unchecked failures and failures the method declares propagate as-is.
//! 3. Anything else also propagates as-is, optionally with a warning.

use std::sync::Arc;

use mirror_sdk::{ContractMethod, Failure, FailureRegistry, MirrorError, WrapRule};

use crate::config::UndeclaredFailurePolicy;

/// Applies wrap rules to failures raised by hidden members
#[derive(Debug)]
pub struct FailureTranslator {
    failures: Arc<FailureRegistry>,
    policy: UndeclaredFailurePolicy,
}

impl FailureTranslator {
    /// Create a translator over a failure registry
    pub fn new(failures: Arc<FailureRegistry>, policy: UndeclaredFailurePolicy) -> Self {
        Self { failures, policy }
    }

    /// Failure registry
    pub fn failures(&self) -> &Arc<FailureRegistry> {
        &self.failures
    }

    /// Wrap rules for `method` in evaluation order
    pub fn rules_for(&self, method: &ContractMethod) -> Vec<WrapRule> {
        let implicit = method.declared_failures().iter().filter_map(|declared| {
            self.failures
                .get(declared)
                .and_then(|class| class.mirrors())
                .map(|source| WrapRule::new(source, declared.clone()))
        });
        method
            .wrap_rules()
            .iter()
            .cloned()
            .chain(implicit)
            .collect()
    }

    /// Translate `failure`, raised while dispatching `method`, into the error
    /// the caller receives
    pub fn translate(&self, method: &ContractMethod, failure: Failure) -> MirrorError {
        if let Some(rule) = self
            .rules_for(method)
            .into_iter()
            .find(|rule| failure.is_instance_of(&rule.from))
        {
            tracing::debug!(
                target: "mirror::failure",
                "{}: wrapping {} into {}",
                method.signature(),
                failure.kind(),
                rule.to
            );
            return self.apply(&rule, failure);
        }

        let declared = method
            .declared_failures()
            .iter()
            .any(|kind| failure.is_instance_of(kind));
        if !failure.is_unchecked() && !declared && self.policy == UndeclaredFailurePolicy::Warn {
            tracing::warn!(
                target: "mirror::failure",
                "{} raised undeclared checked failure {}; declare it or add a wrap rule",
                method.signature(),
                failure
            );
        }
        MirrorError::Thrown(failure)
    }

    fn apply(&self, rule: &WrapRule, failure: Failure) -> MirrorError {
        let Some(dest) = self.failures.get(&rule.to) else {
            return MirrorError::FailureWrap {
                dest: rule.to.clone(),
                message: "unknown failure kind".to_string(),
                suppressed: failure,
            };
        };

        if let Some(wrapped) = dest.construct_with_cause(failure.clone()) {
            return MirrorError::Thrown(wrapped);
        }
        if let Some(mut wrapped) = dest.construct_default() {
            wrapped.init_cause(failure);
            return MirrorError::Thrown(wrapped);
        }

        tracing::error!(
            target: "mirror::failure",
            "{} has neither a cause constructor nor a no-argument constructor",
            rule.to
        );
        MirrorError::FailureWrap {
            dest: rule.to.clone(),
            message: "no cause constructor and no no-argument constructor".to_string(),
            suppressed: failure,
        }
    }
}
