//! Recursion and budget guarding for nested model descent.

use std::collections::BTreeMap;

use crate::config::{CyclePolicy, GenerationConfig};
use crate::value::Value;

/// Outcome of asking to descend into a nested model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descent {
    /// Descend; the caller must balance with [`CycleGuard::exit`].
    Enter,
    /// Limit reached; apply the configured policy instead.
    Truncate {
        policy: CyclePolicy,
        /// What fired: `cycle`, `depth`, or `budget`.
        trigger: &'static str,
    },
}

/// Tracks the active descent path, depth, and object budget for one
/// top-level instance build.
///
/// A model already on the active path may be re-entered until the
/// depth limit is reached; the truncation trigger then reports
/// `cycle` for revisits and `depth` for plain deep nesting, so audit
/// output distinguishes the two.
#[derive(Debug)]
pub struct CycleGuard {
    policy: CyclePolicy,
    recursion_limit: u32,
    object_budget: u32,
    stack: Vec<String>,
    objects_built: u32,
    completed: BTreeMap<String, Value>,
}

impl CycleGuard {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            policy: config.cycle_policy,
            recursion_limit: config.recursion_limit,
            object_budget: config.object_budget,
            stack: Vec::new(),
            objects_built: 0,
            completed: BTreeMap::new(),
        }
    }

    /// Request descent into `model_id`.
    pub fn enter(&mut self, model_id: &str) -> Descent {
        if self.objects_built >= self.object_budget {
            return Descent::Truncate {
                policy: self.policy,
                trigger: "budget",
            };
        }
        if self.stack.len() as u32 >= self.recursion_limit {
            let trigger = if self.stack.iter().any(|id| id == model_id) {
                "cycle"
            } else {
                "depth"
            };
            return Descent::Truncate {
                policy: self.policy,
                trigger,
            };
        }
        self.stack.push(model_id.to_string());
        self.objects_built += 1;
        Descent::Enter
    }

    /// Balance a successful [`CycleGuard::enter`].
    pub fn exit(&mut self) {
        self.stack.pop();
    }

    /// Record a finished instance so the `reuse` policy can hand it
    /// back on later truncations. Only the first completion per model
    /// is kept.
    pub fn complete(&mut self, model_id: &str, value: &Value) {
        self.completed
            .entry(model_id.to_string())
            .or_insert_with(|| value.clone());
    }

    /// Previously completed instance of the exact same model, if any.
    pub fn reusable(&self, model_id: &str) -> Option<&Value> {
        self.completed.get(model_id)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(limit: u32, budget: u32, policy: CyclePolicy) -> CycleGuard {
        CycleGuard::new(&GenerationConfig {
            recursion_limit: limit,
            object_budget: budget,
            cycle_policy: policy,
            ..GenerationConfig::default()
        })
    }

    #[test]
    fn self_reference_truncates_at_the_depth_limit_with_cycle_trigger() {
        let mut guard = guard(2, 100, CyclePolicy::Null);
        assert_eq!(guard.enter("Node"), Descent::Enter);
        assert_eq!(guard.enter("Node"), Descent::Enter);
        assert_eq!(
            guard.enter("Node"),
            Descent::Truncate {
                policy: CyclePolicy::Null,
                trigger: "cycle",
            }
        );
        assert_eq!(guard.depth(), 2);
    }

    #[test]
    fn deep_acyclic_nesting_reports_depth() {
        let mut guard = guard(2, 100, CyclePolicy::Stub);
        assert_eq!(guard.enter("A"), Descent::Enter);
        assert_eq!(guard.enter("B"), Descent::Enter);
        assert_eq!(
            guard.enter("C"),
            Descent::Truncate {
                policy: CyclePolicy::Stub,
                trigger: "depth",
            }
        );
    }

    #[test]
    fn budget_exhaustion_fires_before_depth() {
        let mut guard = guard(10, 2, CyclePolicy::Null);
        assert_eq!(guard.enter("A"), Descent::Enter);
        assert_eq!(guard.enter("B"), Descent::Enter);
        assert_eq!(
            guard.enter("C"),
            Descent::Truncate {
                policy: CyclePolicy::Null,
                trigger: "budget",
            }
        );
    }

    #[test]
    fn exit_unwinds_depth_for_sibling_descent() {
        let mut guard = guard(2, 100, CyclePolicy::Null);
        assert_eq!(guard.enter("A"), Descent::Enter);
        assert_eq!(guard.enter("B"), Descent::Enter);
        guard.exit();
        assert_eq!(guard.enter("C"), Descent::Enter);
    }

    #[test]
    fn reuse_keeps_the_first_completed_instance() {
        let mut guard = guard(4, 100, CyclePolicy::Reuse);
        assert_eq!(guard.reusable("Node"), None);
        guard.complete("Node", &Value::Int(1));
        guard.complete("Node", &Value::Int(2));
        assert_eq!(guard.reusable("Node"), Some(&Value::Int(1)));
    }
}
