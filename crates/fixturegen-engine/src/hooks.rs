//! Extension hooks applied at engine construction.
//!
//! A failing hook is isolated: its error is logged and its effects
//! discarded, and the remaining hooks still run.

use tracing::warn;

use crate::errors::GenerationError;
use crate::providers::ProviderRegistry;
use crate::strategy::Strategy;

/// Extension point for callers embedding the engine.
pub trait EngineHook: Send + Sync {
    fn name(&self) -> &'static str;

    /// Register additional providers before resolution runs.
    fn register_providers(
        &self,
        _registry: &mut ProviderRegistry,
    ) -> Result<(), GenerationError> {
        Ok(())
    }

    /// Adjust a resolved field strategy before it is frozen into the
    /// table.
    fn adjust_strategy(&self, _strategy: &mut Strategy) -> Result<(), GenerationError> {
        Ok(())
    }
}

/// Ordered collection of hooks with per-hook failure isolation.
#[derive(Default)]
pub struct HookSet {
    hooks: Vec<Box<dyn EngineHook>>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hook: Box<dyn EngineHook>) {
        self.hooks.push(hook);
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Let every hook register providers; a failing hook is skipped.
    pub fn apply_registrations(&self, registry: &mut ProviderRegistry) {
        for hook in &self.hooks {
            if let Err(error) = hook.register_providers(registry) {
                warn!(hook = hook.name(), %error, "hook provider registration failed, skipping");
            }
        }
    }

    /// Let every hook adjust a strategy. A failing hook's partial
    /// edits are rolled back before the next hook runs.
    pub fn apply_strategy(&self, strategy: &mut Strategy) {
        for hook in &self.hooks {
            let snapshot = strategy.clone();
            if let Err(error) = hook.adjust_strategy(strategy) {
                warn!(hook = hook.name(), path = %snapshot.field_path, %error,
                    "hook strategy adjustment failed, reverting");
                *strategy = snapshot;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyKind;
    use crate::value::Value;
    use fixturegen_core::FieldConstraints;

    struct FailingHook;

    impl EngineHook for FailingHook {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn adjust_strategy(&self, strategy: &mut Strategy) -> Result<(), GenerationError> {
            strategy.p_none = 1.0;
            Err(GenerationError::InvalidConfig("boom".to_string()))
        }
    }

    struct PinningHook;

    impl EngineHook for PinningHook {
        fn name(&self) -> &'static str {
            "pinning"
        }

        fn adjust_strategy(&self, strategy: &mut Strategy) -> Result<(), GenerationError> {
            strategy.kind = StrategyKind::Fixed(Value::Int(7));
            Ok(())
        }
    }

    fn strategy() -> Strategy {
        Strategy {
            field_path: "m.f".to_string(),
            constraints: FieldConstraints::default(),
            nullable: false,
            p_none: 0.0,
            kind: StrategyKind::Sentinel,
        }
    }

    #[test]
    fn failing_hook_is_rolled_back_and_later_hooks_still_run() {
        let mut hooks = HookSet::new();
        hooks.push(Box::new(FailingHook));
        hooks.push(Box::new(PinningHook));

        let mut subject = strategy();
        hooks.apply_strategy(&mut subject);
        assert_eq!(subject.p_none, 0.0);
        assert_eq!(subject.kind, StrategyKind::Fixed(Value::Int(7)));
    }

    #[test]
    fn empty_hook_set_is_a_no_op() {
        let hooks = HookSet::new();
        let mut subject = strategy();
        hooks.apply_strategy(&mut subject);
        assert_eq!(subject, strategy());
    }
}
