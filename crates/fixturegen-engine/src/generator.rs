//! Instance generation: walks resolved strategies depth-first in
//! field declaration order and materializes values from keyed RNG
//! substreams.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;
use tracing::{debug, info};

use fixturegen_core::{ModelGraph, validate_graph};

use crate::audit::{GenerationAudit, TruncationRecord};
use crate::config::{CyclePolicy, EnumPolicy, GenerationConfig, UnionPolicy};
use crate::cycle::{CycleGuard, Descent};
use crate::errors::GenerationError;
use crate::hooks::HookSet;
use crate::providers::collection::{UniqueSet, draw_size};
use crate::providers::{ProviderContext, ProviderRegistry, SENTINEL_PROVIDER};
use crate::rng::SeedCascade;
use crate::strategy::{PolicyResolver, Strategy, StrategyKind, StrategyTable};
use crate::value::Value;

/// One generated instance plus its audit trail.
#[derive(Debug, Clone)]
pub struct GeneratedInstance {
    pub value: Value,
    pub audit: GenerationAudit,
}

/// External acceptance check run against each candidate instance.
///
/// On rejection the engine re-generates only the named fields from
/// fresh retry substreams; untouched fields replay byte-identically.
pub trait InstanceValidator: Send + Sync {
    fn name(&self) -> &'static str {
        "validator"
    }

    /// `Err` carries the failing field names (bare or dotted).
    fn validate(&self, instance: &Value) -> Result<(), Vec<String>>;
}

/// Deterministic instance generator over a resolved model graph.
///
/// Construction validates the graph and config and freezes the
/// strategy table; generation itself takes `&self` and is safe to
/// drive from multiple threads.
pub struct InstanceGenerator {
    graph: ModelGraph,
    registry: ProviderRegistry,
    config: GenerationConfig,
    cascade: SeedCascade,
    table: StrategyTable,
    validators: Vec<Box<dyn InstanceValidator>>,
    time_anchor: NaiveDateTime,
}

impl InstanceGenerator {
    pub fn new(graph: ModelGraph, config: GenerationConfig) -> Result<Self, GenerationError> {
        Self::with_hooks(graph, config, HookSet::new())
    }

    pub fn with_hooks(
        graph: ModelGraph,
        config: GenerationConfig,
        hooks: HookSet,
    ) -> Result<Self, GenerationError> {
        config.validate()?;
        validate_graph(&graph)?;

        let mut registry = ProviderRegistry::with_builtins();
        hooks.apply_registrations(&mut registry);

        let resolver = PolicyResolver::new(&registry, &config);
        let mut table = resolver.resolve_graph(&graph)?;
        if !hooks.is_empty() {
            for strategies in table.values_mut() {
                for (_, strategy) in strategies.iter_mut() {
                    hooks.apply_strategy(strategy);
                }
            }
        }

        let cascade = SeedCascade::new(config.seed, config.rng_mode);
        let time_anchor = config.time_anchor.unwrap_or_else(default_time_anchor);
        info!(
            models = graph.models.len(),
            seed = config.seed,
            "generation engine ready"
        );
        Ok(Self {
            graph,
            registry,
            config,
            cascade,
            table,
            validators: Vec::new(),
            time_anchor,
        })
    }

    pub fn add_validator(&mut self, validator: Box<dyn InstanceValidator>) {
        self.validators.push(validator);
    }

    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate the instance at item index 0.
    pub fn generate(&self, model_id: &str) -> Result<GeneratedInstance, GenerationError> {
        self.generate_indexed(model_id, 0)
    }

    /// Generate the instance for one `(model, item_index)` slot.
    /// Output depends only on the key, never on what was generated
    /// before.
    pub fn generate_indexed(
        &self,
        model_id: &str,
        item_index: u64,
    ) -> Result<GeneratedInstance, GenerationError> {
        debug!(model = %model_id, item_index, "generating instance");
        let mut attempts: BTreeMap<String, u32> = BTreeMap::new();

        let run_validators = self.config.respect_validators && !self.validators.is_empty();
        let rounds = if run_validators {
            self.config.validator_max_retries
        } else {
            0
        };

        for round in 0..=rounds {
            let mut audit = GenerationAudit::default();
            let mut guard = CycleGuard::new(&self.config);
            let value = self.build_root(model_id, item_index, &attempts, &mut audit, &mut guard)?;

            if !run_validators {
                return Ok(GeneratedInstance { value, audit });
            }
            let mut failing: Vec<String> = Vec::new();
            for validator in &self.validators {
                if let Err(fields) = validator.validate(&value) {
                    failing.extend(fields);
                }
            }
            if failing.is_empty() {
                return Ok(GeneratedInstance { value, audit });
            }
            failing.sort();
            failing.dedup();
            if round == rounds {
                return Err(GenerationError::ValidatorExhausted {
                    attempts: rounds,
                    failing,
                });
            }
            for field in failing {
                let scope = if field.contains('.') {
                    field
                } else {
                    format!("{model_id}.{field}")
                };
                *attempts.entry(scope).or_insert(0) += 1;
            }
        }
        Err(GenerationError::ValidatorExhausted {
            attempts: rounds,
            failing: Vec::new(),
        })
    }

    /// Lazy stream of instances for item indices `0..count`.
    pub fn generate_many<'a>(
        &'a self,
        model_id: &'a str,
        count: u64,
    ) -> impl Iterator<Item = Result<GeneratedInstance, GenerationError>> + 'a {
        (0..count).map(move |index| self.generate_indexed(model_id, index))
    }

    fn build_root(
        &self,
        model_id: &str,
        item_index: u64,
        attempts: &BTreeMap<String, u32>,
        audit: &mut GenerationAudit,
        guard: &mut CycleGuard,
    ) -> Result<Value, GenerationError> {
        match guard.enter(model_id) {
            Descent::Enter => {}
            Descent::Truncate { .. } => {
                return Err(GenerationError::UnsatisfiableRecursion {
                    path: model_id.to_string(),
                });
            }
        }
        let value = self.build_record(model_id, model_id, item_index, attempts, audit, guard)?;
        guard.exit();
        guard.complete(model_id, &value);
        Ok(value)
    }

    /// Build a record for `model_id`, with substreams scoped under
    /// `scope` (the absolute dotted path from the root instance).
    fn build_record(
        &self,
        model_id: &str,
        scope: &str,
        item_index: u64,
        attempts: &BTreeMap<String, u32>,
        audit: &mut GenerationAudit,
        guard: &mut CycleGuard,
    ) -> Result<Value, GenerationError> {
        let strategies = self
            .table
            .get(model_id)
            .ok_or_else(|| GenerationError::Mapping {
                path: scope.to_string(),
                hint: format!("unknown model '{model_id}'"),
            })?;

        let mut fields = Vec::with_capacity(strategies.len());
        for (name, strategy) in strategies {
            let field_scope = format!("{scope}.{name}");
            let attempt = attempts.get(&strategy.field_path).copied().unwrap_or(0);
            let value = self.build_field(
                model_id,
                strategy,
                &field_scope,
                item_index,
                attempt,
                attempts,
                audit,
                guard,
            )?;
            fields.push((name.clone(), value));
        }
        Ok(Value::Record(fields))
    }

    /// Field entry point: the null-presence draw happens here, on a
    /// stream of its own, before any value stream is touched.
    #[allow(clippy::too_many_arguments)]
    fn build_field(
        &self,
        model_id: &str,
        strategy: &Strategy,
        scope: &str,
        item_index: u64,
        attempt: u32,
        attempts: &BTreeMap<String, u32>,
        audit: &mut GenerationAudit,
        guard: &mut CycleGuard,
    ) -> Result<Value, GenerationError> {
        if strategy.nullable && strategy.p_none > 0.0 {
            let mut presence = self.cascade.presence_stream(model_id, scope, item_index);
            if presence.random_bool(strategy.p_none) {
                audit.record_policy("p_none");
                return Ok(Value::Null);
            }
        }
        self.build_kind(
            model_id,
            strategy,
            strategy.nullable,
            scope,
            item_index,
            attempt,
            attempts,
            audit,
            guard,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build_kind(
        &self,
        model_id: &str,
        strategy: &Strategy,
        nullable: bool,
        scope: &str,
        item_index: u64,
        attempt: u32,
        attempts: &BTreeMap<String, u32>,
        audit: &mut GenerationAudit,
        guard: &mut CycleGuard,
    ) -> Result<Value, GenerationError> {
        match &strategy.kind {
            StrategyKind::Fixed(value) => {
                audit.record_policy("override.fixed");
                Ok(value.clone())
            }
            StrategyKind::Default(value) => {
                audit.record_policy("default");
                Ok(value.clone())
            }
            StrategyKind::Literal(value) => {
                audit.record_policy("literal");
                Ok(value.clone())
            }
            StrategyKind::Sentinel => {
                audit.record_fallback();
                audit.record_provider(scope, SENTINEL_PROVIDER);
                Ok(Value::Text(format!("<unmapped:{scope}>")))
            }
            StrategyKind::Provider(provider_ref) => {
                let mut rng = self
                    .cascade
                    .retry_substream(model_id, scope, item_index, attempt);
                let ctx = ProviderContext {
                    model_id,
                    field_path: scope,
                    item_index,
                    time_anchor: self.time_anchor,
                };
                let value =
                    self.registry
                        .invoke(provider_ref, &ctx, &strategy.constraints, &mut rng)?;
                audit.record_provider(scope, &provider_ref.name);
                Ok(value)
            }
            StrategyKind::Enum { members, policy } => {
                if members.is_empty() {
                    return Err(GenerationError::ConstraintViolation {
                        path: scope.to_string(),
                        message: "enum has no members".to_string(),
                    });
                }
                let index = match policy {
                    EnumPolicy::First => {
                        audit.record_policy("enum.first");
                        0
                    }
                    EnumPolicy::Random => {
                        let mut rng = self
                            .cascade
                            .retry_substream(model_id, scope, item_index, attempt);
                        audit.record_policy("enum.random");
                        rng.random_range(0..members.len())
                    }
                };
                members
                    .get(index)
                    .map(|member| Value::Text(member.clone()))
                    .ok_or_else(|| GenerationError::ConstraintViolation {
                        path: scope.to_string(),
                        message: "enum has no members".to_string(),
                    })
            }
            StrategyKind::Union {
                arms,
                policy,
                weights,
            } => {
                let index = self.pick_union_arm(
                    model_id, scope, item_index, attempt, arms, *policy, weights, audit,
                )?;
                let arm = arms.get(index).ok_or_else(|| {
                    GenerationError::ConstraintViolation {
                        path: scope.to_string(),
                        message: "union has no members".to_string(),
                    }
                })?;
                self.build_kind(
                    model_id, arm, nullable, scope, item_index, attempt, attempts, audit,
                    guard,
                )
            }
            StrategyKind::List { item } => {
                let size_scope = format!("{scope}#len");
                let mut size_rng =
                    self.cascade
                        .retry_substream(model_id, &size_scope, item_index, attempt);
                let size = draw_size(scope, &strategy.constraints, &mut size_rng)?;
                self.build_list(
                    model_id,
                    item,
                    strategy.constraints.unique_items,
                    size,
                    scope,
                    item_index,
                    attempt,
                    attempts,
                    audit,
                    guard,
                )
            }
            StrategyKind::Map { key, value } => {
                let size_scope = format!("{scope}#len");
                let mut size_rng =
                    self.cascade
                        .retry_substream(model_id, &size_scope, item_index, attempt);
                let size = draw_size(scope, &strategy.constraints, &mut size_rng)?;
                self.build_map(
                    model_id, key, value, size, scope, item_index, attempt, attempts, audit,
                    guard,
                )
            }
            StrategyKind::Nested { model_id: target } => self.build_nested(
                target, nullable, scope, item_index, attempt, attempts, audit, guard,
            ),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn pick_union_arm(
        &self,
        model_id: &str,
        scope: &str,
        item_index: u64,
        attempt: u32,
        arms: &[Strategy],
        policy: UnionPolicy,
        weights: &Option<Vec<f64>>,
        audit: &mut GenerationAudit,
    ) -> Result<usize, GenerationError> {
        if arms.is_empty() {
            return Err(GenerationError::ConstraintViolation {
                path: scope.to_string(),
                message: "union has no members".to_string(),
            });
        }
        match policy {
            UnionPolicy::First => {
                audit.record_policy("union.first");
                Ok(0)
            }
            UnionPolicy::Random => {
                let select_scope = format!("{scope}#union");
                let mut rng =
                    self.cascade
                        .retry_substream(model_id, &select_scope, item_index, attempt);
                audit.record_policy("union.random");
                Ok(rng.random_range(0..arms.len()))
            }
            UnionPolicy::Weighted => {
                let select_scope = format!("{scope}#union");
                let mut rng =
                    self.cascade
                        .retry_substream(model_id, &select_scope, item_index, attempt);
                audit.record_policy("union.weighted");
                let Some(weights) = weights else {
                    // No weights configured for this field: uniform.
                    return Ok(rng.random_range(0..arms.len()));
                };
                let total: f64 = weights.iter().sum();
                if total <= 0.0 {
                    return Ok(rng.random_range(0..arms.len()));
                }
                let mut draw = rng.random_range(0.0..total);
                for (index, weight) in weights.iter().enumerate() {
                    if draw < *weight {
                        return Ok(index);
                    }
                    draw -= weight;
                }
                Ok(weights.len() - 1)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_list(
        &self,
        model_id: &str,
        item: &Strategy,
        unique: bool,
        size: usize,
        scope: &str,
        item_index: u64,
        attempt: u32,
        attempts: &BTreeMap<String, u32>,
        audit: &mut GenerationAudit,
        guard: &mut CycleGuard,
    ) -> Result<Value, GenerationError> {
        let mut items = Vec::with_capacity(size);
        let mut seen = UniqueSet::new();
        for position in 0..size {
            let item_scope = format!("{scope}[{position}]");
            if !unique {
                let value = self.build_kind(
                    model_id, item, false, &item_scope, item_index, attempt, attempts,
                    audit, guard,
                )?;
                items.push(value);
                continue;
            }
            let mut accepted = false;
            for retry in 0..=self.config.unique_retry_limit {
                let value = self.build_kind(
                    model_id,
                    item,
                    false,
                    &item_scope,
                    item_index,
                    attempt + retry,
                    attempts,
                    audit,
                    guard,
                )?;
                if seen.try_insert(&value) {
                    items.push(value);
                    accepted = true;
                    break;
                }
            }
            if !accepted {
                return Err(GenerationError::ConstraintViolation {
                    path: scope.to_string(),
                    message: format!(
                        "could not produce {size} distinct items within {} retries",
                        self.config.unique_retry_limit
                    ),
                });
            }
        }
        Ok(Value::List(items))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_map(
        &self,
        model_id: &str,
        key: &Strategy,
        value: &Strategy,
        size: usize,
        scope: &str,
        item_index: u64,
        attempt: u32,
        attempts: &BTreeMap<String, u32>,
        audit: &mut GenerationAudit,
        guard: &mut CycleGuard,
    ) -> Result<Value, GenerationError> {
        let mut entries = Vec::with_capacity(size);
        let mut seen = UniqueSet::new();
        for position in 0..size {
            let key_scope = format!("{scope}#key[{position}]");
            let mut key_text = None;
            for retry in 0..=self.config.unique_retry_limit {
                let candidate = self.build_kind(
                    model_id,
                    key,
                    false,
                    &key_scope,
                    item_index,
                    attempt + retry,
                    attempts,
                    audit,
                    guard,
                )?;
                if seen.try_insert(&candidate) {
                    key_text = Some(candidate.canonical_key());
                    break;
                }
            }
            let Some(key_text) = key_text else {
                return Err(GenerationError::ConstraintViolation {
                    path: scope.to_string(),
                    message: format!(
                        "could not produce {size} distinct map keys within {} retries",
                        self.config.unique_retry_limit
                    ),
                });
            };
            let value_scope = format!("{scope}#val[{position}]");
            let entry_value = self.build_kind(
                model_id, value, false, &value_scope, item_index, attempt, attempts, audit,
                guard,
            )?;
            entries.push((key_text, entry_value));
        }
        Ok(Value::Record(entries))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_nested(
        &self,
        target: &str,
        nullable: bool,
        scope: &str,
        item_index: u64,
        attempt: u32,
        attempts: &BTreeMap<String, u32>,
        audit: &mut GenerationAudit,
        guard: &mut CycleGuard,
    ) -> Result<Value, GenerationError> {
        match guard.enter(target) {
            Descent::Enter => {
                let value =
                    self.build_record(target, scope, item_index, attempts, audit, guard)?;
                guard.exit();
                guard.complete(target, &value);
                Ok(value)
            }
            Descent::Truncate { policy, trigger } => {
                audit.record_truncation(TruncationRecord {
                    path: scope.to_string(),
                    policy: policy_label(policy).to_string(),
                    trigger: trigger.to_string(),
                });
                match policy {
                    CyclePolicy::Reuse => {
                        if let Some(existing) = guard.reusable(target) {
                            audit.record_policy("cycle.reuse");
                            return Ok(existing.clone());
                        }
                        // Nothing completed yet to hand back.
                        audit.record_warning(
                            "cycle.reuse_unavailable",
                            format!("no completed '{target}' instance to reuse, stubbing"),
                            Some(scope),
                        );
                        audit.record_policy("cycle.stub");
                        self.build_stub(target, scope, item_index, attempt, audit)
                    }
                    CyclePolicy::Stub => {
                        audit.record_policy("cycle.stub");
                        self.build_stub(target, scope, item_index, attempt, audit)
                    }
                    CyclePolicy::Null => {
                        if !nullable {
                            return Err(GenerationError::UnsatisfiableRecursion {
                                path: scope.to_string(),
                            });
                        }
                        audit.record_policy("cycle.null");
                        Ok(Value::Null)
                    }
                }
            }
        }
    }

    /// Minimal placeholder instance: leaf fields are generated from
    /// their usual substreams, structural fields are nulled so no
    /// further descent can happen.
    fn build_stub(
        &self,
        model_id: &str,
        scope: &str,
        item_index: u64,
        attempt: u32,
        audit: &mut GenerationAudit,
    ) -> Result<Value, GenerationError> {
        let strategies = self
            .table
            .get(model_id)
            .ok_or_else(|| GenerationError::Mapping {
                path: scope.to_string(),
                hint: format!("unknown model '{model_id}'"),
            })?;

        let mut fields = Vec::with_capacity(strategies.len());
        for (name, strategy) in strategies {
            let field_scope = format!("{scope}.{name}");
            let value = match &strategy.kind {
                StrategyKind::Fixed(value)
                | StrategyKind::Default(value)
                | StrategyKind::Literal(value) => value.clone(),
                StrategyKind::Provider(provider_ref) => {
                    let mut rng =
                        self.cascade
                            .retry_substream(model_id, &field_scope, item_index, attempt);
                    let ctx = ProviderContext {
                        model_id,
                        field_path: &field_scope,
                        item_index,
                        time_anchor: self.time_anchor,
                    };
                    let value = self.registry.invoke(
                        provider_ref,
                        &ctx,
                        &strategy.constraints,
                        &mut rng,
                    )?;
                    audit.record_provider(&field_scope, &provider_ref.name);
                    value
                }
                StrategyKind::Enum { members, .. } => members
                    .first()
                    .map(|member| Value::Text(member.clone()))
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            };
            fields.push((name.clone(), value));
        }
        Ok(Value::Record(fields))
    }
}

fn policy_label(policy: CyclePolicy) -> &'static str {
    match policy {
        CyclePolicy::Reuse => "reuse",
        CyclePolicy::Stub => "stub",
        CyclePolicy::Null => "null",
    }
}

fn default_time_anchor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixturegen_core::{FieldConstraints, FieldDecl, FieldType, ModelDecl};

    fn user_graph() -> ModelGraph {
        ModelGraph::new(vec![ModelDecl {
            id: "app.User".to_string(),
            fields: vec![
                FieldDecl::new("id", FieldType::Int).with_constraints(FieldConstraints {
                    ge: Some(1.0),
                    le: Some(10.0),
                    ..FieldConstraints::default()
                }),
                FieldDecl::new(
                    "tag",
                    FieldType::Enum {
                        members: vec!["A".to_string(), "B".to_string()],
                    },
                ),
                FieldDecl::new("note", FieldType::String).nullable(),
            ],
        }])
    }

    #[test]
    fn fields_come_back_in_declaration_order() {
        let engine = InstanceGenerator::new(user_graph(), GenerationConfig::with_seed(42))
            .expect("engine builds");
        let instance = engine.generate("app.User").expect("generates");
        let Value::Record(fields) = &instance.value else {
            panic!("expected a record");
        };
        let names: Vec<&str> = fields.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["id", "tag", "note"]);
    }

    #[test]
    fn unknown_model_is_a_mapping_error() {
        let engine = InstanceGenerator::new(user_graph(), GenerationConfig::with_seed(1))
            .expect("engine builds");
        assert!(matches!(
            engine.generate("app.Ghost"),
            Err(GenerationError::Mapping { .. })
        ));
    }

    #[test]
    fn default_field_consumes_no_randomness() {
        let with_default = ModelGraph::new(vec![ModelDecl {
            id: "m".to_string(),
            fields: vec![
                FieldDecl::new("role", FieldType::String)
                    .with_default(serde_json::json!("member")),
                FieldDecl::new("id", FieldType::Int),
            ],
        }]);
        let without_default = ModelGraph::new(vec![ModelDecl {
            id: "m".to_string(),
            fields: vec![
                FieldDecl::new("role", FieldType::String),
                FieldDecl::new("id", FieldType::Int),
            ],
        }]);

        let config = GenerationConfig::with_seed(7);
        let a = InstanceGenerator::new(with_default, config.clone()).expect("engine builds");
        let b = InstanceGenerator::new(without_default, config).expect("engine builds");
        let first = a.generate("m").expect("generates");
        let second = b.generate("m").expect("generates");

        assert_eq!(
            first.value.field("role"),
            Some(&Value::Text("member".to_string()))
        );
        // Sibling draws are unaffected by the short-circuited field.
        assert_eq!(first.value.field("id"), second.value.field("id"));
    }

    #[test]
    fn validator_retries_converge_or_exhaust() {
        struct EvenId;
        impl InstanceValidator for EvenId {
            fn validate(&self, instance: &Value) -> Result<(), Vec<String>> {
                match instance.field("id").and_then(Value::as_i64) {
                    Some(id) if id % 2 == 0 => Ok(()),
                    _ => Err(vec!["id".to_string()]),
                }
            }
        }
        struct Never;
        impl InstanceValidator for Never {
            fn validate(&self, _instance: &Value) -> Result<(), Vec<String>> {
                Err(vec!["id".to_string()])
            }
        }

        let config = GenerationConfig {
            respect_validators: true,
            validator_max_retries: 20,
            ..GenerationConfig::with_seed(42)
        };
        let mut engine = InstanceGenerator::new(user_graph(), config).expect("engine builds");
        engine.add_validator(Box::new(EvenId));
        let instance = engine.generate("app.User").expect("converges");
        let id = instance.value.field("id").and_then(Value::as_i64).expect("has id");
        assert_eq!(id % 2, 0);

        let config = GenerationConfig {
            respect_validators: true,
            validator_max_retries: 3,
            ..GenerationConfig::with_seed(42)
        };
        let mut engine = InstanceGenerator::new(user_graph(), config).expect("engine builds");
        engine.add_validator(Box::new(Never));
        assert!(matches!(
            engine.generate("app.User"),
            Err(GenerationError::ValidatorExhausted { attempts: 3, .. })
        ));
    }

    #[test]
    fn validator_retries_reach_nested_model_fields() {
        struct EvenInner;
        impl InstanceValidator for EvenInner {
            fn validate(&self, instance: &Value) -> Result<(), Vec<String>> {
                let inner = instance.field("inner");
                match inner.and_then(|value| value.field("v")).and_then(Value::as_i64) {
                    Some(v) if v % 2 == 0 => Ok(()),
                    _ => Err(vec!["Inner.v".to_string()]),
                }
            }
        }

        let graph = ModelGraph::new(vec![
            ModelDecl {
                id: "Outer".to_string(),
                fields: vec![FieldDecl::new(
                    "inner",
                    FieldType::Model {
                        id: "Inner".to_string(),
                    },
                )],
            },
            ModelDecl {
                id: "Inner".to_string(),
                fields: vec![FieldDecl::new("v", FieldType::Int).with_constraints(
                    FieldConstraints {
                        ge: Some(1.0),
                        le: Some(1000.0),
                        ..FieldConstraints::default()
                    },
                )],
            },
        ]);
        let config = GenerationConfig {
            respect_validators: true,
            validator_max_retries: 50,
            ..GenerationConfig::with_seed(42)
        };
        let mut engine = InstanceGenerator::new(graph, config).expect("engine builds");
        engine.add_validator(Box::new(EvenInner));

        // Retries keyed by a dotted field name must reroll the nested
        // substream, not replay the same bytes until exhaustion.
        let instance = engine.generate("Outer").expect("converges");
        let v = instance
            .value
            .field("inner")
            .and_then(|inner| inner.field("v"))
            .and_then(Value::as_i64)
            .expect("has inner.v");
        assert_eq!(v % 2, 0);
    }

    #[test]
    fn generate_many_equals_indexed_generation() {
        let engine = InstanceGenerator::new(user_graph(), GenerationConfig::with_seed(99))
            .expect("engine builds");
        let streamed: Vec<Value> = engine
            .generate_many("app.User", 3)
            .map(|result| result.expect("generates").value)
            .collect();
        for (index, value) in streamed.iter().enumerate() {
            let direct = engine
                .generate_indexed("app.User", index as u64)
                .expect("generates");
            assert_eq!(&direct.value, value);
        }
    }
}
