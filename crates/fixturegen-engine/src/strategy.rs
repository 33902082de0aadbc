//! Field-to-provider resolution.
//!
//! Resolution runs once per engine construction and produces an
//! immutable strategy table; generation never re-resolves, so the
//! same schema, registry and config always yield the same plan.

use std::collections::BTreeMap;

use tracing::debug;

use fixturegen_core::{FieldConstraints, FieldDecl, FieldType, ModelDecl, ModelGraph};

use crate::config::{EnumPolicy, GenerationConfig, OverrideAction, UnionPolicy};
use crate::errors::GenerationError;
use crate::providers::{ProviderRef, ProviderRegistry};
use crate::value::Value;

/// Resolved generation plan for a single field or member type.
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    /// Dotted path this strategy was resolved for.
    pub field_path: String,
    pub constraints: FieldConstraints,
    pub nullable: bool,
    /// Effective null probability for this field.
    pub p_none: f64,
    pub kind: StrategyKind,
}

/// What actually produces the value.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyKind {
    /// Registry provider invocation.
    Provider(ProviderRef),
    /// Override-pinned value; consumes no randomness.
    Fixed(Value),
    /// Schema-declared default; consumes no randomness.
    Default(Value),
    /// Closed member set resolved by enum policy.
    Enum {
        members: Vec<String>,
        policy: EnumPolicy,
    },
    /// Single fixed literal from the schema.
    Literal(Value),
    /// Member types resolved by union policy.
    Union {
        arms: Vec<Strategy>,
        policy: UnionPolicy,
        weights: Option<Vec<f64>>,
    },
    List {
        item: Box<Strategy>,
    },
    Map {
        key: Box<Strategy>,
        value: Box<Strategy>,
    },
    /// Recursive descent into another model, guarded by the cycle
    /// policy at generation time.
    Nested {
        model_id: String,
    },
    /// Placeholder emitted when mapping failed and fallback is on.
    Sentinel,
}

/// Strategies per model id, with fields in declaration order.
pub type StrategyTable = BTreeMap<String, Vec<(String, Strategy)>>;

/// Resolves every field of every model to its strategy.
pub struct PolicyResolver<'a> {
    registry: &'a ProviderRegistry,
    config: &'a GenerationConfig,
}

impl<'a> PolicyResolver<'a> {
    pub fn new(registry: &'a ProviderRegistry, config: &'a GenerationConfig) -> Self {
        Self { registry, config }
    }

    /// Resolve the whole graph up front.
    pub fn resolve_graph(&self, graph: &ModelGraph) -> Result<StrategyTable, GenerationError> {
        let mut table = StrategyTable::new();
        for model in &graph.models {
            table.insert(model.id.clone(), self.resolve_model(model)?);
        }
        Ok(table)
    }

    fn resolve_model(
        &self,
        model: &ModelDecl,
    ) -> Result<Vec<(String, Strategy)>, GenerationError> {
        let mut strategies = Vec::with_capacity(model.fields.len());
        for field in &model.fields {
            let path = format!("{}.{}", model.id, field.name);
            let strategy = self.resolve_field(&path, field)?;
            debug!(path = %path, kind = strategy_label(&strategy.kind), "field resolved");
            strategies.push((field.name.clone(), strategy));
        }
        Ok(strategies)
    }

    /// Resolve one declared field, applying the full precedence
    /// chain: override, schema default, name heuristic, type binding,
    /// fallback.
    pub fn resolve_field(
        &self,
        path: &str,
        field: &FieldDecl,
    ) -> Result<Strategy, GenerationError> {
        let mut p_none = if field.nullable { self.config.p_none } else { 0.0 };

        for over in &self.config.field_overrides {
            if !glob_match(&over.pattern, path) {
                continue;
            }
            match &over.action {
                OverrideAction::FixedValue { value } => {
                    return Ok(Strategy {
                        field_path: path.to_string(),
                        constraints: field.constraints.clone(),
                        nullable: field.nullable,
                        p_none,
                        kind: StrategyKind::Fixed(Value::from_json(value)),
                    });
                }
                OverrideAction::Provider { name, options } => {
                    if !self.registry.contains(name) {
                        return Err(GenerationError::Mapping {
                            path: path.to_string(),
                            hint: format!("override names unregistered provider '{name}'"),
                        });
                    }
                    return Ok(Strategy {
                        field_path: path.to_string(),
                        constraints: field.constraints.clone(),
                        nullable: field.nullable,
                        p_none,
                        kind: StrategyKind::Provider(ProviderRef {
                            name: name.clone(),
                            options: options.clone(),
                        }),
                    });
                }
                OverrideAction::PNone { p_none: pinned } => {
                    // Adjusts presence only; value resolution continues.
                    p_none = *pinned;
                }
            }
        }

        if let Some(default) = &field.default
            && !self.config.ignore_defaults
        {
            return Ok(Strategy {
                field_path: path.to_string(),
                constraints: field.constraints.clone(),
                nullable: field.nullable,
                p_none,
                kind: StrategyKind::Default(Value::from_json(default)),
            });
        }

        if let Some(provider) = self.name_heuristic(&field.name, &field.ty) {
            return Ok(Strategy {
                field_path: path.to_string(),
                constraints: field.constraints.clone(),
                nullable: field.nullable,
                p_none,
                kind: StrategyKind::Provider(provider),
            });
        }

        let kind = self.resolve_type(path, &field.ty, &field.constraints)?;
        Ok(Strategy {
            field_path: path.to_string(),
            constraints: field.constraints.clone(),
            nullable: field.nullable,
            p_none,
            kind,
        })
    }

    /// Structural resolution of a type once overrides, defaults and
    /// heuristics are out of the way.
    fn resolve_type(
        &self,
        path: &str,
        ty: &FieldType,
        constraints: &FieldConstraints,
    ) -> Result<StrategyKind, GenerationError> {
        match ty {
            FieldType::Enum { members } => Ok(StrategyKind::Enum {
                members: members.clone(),
                policy: self.config.enum_policy,
            }),
            FieldType::Literal { value } => Ok(StrategyKind::Literal(Value::from_json(value))),
            FieldType::Union { members } => {
                let arms: Vec<Strategy> = members
                    .iter()
                    .map(|member| {
                        let kind = self.resolve_type(path, member, &FieldConstraints::default())?;
                        Ok(Strategy {
                            field_path: path.to_string(),
                            constraints: FieldConstraints::default(),
                            nullable: false,
                            p_none: 0.0,
                            kind,
                        })
                    })
                    .collect::<Result<_, GenerationError>>()?;
                let weights = self.union_weights(path, arms.len())?;
                Ok(StrategyKind::Union {
                    arms,
                    policy: self.config.union_policy,
                    weights,
                })
            }
            FieldType::List { item } => {
                let kind = self.resolve_type(path, item, &FieldConstraints::default())?;
                Ok(StrategyKind::List {
                    item: Box::new(Strategy {
                        field_path: path.to_string(),
                        constraints: FieldConstraints::default(),
                        nullable: false,
                        p_none: 0.0,
                        kind,
                    }),
                })
            }
            FieldType::Map { key, value } => {
                let key_kind = self.resolve_type(path, key, &FieldConstraints::default())?;
                let value_kind = self.resolve_type(path, value, &FieldConstraints::default())?;
                let leaf = |kind| Strategy {
                    field_path: path.to_string(),
                    constraints: FieldConstraints::default(),
                    nullable: false,
                    p_none: 0.0,
                    kind,
                };
                Ok(StrategyKind::Map {
                    key: Box::new(leaf(key_kind)),
                    value: Box::new(leaf(value_kind)),
                })
            }
            FieldType::Model { id } => Ok(StrategyKind::Nested {
                model_id: id.clone(),
            }),
            scalar => match self.registry.resolve(path, scalar, constraints) {
                Ok(provider) => Ok(StrategyKind::Provider(provider)),
                Err(error) if self.config.allow_fallback => {
                    debug!(path = %path, %error, "mapping failed, using fallback sentinel");
                    Ok(StrategyKind::Sentinel)
                }
                Err(error) => Err(error),
            },
        }
    }

    /// Name-based provider selection for plain strings, mirroring
    /// common schema conventions (`email`, `url` in the field name).
    fn name_heuristic(&self, name: &str, ty: &FieldType) -> Option<ProviderRef> {
        if !matches!(ty, FieldType::String) {
            return None;
        }
        let lowered = name.to_ascii_lowercase();
        if lowered.contains("email") {
            return Some(ProviderRef::named("ident.email"));
        }
        if lowered.contains("url") {
            return Some(ProviderRef::named("ident.url"));
        }
        if lowered.contains("uuid") {
            return Some(ProviderRef::named("ident.uuid"));
        }
        None
    }

    /// Resolve declared weights into one entry per member. Omitted
    /// or `None` entries share the residual mass equally.
    fn union_weights(
        &self,
        path: &str,
        arm_count: usize,
    ) -> Result<Option<Vec<f64>>, GenerationError> {
        let Some(declared) = self.config.union_weights.get(path) else {
            return Ok(None);
        };
        if declared.len() > arm_count {
            return Err(GenerationError::InvalidConfig(format!(
                "union weights for '{path}' have {} entries, union has {arm_count} members",
                declared.len()
            )));
        }
        if declared.iter().flatten().any(|weight| *weight < 0.0) {
            return Err(GenerationError::InvalidConfig(format!(
                "union weights for '{path}' must be non-negative"
            )));
        }

        let explicit_mass: f64 = declared.iter().flatten().sum();
        let unweighted = arm_count - declared.iter().filter(|entry| entry.is_some()).count();
        let residual_share = if unweighted > 0 {
            (1.0 - explicit_mass).max(0.0) / unweighted as f64
        } else {
            0.0
        };

        let mut weights = Vec::with_capacity(arm_count);
        for index in 0..arm_count {
            match declared.get(index).copied().flatten() {
                Some(weight) => weights.push(weight),
                None => weights.push(residual_share),
            }
        }
        Ok(Some(weights))
    }
}

fn strategy_label(kind: &StrategyKind) -> &'static str {
    match kind {
        StrategyKind::Provider(_) => "provider",
        StrategyKind::Fixed(_) => "fixed",
        StrategyKind::Default(_) => "default",
        StrategyKind::Enum { .. } => "enum",
        StrategyKind::Literal(_) => "literal",
        StrategyKind::Union { .. } => "union",
        StrategyKind::List { .. } => "list",
        StrategyKind::Map { .. } => "map",
        StrategyKind::Nested { .. } => "nested",
        StrategyKind::Sentinel => "sentinel",
    }
}

/// Minimal glob matcher over dotted paths: `*` matches any run of
/// characters, `?` matches exactly one.
pub fn glob_match(pattern: &str, path: &str) -> bool {
    fn inner(pattern: &[char], path: &[char]) -> bool {
        match (pattern.first(), path.first()) {
            (None, None) => true,
            (Some('*'), _) => {
                inner(&pattern[1..], path)
                    || (!path.is_empty() && inner(pattern, &path[1..]))
            }
            (Some('?'), Some(_)) => inner(&pattern[1..], &path[1..]),
            (Some(expected), Some(actual)) if expected == actual => {
                inner(&pattern[1..], &path[1..])
            }
            _ => false,
        }
    }
    let pattern: Vec<char> = pattern.chars().collect();
    let path: Vec<char> = path.chars().collect();
    inner(&pattern, &path)
}
