use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::rng::RngMode;

/// Policy for selecting a member of a union type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnionPolicy {
    /// Always the first declared member; consumes no randomness.
    First,
    /// Uniform draw from the field's substream.
    Random,
    /// Draw from configured weights; unweighted members share the
    /// residual mass equally.
    Weighted,
}

/// Policy for selecting an enum or literal member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumPolicy {
    First,
    Random,
}

/// Rule for resolving recursive/self-referential generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Return a previously completed instance of the same model.
    Reuse,
    /// Return a minimal placeholder with recursive fields nulled.
    Stub,
    /// Substitute null; legal only on optional fields.
    Null,
}

/// Per-field policy override matched by glob over dotted field paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOverride {
    /// Glob pattern (`*`/`?`) over `model.field.subfield` paths.
    pub pattern: String,
    pub action: OverrideAction,
}

/// What an override pins for matching fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OverrideAction {
    /// Emit this value verbatim; consumes no randomness.
    FixedValue { value: serde_json::Value },
    /// Route the field to a named provider with optional options.
    Provider {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<serde_json::Value>,
    },
    /// Adjust the null probability for matching fields.
    PNone { p_none: f64 },
}

/// Run-scoped generation configuration.
///
/// Created once per invocation and never mutated after the run
/// starts; serialized alongside run artifacts so a run can be
/// reproduced from its snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Master seed for the substream cascade.
    pub seed: u64,
    pub rng_mode: RngMode,
    /// Maximum nesting depth before the cycle policy fires.
    pub recursion_limit: u32,
    /// Maximum nested objects per top-level instance build.
    pub object_budget: u32,
    /// Substitute a sentinel value when no provider maps a field.
    pub allow_fallback: bool,
    /// Skip schema-declared defaults and always generate.
    pub ignore_defaults: bool,
    pub union_policy: UnionPolicy,
    pub enum_policy: EnumPolicy,
    /// Null probability applied to nullable fields.
    pub p_none: f64,
    pub cycle_policy: CyclePolicy,
    /// Re-generate failing fields when an external validator rejects
    /// a candidate instance.
    pub respect_validators: bool,
    pub validator_max_retries: u32,
    /// Bounded resampling attempts for unique collections.
    pub unique_retry_limit: u32,
    /// Fixed reference instant for temporal providers; wall-clock is
    /// never consulted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_anchor: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_overrides: Vec<FieldOverride>,
    /// Weights for `UnionPolicy::Weighted`, keyed by dotted field
    /// path, aligned with union member order. Entries may be `None`
    /// (and trailing members may be omitted): unweighted members
    /// split the residual mass equally.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub union_weights: BTreeMap<String, Vec<Option<f64>>>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            rng_mode: RngMode::Portable,
            recursion_limit: 4,
            object_budget: 1000,
            allow_fallback: false,
            ignore_defaults: false,
            union_policy: UnionPolicy::First,
            enum_policy: EnumPolicy::First,
            p_none: 0.0,
            cycle_policy: CyclePolicy::Null,
            respect_validators: false,
            validator_max_retries: 5,
            unique_retry_limit: 50,
            time_anchor: None,
            field_overrides: Vec::new(),
            union_weights: BTreeMap::new(),
        }
    }
}

impl GenerationConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Check configuration consistency before a run starts.
    pub fn validate(&self) -> Result<(), crate::errors::GenerationError> {
        if !(0.0..=1.0).contains(&self.p_none) {
            return Err(crate::errors::GenerationError::InvalidConfig(format!(
                "p_none must be within [0, 1], got {}",
                self.p_none
            )));
        }
        if self.object_budget == 0 {
            return Err(crate::errors::GenerationError::InvalidConfig(
                "object_budget must be at least 1".to_string(),
            ));
        }
        for over in &self.field_overrides {
            if let OverrideAction::PNone { p_none } = &over.action
                && !(0.0..=1.0).contains(p_none)
            {
                return Err(crate::errors::GenerationError::InvalidConfig(format!(
                    "override '{}': p_none must be within [0, 1]",
                    over.pattern
                )));
            }
        }
        Ok(())
    }
}
