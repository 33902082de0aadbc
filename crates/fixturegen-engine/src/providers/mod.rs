use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use fixturegen_core::{FieldConstraints, FieldType};

use crate::errors::GenerationError;
use crate::value::Value;

pub mod collection;
pub mod identifier;
pub mod numeric;
pub mod temporal;
pub mod text;

/// Name of the placeholder provider substituted when resolution
/// fails and fallback is allowed.
pub const SENTINEL_PROVIDER: &str = "fallback.sentinel";

/// Call-time context handed to providers.
///
/// Providers must be pure functions of `(rng, constraints, options)`;
/// the context carries only immutable keys and the configured time
/// anchor, never wall-clock state.
#[derive(Debug, Clone, Copy)]
pub struct ProviderContext<'a> {
    pub model_id: &'a str,
    pub field_path: &'a str,
    pub item_index: u64,
    pub time_anchor: NaiveDateTime,
}

/// A value provider addressable through the registry.
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    fn generate(
        &self,
        ctx: &ProviderContext<'_>,
        constraints: &FieldConstraints,
        options: Option<&serde_json::Value>,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError>;
}

/// Reference to a registered provider plus its call-time options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
}

impl ProviderRef {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            options: None,
        }
    }
}

/// Registry of provider functions addressable by logical type and
/// constraint shape.
///
/// Resolution order: exact `(type, shape)` binding, then the bare
/// `(type, None)` binding, then a mapping error; the caller decides
/// whether fallback substitution applies.
pub struct ProviderRegistry {
    providers: BTreeMap<String, Box<dyn Provider>>,
    bindings: BTreeMap<(String, Option<String>), String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
            bindings: BTreeMap::new(),
        }
    }

    /// Registry pre-populated with the built-in provider set.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        numeric::register(&mut registry);
        text::register(&mut registry);
        temporal::register(&mut registry);
        identifier::register(&mut registry);
        registry.install(Box::new(SentinelProvider), &[]);
        registry
    }

    /// Install a built-in provider together with its type bindings.
    pub(crate) fn install(
        &mut self,
        provider: Box<dyn Provider>,
        bindings: &[(&str, Option<&str>)],
    ) {
        let name = provider.name().to_string();
        for (tag, shape) in bindings {
            self.bindings.insert(
                (tag.to_string(), shape.map(|value| value.to_string())),
                name.clone(),
            );
        }
        self.providers.insert(name, provider);
    }

    /// Register a provider under its own name. Re-registering a name
    /// is an error unless done through [`ProviderRegistry::replace`].
    pub fn register(&mut self, provider: Box<dyn Provider>) -> Result<(), GenerationError> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(GenerationError::InvalidConfig(format!(
                "provider '{name}' is already registered"
            )));
        }
        self.providers.insert(name, provider);
        Ok(())
    }

    /// Register or overwrite a provider.
    pub fn replace(&mut self, provider: Box<dyn Provider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Bind a `(type, shape)` key to a registered provider name.
    pub fn bind(
        &mut self,
        type_tag: &str,
        shape: Option<&str>,
        provider_name: &str,
    ) -> Result<(), GenerationError> {
        if !self.providers.contains_key(provider_name) {
            return Err(GenerationError::InvalidConfig(format!(
                "cannot bind '{type_tag}' to unknown provider '{provider_name}'"
            )));
        }
        self.bindings.insert(
            (type_tag.to_string(), shape.map(|value| value.to_string())),
            provider_name.to_string(),
        );
        Ok(())
    }

    /// Resolve a field type and constraint shape to a provider.
    pub fn resolve(
        &self,
        field_path: &str,
        ty: &FieldType,
        constraints: &FieldConstraints,
    ) -> Result<ProviderRef, GenerationError> {
        let tag = ty.tag();
        let shape = constraint_shape(ty, constraints);

        if let Some(shape) = shape.as_deref()
            && let Some(name) = self
                .bindings
                .get(&(tag.to_string(), Some(shape.to_string())))
        {
            return Ok(ProviderRef::named(name));
        }
        if let Some(name) = self.bindings.get(&(tag.to_string(), None)) {
            return Ok(ProviderRef::named(name));
        }

        Err(GenerationError::Mapping {
            path: field_path.to_string(),
            hint: format!(
                "no provider registered for type '{tag}'; register one or enable fallback"
            ),
        })
    }

    /// Invoke a resolved provider.
    pub fn invoke(
        &self,
        provider_ref: &ProviderRef,
        ctx: &ProviderContext<'_>,
        constraints: &FieldConstraints,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        let provider =
            self.providers
                .get(&provider_ref.name)
                .ok_or_else(|| GenerationError::Mapping {
                    path: ctx.field_path.to_string(),
                    hint: format!("provider '{}' is not registered", provider_ref.name),
                })?;
        provider.generate(ctx, constraints, provider_ref.options.as_ref(), rng)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered provider names in deterministic order.
    pub fn available(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Constraint-shape discriminator mirrored from the original
/// `(type_id, format)` keying: the only shape currently
/// distinguished is pattern-constrained strings.
fn constraint_shape(ty: &FieldType, constraints: &FieldConstraints) -> Option<String> {
    match ty {
        FieldType::String if constraints.pattern.is_some() => Some("pattern".to_string()),
        _ => None,
    }
}

/// Placeholder provider used when mapping fails but fallback is
/// allowed; always yields the same sentinel text.
struct SentinelProvider;

impl Provider for SentinelProvider {
    fn name(&self) -> &'static str {
        SENTINEL_PROVIDER
    }

    fn generate(
        &self,
        ctx: &ProviderContext<'_>,
        _constraints: &FieldConstraints,
        _options: Option<&serde_json::Value>,
        _rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        Ok(Value::Text(format!("<unmapped:{}>", ctx.field_path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_prefers_shape_binding_over_type_binding() {
        let registry = ProviderRegistry::with_builtins();
        let plain = registry
            .resolve("m.f", &FieldType::String, &FieldConstraints::default())
            .expect("plain string resolves");
        let patterned = registry
            .resolve(
                "m.f",
                &FieldType::String,
                &FieldConstraints {
                    pattern: Some("[a-z]+".to_string()),
                    ..FieldConstraints::default()
                },
            )
            .expect("patterned string resolves");
        assert_ne!(plain.name, patterned.name);
    }

    #[test]
    fn unknown_type_is_a_mapping_error() {
        let registry = ProviderRegistry::with_builtins();
        let result = registry.resolve("m.f", &FieldType::Unknown, &FieldConstraints::default());
        assert!(matches!(result, Err(GenerationError::Mapping { .. })));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ProviderRegistry::with_builtins();
        let result = registry.register(Box::new(SentinelProvider));
        assert!(matches!(result, Err(GenerationError::InvalidConfig(_))));
    }
}
