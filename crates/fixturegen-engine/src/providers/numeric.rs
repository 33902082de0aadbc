//! Numeric providers: bounded integers, floats, quantized decimals
//! and booleans.

use rand::{Rng, RngCore};

use fixturegen_core::FieldConstraints;

use crate::errors::GenerationError;
use crate::value::Value;

use super::{Provider, ProviderContext, ProviderRegistry};

const DEFAULT_INT_MIN: i64 = 0;
const DEFAULT_INT_MAX: i64 = 10_000;
const DEFAULT_FLOAT_MIN: f64 = 0.0;
const DEFAULT_FLOAT_MAX: f64 = 10_000.0;
/// Step used to fold exclusive float bounds into inclusive ones.
const FLOAT_EPSILON: f64 = 1e-6;
const DEFAULT_DECIMAL_PLACES: u32 = 2;
const DEFAULT_DECIMAL_DIGITS: u32 = 8;

pub(super) fn register(registry: &mut ProviderRegistry) {
    registry.install(Box::new(IntProvider), &[("int", None)]);
    registry.install(Box::new(FloatProvider), &[("float", None)]);
    registry.install(Box::new(DecimalProvider), &[("decimal", None)]);
    registry.install(Box::new(BoolProvider), &[("bool", None)]);
}

fn option_f64(
    provider: &str,
    options: Option<&serde_json::Value>,
    key: &str,
) -> Result<Option<f64>, GenerationError> {
    let Some(raw) = options.and_then(|value| value.get(key)) else {
        return Ok(None);
    };
    raw.as_f64()
        .map(Some)
        .ok_or_else(|| GenerationError::InvalidOptions {
            provider: provider.to_string(),
            message: format!("'{key}' must be a number"),
        })
}

pub struct IntProvider;

impl Provider for IntProvider {
    fn name(&self) -> &'static str {
        "number.int"
    }

    fn generate(
        &self,
        ctx: &ProviderContext<'_>,
        constraints: &FieldConstraints,
        options: Option<&serde_json::Value>,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        let fallback_min = option_f64(self.name(), options, "min")?
            .map(|value| value as i64)
            .unwrap_or(DEFAULT_INT_MIN);
        let fallback_max = option_f64(self.name(), options, "max")?
            .map(|value| value as i64)
            .unwrap_or(DEFAULT_INT_MAX);

        let lo = constraints
            .lower_bound(1.0)
            .map(|value| value.ceil() as i64)
            .unwrap_or(fallback_min);
        let hi = constraints
            .upper_bound(1.0)
            .map(|value| value.floor() as i64)
            .unwrap_or(fallback_max);
        if lo > hi {
            return Err(GenerationError::ConstraintViolation {
                path: ctx.field_path.to_string(),
                message: format!("empty integer range [{lo}, {hi}]"),
            });
        }
        Ok(Value::Int(rng.random_range(lo..=hi)))
    }
}

pub struct FloatProvider;

impl Provider for FloatProvider {
    fn name(&self) -> &'static str {
        "number.float"
    }

    fn generate(
        &self,
        ctx: &ProviderContext<'_>,
        constraints: &FieldConstraints,
        options: Option<&serde_json::Value>,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        let fallback_min = option_f64(self.name(), options, "min")?.unwrap_or(DEFAULT_FLOAT_MIN);
        let fallback_max = option_f64(self.name(), options, "max")?.unwrap_or(DEFAULT_FLOAT_MAX);

        let lo = constraints.lower_bound(FLOAT_EPSILON).unwrap_or(fallback_min);
        let hi = constraints.upper_bound(FLOAT_EPSILON).unwrap_or(fallback_max);
        if lo > hi {
            return Err(GenerationError::ConstraintViolation {
                path: ctx.field_path.to_string(),
                message: format!("empty float range [{lo}, {hi}]"),
            });
        }
        if lo == hi {
            return Ok(Value::Float(lo));
        }
        Ok(Value::Float(rng.random_range(lo..=hi)))
    }
}

/// Decimal generator that samples an integer number of quanta
/// (`10^-places`) within the constrained range, so the declared scale
/// is always exact and no float rounding leaks into the output.
pub struct DecimalProvider;

impl Provider for DecimalProvider {
    fn name(&self) -> &'static str {
        "number.decimal"
    }

    fn generate(
        &self,
        ctx: &ProviderContext<'_>,
        constraints: &FieldConstraints,
        _options: Option<&serde_json::Value>,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        let places = constraints.decimal_places.unwrap_or(DEFAULT_DECIMAL_PLACES);
        let digits = constraints.max_digits.unwrap_or(DEFAULT_DECIMAL_DIGITS);
        let quantum = 10f64.powi(-(places as i32));

        // Widest magnitude representable with `digits` total digits.
        let max_units = 10i64
            .checked_pow(digits.min(18))
            .map(|value| value - 1)
            .unwrap_or(i64::MAX);

        let lo_units = constraints
            .lower_bound(quantum)
            .map(|value| (value / quantum).ceil() as i64)
            .unwrap_or(0)
            .max(-max_units);
        let hi_units = constraints
            .upper_bound(quantum)
            .map(|value| (value / quantum).floor() as i64)
            .unwrap_or(max_units)
            .min(max_units);
        if lo_units > hi_units {
            return Err(GenerationError::ConstraintViolation {
                path: ctx.field_path.to_string(),
                message: format!(
                    "empty decimal range ({} quanta of {quantum})",
                    hi_units - lo_units
                ),
            });
        }

        let units = rng.random_range(lo_units..=hi_units);
        Ok(Value::Decimal(format_units(units, places)))
    }
}

/// Render a quantum count as a fixed-scale decimal string.
fn format_units(units: i64, places: u32) -> String {
    if places == 0 {
        return units.to_string();
    }
    let scale = 10i64.pow(places.min(18));
    let sign = if units < 0 { "-" } else { "" };
    let magnitude = units.unsigned_abs();
    let whole = magnitude / scale as u64;
    let frac = magnitude % scale as u64;
    format!("{sign}{whole}.{frac:0width$}", width = places as usize)
}

pub struct BoolProvider;

impl Provider for BoolProvider {
    fn name(&self) -> &'static str {
        "number.bool"
    }

    fn generate(
        &self,
        _ctx: &ProviderContext<'_>,
        _constraints: &FieldConstraints,
        options: Option<&serde_json::Value>,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        let p_true = option_f64(self.name(), options, "p_true")?.unwrap_or(0.5);
        if !(0.0..=1.0).contains(&p_true) {
            return Err(GenerationError::InvalidOptions {
                provider: self.name().to_string(),
                message: format!("'p_true' must be within [0, 1], got {p_true}"),
            });
        }
        Ok(Value::Bool(rng.random_bool(p_true)))
    }
}
