//! String providers: charset-bounded text and regex-pattern text.

use rand::{Rng, RngCore};
use rand_regex::Regex as RandRegex;
use regex::Regex;

use fixturegen_core::FieldConstraints;

use crate::errors::GenerationError;
use crate::value::Value;

use super::{Provider, ProviderContext, ProviderRegistry};

const DEFAULT_MIN_LEN: usize = 1;
const DEFAULT_MAX_LEN: usize = 16;
const DEFAULT_CHARSET: &str = "abcdefghijklmnopqrstuvwxyz";
/// Repetition cap handed to the pattern compiler for unbounded
/// quantifiers (`*`, `+`).
const PATTERN_MAX_REPEAT: u32 = 16;
/// Resampling attempts before a pattern that cannot satisfy length
/// bounds is reported.
const PATTERN_RETRIES: u32 = 16;

pub(super) fn register(registry: &mut ProviderRegistry) {
    registry.install(Box::new(BoundedTextProvider), &[("string", None)]);
    registry.install(
        Box::new(PatternTextProvider),
        &[("string", Some("pattern"))],
    );
}

pub struct BoundedTextProvider;

impl Provider for BoundedTextProvider {
    fn name(&self) -> &'static str {
        "text.bounded"
    }

    fn generate(
        &self,
        ctx: &ProviderContext<'_>,
        constraints: &FieldConstraints,
        options: Option<&serde_json::Value>,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        let charset: Vec<char> = options
            .and_then(|value| value.get("charset"))
            .and_then(|value| value.as_str())
            .unwrap_or(DEFAULT_CHARSET)
            .chars()
            .collect();
        if charset.is_empty() {
            return Err(GenerationError::InvalidOptions {
                provider: self.name().to_string(),
                message: "'charset' must not be empty".to_string(),
            });
        }

        let min_len = constraints.min_length.unwrap_or(DEFAULT_MIN_LEN);
        let max_len = constraints.max_length.unwrap_or(min_len.max(DEFAULT_MAX_LEN));
        if min_len > max_len {
            return Err(GenerationError::ConstraintViolation {
                path: ctx.field_path.to_string(),
                message: format!("empty length range [{min_len}, {max_len}]"),
            });
        }

        let len = rng.random_range(min_len..=max_len);
        let text: String = (0..len)
            .map(|_| charset[rng.random_range(0..charset.len())])
            .collect();
        Ok(Value::Text(text))
    }
}

/// Regex-driven text generation, post-validated against the source
/// pattern and length bounds with bounded resampling.
pub struct PatternTextProvider;

impl Provider for PatternTextProvider {
    fn name(&self) -> &'static str {
        "text.pattern"
    }

    fn generate(
        &self,
        ctx: &ProviderContext<'_>,
        constraints: &FieldConstraints,
        _options: Option<&serde_json::Value>,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        let Some(pattern) = constraints.pattern.as_deref() else {
            return Err(GenerationError::ConstraintViolation {
                path: ctx.field_path.to_string(),
                message: "pattern provider requires a pattern constraint".to_string(),
            });
        };

        let sampler = RandRegex::compile(pattern, PATTERN_MAX_REPEAT).map_err(|error| {
            GenerationError::ConstraintViolation {
                path: ctx.field_path.to_string(),
                message: format!("unsupported pattern '{pattern}': {error}"),
            }
        })?;
        let checker = Regex::new(pattern).map_err(|error| GenerationError::ConstraintViolation {
            path: ctx.field_path.to_string(),
            message: format!("invalid pattern '{pattern}': {error}"),
        })?;

        for _ in 0..PATTERN_RETRIES {
            let candidate: String = rng.sample(&sampler);
            if !checker.is_match(&candidate) {
                continue;
            }
            if let Some(min) = constraints.min_length
                && candidate.chars().count() < min
            {
                continue;
            }
            if let Some(max) = constraints.max_length
                && candidate.chars().count() > max
            {
                continue;
            }
            return Ok(Value::Text(candidate));
        }

        Err(GenerationError::ConstraintViolation {
            path: ctx.field_path.to_string(),
            message: format!(
                "pattern '{pattern}' produced no candidate within length bounds \
                 after {PATTERN_RETRIES} attempts"
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ctx() -> ProviderContext<'static> {
        ProviderContext {
            model_id: "m",
            field_path: "m.f",
            item_index: 0,
            time_anchor: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn bounded_text_honors_length_constraints() {
        let constraints = FieldConstraints {
            min_length: Some(3),
            max_length: Some(5),
            ..FieldConstraints::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..50 {
            let value = BoundedTextProvider
                .generate(&ctx(), &constraints, None, &mut rng)
                .expect("text generates");
            let len = value.as_str().expect("is text").len();
            assert!((3..=5).contains(&len));
        }
    }

    #[test]
    fn bounded_text_uses_custom_charset() {
        let options = serde_json::json!({ "charset": "x" });
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let value = BoundedTextProvider
            .generate(&ctx(), &FieldConstraints::default(), Some(&options), &mut rng)
            .expect("text generates");
        assert!(value.as_str().expect("is text").chars().all(|c| c == 'x'));
    }

    #[test]
    fn pattern_text_matches_its_pattern() {
        let constraints = FieldConstraints {
            pattern: Some("[A-Z]{2}-[0-9]{4}".to_string()),
            ..FieldConstraints::default()
        };
        let checker = Regex::new("^[A-Z]{2}-[0-9]{4}$").expect("valid regex");
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..20 {
            let value = PatternTextProvider
                .generate(&ctx(), &constraints, None, &mut rng)
                .expect("pattern generates");
            assert!(checker.is_match(value.as_str().expect("is text")));
        }
    }

    #[test]
    fn invalid_pattern_is_a_constraint_violation() {
        let constraints = FieldConstraints {
            pattern: Some("[unclosed".to_string()),
            ..FieldConstraints::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let result = PatternTextProvider.generate(&ctx(), &constraints, None, &mut rng);
        assert!(matches!(
            result,
            Err(GenerationError::ConstraintViolation { .. })
        ));
    }
}
