//! Identifier providers: UUIDs, email addresses and URLs.

use rand::{Rng, RngCore};
use uuid::Uuid;

use fixturegen_core::FieldConstraints;

use crate::errors::GenerationError;
use crate::value::Value;

use super::{Provider, ProviderContext, ProviderRegistry};

const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "test.dev"];
const URL_HOSTS: &[&str] = &["example.com", "service.test", "api.example.org"];
const SLUG_CHARSET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

pub(super) fn register(registry: &mut ProviderRegistry) {
    registry.install(Box::new(UuidProvider), &[("uuid", None)]);
    registry.install(Box::new(EmailProvider), &[("email", None)]);
    registry.install(Box::new(UrlProvider), &[("url", None)]);
}

fn slug(rng: &mut dyn RngCore, len: usize) -> String {
    let charset: Vec<char> = SLUG_CHARSET.chars().collect();
    (0..len)
        .map(|_| charset[rng.random_range(0..charset.len())])
        .collect()
}

/// Version-4 UUIDs drawn from the field's substream rather than OS
/// entropy, so identifiers replay with the seed.
pub struct UuidProvider;

impl Provider for UuidProvider {
    fn name(&self) -> &'static str {
        "ident.uuid"
    }

    fn generate(
        &self,
        _ctx: &ProviderContext<'_>,
        _constraints: &FieldConstraints,
        _options: Option<&serde_json::Value>,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        let mut bytes = [0u8; 16];
        rng.fill_bytes(&mut bytes);
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;
        Ok(Value::Uuid(Uuid::from_bytes(bytes).to_string()))
    }
}

pub struct EmailProvider;

impl Provider for EmailProvider {
    fn name(&self) -> &'static str {
        "ident.email"
    }

    fn generate(
        &self,
        _ctx: &ProviderContext<'_>,
        _constraints: &FieldConstraints,
        _options: Option<&serde_json::Value>,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        let local_len = rng.random_range(5..=12);
        let local = slug(rng, local_len);
        let domain = EMAIL_DOMAINS[rng.random_range(0..EMAIL_DOMAINS.len())];
        Ok(Value::Text(format!("{local}@{domain}")))
    }
}

pub struct UrlProvider;

impl Provider for UrlProvider {
    fn name(&self) -> &'static str {
        "ident.url"
    }

    fn generate(
        &self,
        _ctx: &ProviderContext<'_>,
        _constraints: &FieldConstraints,
        _options: Option<&serde_json::Value>,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        let host = URL_HOSTS[rng.random_range(0..URL_HOSTS.len())];
        let path_len = rng.random_range(4..=10);
        let path = slug(rng, path_len);
        Ok(Value::Text(format!("https://{host}/{path}")))
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
    fn uuid_is_version_4_and_seed_stable() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        let first = UuidProvider
            .generate(&ctx(), &FieldConstraints::default(), None, &mut a)
            .expect("uuid generates");
        let second = UuidProvider
            .generate(&ctx(), &FieldConstraints::default(), None, &mut b)
            .expect("uuid generates");
        assert_eq!(first, second);

        let parsed = Uuid::parse_str(first.as_str().expect("is text")).expect("valid uuid");
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn email_has_local_and_known_domain() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let value = EmailProvider
            .generate(&ctx(), &FieldConstraints::default(), None, &mut rng)
            .expect("email generates");
        let text = value.as_str().expect("is text");
        let (local, domain) = text.split_once('@').expect("has @");
        assert!(!local.is_empty());
        assert!(EMAIL_DOMAINS.contains(&domain));
    }

    #[test]
    fn url_is_https_with_a_path() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let value = UrlProvider
            .generate(&ctx(), &FieldConstraints::default(), None, &mut rng)
            .expect("url generates");
        let text = value.as_str().expect("is text");
        assert!(text.starts_with("https://"));
        assert!(text.rsplit_once('/').is_some());
    }
}
