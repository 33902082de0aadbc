//! Collection sizing and uniqueness helpers used by the instance
//! walker for lists and maps.

use std::collections::BTreeSet;

use rand::{Rng, RngCore};

use fixturegen_core::FieldConstraints;

use crate::errors::GenerationError;
use crate::value::Value;

pub const DEFAULT_MIN_ITEMS: usize = 0;
pub const DEFAULT_MAX_ITEMS: usize = 5;

/// Draw a collection size from the item bounds. The draw itself comes
/// from the field's substream, so sizes replay with the seed.
pub fn draw_size(
    field_path: &str,
    constraints: &FieldConstraints,
    rng: &mut dyn RngCore,
) -> Result<usize, GenerationError> {
    let min = constraints.min_items.unwrap_or(DEFAULT_MIN_ITEMS);
    let max = constraints.max_items.unwrap_or(min.max(DEFAULT_MAX_ITEMS));
    if min > max {
        return Err(GenerationError::ConstraintViolation {
            path: field_path.to_string(),
            message: format!("empty item-count range [{min}, {max}]"),
        });
    }
    if min == max {
        return Ok(min);
    }
    Ok(rng.random_range(min..=max))
}

/// Tracks canonical renderings of accepted items for `unique_items`
/// collections.
#[derive(Debug, Default)]
pub struct UniqueSet {
    seen: BTreeSet<String>,
}

impl UniqueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept the value if its canonical key is unseen.
    pub fn try_insert(&mut self, value: &Value) -> bool {
        self.seen.insert(value.canonical_key())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn size_respects_item_bounds() {
        let constraints = FieldConstraints {
            min_items: Some(2),
            max_items: Some(4),
            ..FieldConstraints::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..50 {
            let size = draw_size("m.items", &constraints, &mut rng).expect("size draws");
            assert!((2..=4).contains(&size));
        }
    }

    #[test]
    fn fixed_size_consumes_no_randomness() {
        let constraints = FieldConstraints {
            min_items: Some(3),
            max_items: Some(3),
            ..FieldConstraints::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let before = rng.clone();
        let size = draw_size("m.items", &constraints, &mut rng).expect("size draws");
        assert_eq!(size, 3);
        assert_eq!(rng, before);
    }

    #[test]
    fn inverted_item_bounds_are_rejected() {
        let constraints = FieldConstraints {
            min_items: Some(5),
            max_items: Some(2),
            ..FieldConstraints::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(draw_size("m.items", &constraints, &mut rng).is_err());
    }

    #[test]
    fn unique_set_rejects_equal_canonical_keys() {
        let mut set = UniqueSet::new();
        assert!(set.try_insert(&Value::Int(1)));
        assert!(!set.try_insert(&Value::Int(1)));
        assert!(set.try_insert(&Value::Int(2)));
        assert_eq!(set.len(), 2);
    }
}
