use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Normalized per-field validation constraints.
///
/// Bounds are optional and internally consistent; a violated pair
/// (`ge > le`, `min_length > max_length`, ...) is a configuration
/// error surfaced by [`FieldConstraints::validate`], never a panic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConstraints {
    /// Inclusive lower numeric bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ge: Option<f64>,
    /// Inclusive upper numeric bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub le: Option<f64>,
    /// Exclusive lower numeric bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
    /// Exclusive upper numeric bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regex pattern generated strings must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Collection items must be pairwise distinct.
    #[serde(default)]
    pub unique_items: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_digits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u32>,
}

impl FieldConstraints {
    /// True when no constraint is set at all.
    pub fn is_empty(&self) -> bool {
        *self == FieldConstraints::default()
    }

    /// Effective inclusive lower bound, folding `gt` with a unit step.
    pub fn lower_bound(&self, step: f64) -> Option<f64> {
        match (self.ge, self.gt) {
            (Some(ge), Some(gt)) => Some(ge.max(gt + step)),
            (Some(ge), None) => Some(ge),
            (None, Some(gt)) => Some(gt + step),
            (None, None) => None,
        }
    }

    /// Effective inclusive upper bound, folding `lt` with a unit step.
    pub fn upper_bound(&self, step: f64) -> Option<f64> {
        match (self.le, self.lt) {
            (Some(le), Some(lt)) => Some(le.min(lt - step)),
            (Some(le), None) => Some(le),
            (None, Some(lt)) => Some(lt - step),
            (None, None) => None,
        }
    }

    /// Check internal consistency of the declared bounds.
    pub fn validate(&self, context: &str) -> Result<()> {
        if let (Some(ge), Some(le)) = (self.ge, self.le)
            && ge > le
        {
            return Err(Error::InvalidSchema(format!(
                "{context}: ge ({ge}) must be <= le ({le})"
            )));
        }
        if let (Some(gt), Some(lt)) = (self.gt, self.lt)
            && gt >= lt
        {
            return Err(Error::InvalidSchema(format!(
                "{context}: gt ({gt}) must be < lt ({lt})"
            )));
        }
        if let (Some(min), Some(max)) = (self.min_length, self.max_length)
            && min > max
        {
            return Err(Error::InvalidSchema(format!(
                "{context}: min_length ({min}) must be <= max_length ({max})"
            )));
        }
        if let (Some(min), Some(max)) = (self.min_items, self.max_items)
            && min > max
        {
            return Err(Error::InvalidSchema(format!(
                "{context}: min_items ({min}) must be <= max_items ({max})"
            )));
        }
        if let (Some(places), Some(digits)) = (self.decimal_places, self.max_digits)
            && places > digits
        {
            return Err(Error::InvalidSchema(format!(
                "{context}: decimal_places ({places}) must be <= max_digits ({digits})"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_constraints_are_empty_and_valid() {
        let constraints = FieldConstraints::default();
        assert!(constraints.is_empty());
        assert!(constraints.validate("f").is_ok());
    }

    #[test]
    fn inverted_numeric_bounds_are_rejected() {
        let constraints = FieldConstraints {
            ge: Some(10.0),
            le: Some(1.0),
            ..FieldConstraints::default()
        };
        assert!(matches!(
            constraints.validate("f"),
            Err(Error::InvalidSchema(_))
        ));
    }

    #[test]
    fn exclusive_bounds_fold_into_inclusive() {
        let constraints = FieldConstraints {
            gt: Some(0.0),
            lt: Some(10.0),
            ..FieldConstraints::default()
        };
        assert_eq!(constraints.lower_bound(1.0), Some(1.0));
        assert_eq!(constraints.upper_bound(1.0), Some(9.0));
    }

    #[test]
    fn decimal_places_beyond_max_digits_is_invalid() {
        let constraints = FieldConstraints {
            max_digits: Some(4),
            decimal_places: Some(6),
            ..FieldConstraints::default()
        };
        assert!(constraints.validate("price").is_err());
    }
}
