use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Generated value for a field or a whole instance.
///
/// `Record` keeps fields in declaration order so serialized output is
/// byte-stable across runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Decimal already quantized to its declared places.
    Decimal(String),
    Text(String),
    Uuid(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    List(Vec<Value>),
    Record(Vec<(String, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) | Value::Uuid(value) | Value::Decimal(value) => {
                Some(value.as_str())
            }
            _ => None,
        }
    }

    /// Field accessor for `Record` values.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Replace a field of a `Record` in place, keeping its position.
    pub fn set_field(&mut self, name: &str, value: Value) {
        if let Value::Record(fields) = self {
            if let Some(entry) = fields.iter_mut().find(|(field, _)| field == name) {
                entry.1 = value;
            } else {
                fields.push((name.to_string(), value));
            }
        }
    }

    /// Render to JSON with record field order preserved through
    /// string serialization.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(value) => serde_json::Value::Bool(*value),
            Value::Int(value) => serde_json::Value::from(*value),
            Value::Float(value) => serde_json::Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Decimal(value) | Value::Text(value) | Value::Uuid(value) => {
                serde_json::Value::String(value.clone())
            }
            Value::Date(value) => serde_json::Value::String(value.format("%Y-%m-%d").to_string()),
            Value::Time(value) => serde_json::Value::String(value.format("%H:%M:%S").to_string()),
            Value::DateTime(value) => {
                serde_json::Value::String(value.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Record(fields) => {
                let mut map = serde_json::Map::new();
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }

    /// Canonical string rendering used for uniqueness checks and
    /// deterministic comparisons.
    pub fn canonical_key(&self) -> String {
        match self {
            Value::Null => "<null>".to_string(),
            Value::Bool(value) => value.to_string(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) => format!("{value:?}"),
            Value::Decimal(value) | Value::Text(value) | Value::Uuid(value) => value.clone(),
            Value::Date(value) => value.format("%Y-%m-%d").to_string(),
            Value::Time(value) => value.format("%H:%M:%S").to_string(),
            Value::DateTime(value) => value.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::canonical_key).collect();
                format!("[{}]", parts.join("|"))
            }
            Value::Record(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(name, value)| format!("{name}={}", value.canonical_key()))
                    .collect();
                format!("{{{}}}", parts.join("|"))
            }
        }
    }

    /// Lift a JSON value (defaults, literals, fixed overrides) into
    /// the engine's value model.
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Value::Int(int)
                } else {
                    Value::Float(number.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(text) => Value::Text(text.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Record(
                map.iter()
                    .map(|(name, value)| (name.clone(), Value::from_json(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_preserves_field_order_in_json() {
        let record = Value::Record(vec![
            ("z".to_string(), Value::Int(1)),
            ("a".to_string(), Value::Int(2)),
        ]);
        let json = record.to_json();
        let rendered = serde_json::to_string(&json).expect("serialize");
        // serde_json orders object keys; canonical_key keeps ours.
        assert!(rendered.contains("\"z\":1"));
        assert_eq!(record.canonical_key(), "{z=1|a=2}");
    }

    #[test]
    fn field_lookup_and_replacement() {
        let mut record = Value::Record(vec![("id".to_string(), Value::Int(1))]);
        assert_eq!(record.field("id"), Some(&Value::Int(1)));
        record.set_field("id", Value::Int(9));
        assert_eq!(record.field("id"), Some(&Value::Int(9)));
        assert_eq!(record.field("missing"), None);
    }

    #[test]
    fn json_round_trip_for_scalars() {
        assert_eq!(Value::from_json(&serde_json::json!(3)), Value::Int(3));
        assert_eq!(
            Value::from_json(&serde_json::json!("x")),
            Value::Text("x".to_string())
        );
        assert_eq!(Value::from_json(&serde_json::Value::Null), Value::Null);
    }
}
