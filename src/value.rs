//! Dynamically typed patch attribute values.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// A patch attribute value. Numeric values carry arbitrary-precision
/// decimals (see [`crate::geometry`] for why); an optional unit string
/// travels with any variant so seeded raster/tabular values keep their
/// source units (e.g. the `units` field of a precomputed grid header).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub data: ValueData,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueData {
    Number(BigDecimal),
    Integer(i64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn number(n: BigDecimal) -> Self {
        Self {
            data: ValueData::Number(n),
            unit: None,
        }
    }

    pub fn integer(n: i64) -> Self {
        Self {
            data: ValueData::Integer(n),
            unit: None,
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self {
            data: ValueData::Text(s.into()),
            unit: None,
        }
    }

    pub fn boolean(b: bool) -> Self {
        Self {
            data: ValueData::Boolean(b),
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Best-effort conversion to `f64`, used only where the spec allows
    /// double precision (circle-offset math never touches `Value`s, but
    /// external-reader callers sometimes want a float for logging/display).
    pub fn as_f64(&self) -> Option<f64> {
        use num_traits::ToPrimitive;
        match &self.data {
            ValueData::Number(n) => n.to_f64(),
            ValueData::Integer(n) => Some(*n as f64),
            ValueData::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            ValueData::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn number_with_unit_round_trips_as_f64() {
        let v = Value::number(BigDecimal::from_str("12.5").unwrap()).with_unit("meters");
        assert_eq!(v.unit.as_deref(), Some("meters"));
        assert_eq!(v.as_f64(), Some(12.5));
    }

    #[test]
    fn text_has_no_float_representation() {
        let v = Value::text("forest");
        assert_eq!(v.as_f64(), None);
    }
}
