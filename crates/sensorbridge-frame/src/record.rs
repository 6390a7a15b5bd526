use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DecodeError, Result};

/// Value used for a missing or unusable field in lenient mode.
pub const FIELD_DEFAULT: f64 = 0.0;

/// One sensor reading.
///
/// Values are passed through as the device reports them: no units, no range
/// checks. Serializes as `{"temperature": <number>, "humidity": <number>}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub temperature: f64,
    pub humidity: f64,
}

impl SensorRecord {
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature,
            humidity,
        }
    }
}

/// How to treat missing or non-numeric fields in a record-shaped line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Substitute [`FIELD_DEFAULT`] for a missing, `null` or non-numeric
    /// field. Numeric strings such as `"21.5"` are accepted.
    #[default]
    Lenient,
    /// Reject the line unless both fields are JSON numbers.
    Strict,
}

/// Decode one trimmed candidate line.
///
/// - `Ok(None)`: the line is not record-shaped (does not start with `{` and
///   end with `}`), e.g. a boot banner. Not an error.
/// - `Ok(Some(record))`: decoded.
/// - `Err(_)`: record-shaped but unusable.
///
/// Fields other than `temperature` and `humidity` are ignored.
pub fn decode_line(line: &str, mode: DecodeMode) -> Result<Option<SensorRecord>> {
    if !is_record_shaped(line) {
        return Ok(None);
    }

    let fields: Map<String, Value> = serde_json::from_str(line)?;

    Ok(Some(SensorRecord {
        temperature: numeric_field(&fields, "temperature", mode)?,
        humidity: numeric_field(&fields, "humidity", mode)?,
    }))
}

fn is_record_shaped(line: &str) -> bool {
    line.starts_with('{') && line.ends_with('}')
}

fn numeric_field(fields: &Map<String, Value>, name: &'static str, mode: DecodeMode) -> Result<f64> {
    let value = match fields.get(name) {
        None | Some(Value::Null) => {
            return match mode {
                DecodeMode::Lenient => Ok(FIELD_DEFAULT),
                DecodeMode::Strict => Err(DecodeError::MissingField(name)),
            };
        }
        Some(value) => value,
    };

    let parsed = match (value, mode) {
        (Value::Number(n), _) => n.as_f64(),
        (Value::String(s), DecodeMode::Lenient) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match (parsed.filter(|v| v.is_finite()), mode) {
        (Some(v), _) => Ok(v),
        (None, DecodeMode::Lenient) => {
            tracing::debug!(field = name, %value, "non-numeric field, using default");
            Ok(FIELD_DEFAULT)
        }
        (None, DecodeMode::Strict) => Err(DecodeError::InvalidField {
            field: name,
            value: value.to_string(),
        }),
    }
}
