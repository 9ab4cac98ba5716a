//! Conversion rules from loosely typed caller values to declared parameter kinds.
//!
//! A converter is picked once per parameter when a prompt is registered and
//! stored in its [`crate::ParameterSpec`]; binding only ever calls the stored
//! function.

use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

/// Converts a supplied value into the canonical JSON form of a parameter kind.
///
/// On failure the returned string explains why the value was rejected.
pub type Converter = fn(&Value) -> Result<Value, String>;

/// Declared kind of a prompt parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// UTF-8 text.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit floating point number.
    Float,
    /// `true` or `false`.
    Boolean,
    /// Any JSON document, or a serde-deserializable structure.
    Structured,
    /// The ambient cancellation token; never supplied by callers.
    Cancellation,
}

impl ValueKind {
    /// Scalar kinds always require a value unless wrapped in `Option`.
    pub fn is_value_shaped(self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Float | ValueKind::Boolean)
    }

    /// Short type label used in conversion errors.
    pub fn label(self) -> &'static str {
        match self {
            ValueKind::Text => "string",
            ValueKind::Integer => "integer",
            ValueKind::Float => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Structured => "object",
            ValueKind::Cancellation => "cancellation token",
        }
    }

    /// Converter for scalar kinds. Structured parameters carry their own
    /// converter (see [`structured_converter`]).
    pub fn converter(self) -> Converter {
        match self {
            ValueKind::Text => convert_text,
            ValueKind::Integer => convert_integer,
            ValueKind::Float => convert_float,
            ValueKind::Boolean => convert_boolean,
            ValueKind::Structured | ValueKind::Cancellation => convert_any,
        }
    }
}

/// Build a converter that checks values against a deserializable type.
pub fn structured_converter<T: DeserializeOwned>() -> Converter {
    convert_structured::<T>
}

fn convert_text(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(_) => Ok(value.clone()),
        other => structural::<String>(other),
    }
}

fn convert_integer(value: &Value) -> Result<Value, String> {
    match value {
        Value::Number(number) if number.is_i64() || number.is_u64() => structural::<i64>(value),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|error| format!("'{text}' is not a valid integer: {error}")),
        other => structural::<i64>(other),
    }
}

fn convert_float(value: &Value) -> Result<Value, String> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::String(text) => {
            let parsed = text
                .trim()
                .parse::<f64>()
                .map_err(|error| format!("'{text}' is not a valid number: {error}"))?;
            Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| format!("'{text}' is not a finite number"))
        }
        other => structural::<f64>(other),
    }
}

fn convert_boolean(value: &Value) -> Result<Value, String> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(format!("'{text}' is not a valid boolean")),
        },
        other => structural::<bool>(other),
    }
}

fn convert_any(value: &Value) -> Result<Value, String> {
    Ok(value.clone())
}

fn convert_structured<T: DeserializeOwned>(value: &Value) -> Result<Value, String> {
    match structural::<T>(value) {
        Ok(converted) => Ok(converted),
        // Text transports deliver structured arguments as serialized JSON.
        Err(error) => match value {
            Value::String(text) => {
                let decoded: Value = serde_json::from_str(text).map_err(|_| error.clone())?;
                structural::<T>(&decoded).map(|_| decoded)
            }
            _ => Err(error),
        },
    }
}

fn structural<T: DeserializeOwned>(value: &Value) -> Result<Value, String> {
    serde_json::from_value::<T>(value.clone())
        .map(|_| value.clone())
        .map_err(|error| error.to_string())
}
