// ── Property keys and values ──
//
// Keys are the device's wire names. Values are a closed tagged union;
// conversion from JSON goes through one exhaustive match on the declared
// kind, never through ad hoc runtime checks.

use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Every property the engine knows about, named by its wire key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, EnumIter, Serialize,
)]
pub enum PropertyKey {
    #[strum(serialize = "devt")]
    #[serde(rename = "devt")]
    DeviceTime,
    #[strum(serialize = "nbrd")]
    #[serde(rename = "nbrd")]
    NumberOfBoards,
    #[strum(serialize = "en")]
    #[serde(rename = "en")]
    OperationEnable,
    #[strum(serialize = "sbits")]
    #[serde(rename = "sbits")]
    StationStatusBits,
    #[strum(serialize = "ps")]
    #[serde(rename = "ps")]
    ProgramStatusData,
    #[strum(serialize = "fwv")]
    #[serde(rename = "fwv")]
    FirmwareVersion,
    #[strum(serialize = "rd")]
    #[serde(rename = "rd")]
    RainDelay,
    #[strum(serialize = "snames")]
    #[serde(rename = "snames")]
    StationNames,
    #[strum(serialize = "stn_dis")]
    #[serde(rename = "stn_dis")]
    StationDisabled,
}

impl PropertyKey {
    /// The key as it appears in device JSON and write parameters.
    pub fn wire_name(self) -> &'static str {
        self.into()
    }
}

/// The declared shape of a property's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    Number,
    NumberArray,
    NumberMatrix,
    StringArray,
}

/// A property value tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(i64),
    NumberArray(Vec<i64>),
    NumberMatrix(Vec<Vec<i64>>),
    StringArray(Vec<String>),
}

impl PropertyValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::NumberArray(_) => ValueKind::NumberArray,
            Self::NumberMatrix(_) => ValueKind::NumberMatrix,
            Self::StringArray(_) => ValueKind::StringArray,
        }
    }

    /// Convert a JSON sample into a value of the declared kind.
    ///
    /// Returns `None` when the JSON shape disagrees with `kind`; nothing is
    /// coerced (a numeric string is not a number, a float is not an integer).
    pub fn from_json(kind: ValueKind, json: &Value) -> Option<Self> {
        match kind {
            ValueKind::Number => json.as_i64().map(Self::Number),
            ValueKind::NumberArray => number_array(json).map(Self::NumberArray),
            ValueKind::NumberMatrix => json
                .as_array()?
                .iter()
                .map(number_array)
                .collect::<Option<Vec<_>>>()
                .map(Self::NumberMatrix),
            ValueKind::StringArray => json
                .as_array()?
                .iter()
                .map(|v| v.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
                .map(Self::StringArray),
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_number_array(&self) -> Option<&[i64]> {
        match self {
            Self::NumberArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_number_matrix(&self) -> Option<&[Vec<i64>]> {
        match self {
            Self::NumberMatrix(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string_array(&self) -> Option<&[String]> {
        match self {
            Self::StringArray(v) => Some(v),
            _ => None,
        }
    }

    /// Render the value as a write parameter. Arrays are comma-joined.
    pub fn to_param(&self) -> String {
        fn join<T: ToString>(items: &[T]) -> String {
            items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        }

        match self {
            Self::Number(n) => n.to_string(),
            Self::NumberArray(v) => join(v),
            Self::NumberMatrix(rows) => rows.iter().map(|r| join(r)).collect::<Vec<_>>().join(","),
            Self::StringArray(v) => v.join(","),
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<Vec<i64>> for PropertyValue {
    fn from(v: Vec<i64>) -> Self {
        Self::NumberArray(v)
    }
}

impl From<Vec<Vec<i64>>> for PropertyValue {
    fn from(v: Vec<Vec<i64>>) -> Self {
        Self::NumberMatrix(v)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(v: Vec<String>) -> Self {
        Self::StringArray(v)
    }
}

fn number_array(json: &Value) -> Option<Vec<i64>> {
    json.as_array()?.iter().map(Value::as_i64).collect()
}

/// Human-readable JSON type name, for conversion errors.
pub(crate) fn json_type_name(json: &Value) -> &'static str {
    match json {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
