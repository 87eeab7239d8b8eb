//! Machine request and record types.
use crate::validate::{check_positive, parse_positive};
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};

/// Largest float below which every integer is exactly representable.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Raw operator answers for one machine, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineRequest {
    pub name: String,
    pub os: String,
    pub cpu: String,
    pub ram: String,
}

/// Canonical record of an accepted machine.
///
/// Only ever built from validated input; the store never holds a partial
/// record. `cpu` and `ram` serialize as JSON numbers, integral values
/// without a fractional part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSpec {
    pub name: String,
    pub os: String,
    #[serde(serialize_with = "serialize_quantity", deserialize_with = "deserialize_quantity")]
    pub cpu: f64,
    /// Gigabytes by convention.
    #[serde(serialize_with = "serialize_quantity", deserialize_with = "deserialize_quantity")]
    pub ram: f64,
}

/// Build the canonical record from values that already passed validation.
///
/// Trims the name and lowercases the OS; nothing is re-checked here.
pub fn build_record(name: &str, os: &str, cpu: f64, ram: f64) -> MachineSpec {
    let machine = MachineSpec {
        name: name.trim().to_string(),
        os: os.trim().to_lowercase(),
        cpu,
        ram,
    };
    tracing::info!(
        name = %machine.name,
        os = %machine.os,
        cpu = machine.cpu,
        ram = machine.ram,
        "machine created"
    );
    machine
}

fn serialize_quantity<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return Err(ser::Error::custom(format!("quantity {value} is not finite")));
    }
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Records written by older tooling stored quantities as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredQuantity {
    Number(f64),
    Text(String),
}

/// Stored quantities obey the same rules as operator input.
fn deserialize_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let (raw, checked) = match StoredQuantity::deserialize(deserializer)? {
        StoredQuantity::Number(value) => (value.to_string(), check_positive(value)),
        StoredQuantity::Text(text) => {
            let checked = parse_positive(&text);
            (text, checked)
        }
    };
    checked.map_err(|reason| de::Error::custom(format!("invalid quantity {raw:?}: {reason}")))
}
