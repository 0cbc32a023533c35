//! Delivery address normalization
//!
//! Addresses are stored as opaque JSON and have changed shape several
//! times while old rows stayed untouched:
//!
//! | Shape | Example |
//! |-------|---------|
//! | legacy, capitalized | `[{"Logradouro": "Rua X", "Número": "10", "Bairro": "Centro"}]` |
//! | legacy, lowercase | `{"logradouro": "Rua X", "numero": "10", "bairro": "Centro"}` |
//! | current | `[{"endereco": "Av Y", "numero": "20", "bairro": "Centro", "cidade": "..."}]` |
//! | text | `"Rua Z, 5"` |
//!
//! [`DeliveryAddress::parse`] turns any of them into one tagged value at the
//! store boundary. Nothing in here fails: unknown shapes fall back to their
//! JSON text.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;

/// Placeholder shown when there is no address at all
pub const NOT_AVAILABLE: &str = "N/A";

/// Current address shape (array-wrapped)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CurrentAddress {
    #[serde(default, deserialize_with = "lenient_text")]
    pub endereco: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub numero: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub bairro: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cidade: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub uf: Option<String>,
    #[serde(rename = "CEP", default, deserialize_with = "lenient_text")]
    pub cep: Option<String>,
}

/// Oldest shape, capitalized Portuguese keys (array-wrapped)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CapitalizedAddress {
    #[serde(rename = "Logradouro", default, deserialize_with = "lenient_text")]
    pub logradouro: Option<String>,
    #[serde(rename = "Número", default, deserialize_with = "lenient_text")]
    pub numero: Option<String>,
    #[serde(rename = "Complemento", default, deserialize_with = "lenient_text")]
    pub complemento: Option<String>,
    #[serde(rename = "Bairro", default, deserialize_with = "lenient_text")]
    pub bairro: Option<String>,
    #[serde(rename = "Localidade", default, deserialize_with = "lenient_text")]
    pub localidade: Option<String>,
    #[serde(rename = "UF", default, deserialize_with = "lenient_text")]
    pub uf: Option<String>,
    #[serde(rename = "CEP", default, deserialize_with = "lenient_text")]
    pub cep: Option<String>,
}

/// Plain-object shape; keys are matched case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LowercaseAddress {
    #[serde(default, deserialize_with = "lenient_text")]
    pub logradouro: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub endereco: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub numero: Option<String>,
    #[serde(rename = "número", default, deserialize_with = "lenient_text")]
    pub numero_acentuado: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub complemento: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub bairro: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub localidade: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub uf: Option<String>,
}

/// Which stored shape an address was recognized as
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressShape {
    /// `null` or absent
    Missing,
    /// Already formatted text
    Text(String),
    Current(CurrentAddress),
    Capitalized(CapitalizedAddress),
    Lowercase(LowercaseAddress),
    /// Unrecognized value, kept as its JSON text
    RawJson(String),
}

/// A delivery address parsed from any historical shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAddress {
    shape: AddressShape,
    bairro: Option<String>,
}

impl DeliveryAddress {
    /// Parse a stored address value
    ///
    /// Shapes are tried in order: missing, text, array-wrapped current,
    /// array-wrapped capitalized, plain object, then raw JSON. The
    /// neighborhood is read from the raw value independently of the shape
    /// that matched for display.
    pub fn parse(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Self::missing();
        };

        match value {
            Value::Null => Self::missing(),
            Value::String(s) => Self {
                shape: AddressShape::Text(s.clone()),
                bairro: None,
            },
            Value::Array(items) => {
                let first = items.first().and_then(Value::as_object);
                Self {
                    shape: first
                        .and_then(parse_wrapped)
                        .unwrap_or_else(|| raw_json(value)),
                    bairro: first.and_then(bairro_of),
                }
            }
            Value::Object(map) => Self {
                shape: parse_object(map)
                    .unwrap_or_else(|| raw_json(value)),
                bairro: bairro_of(map),
            },
            other => Self {
                shape: raw_json(other),
                bairro: None,
            },
        }
    }

    fn missing() -> Self {
        Self {
            shape: AddressShape::Missing,
            bairro: None,
        }
    }

    pub fn shape(&self) -> &AddressShape {
        &self.shape
    }

    pub fn is_missing(&self) -> bool {
        matches!(self.shape, AddressShape::Missing)
    }

    /// One-line display text
    pub fn display(&self) -> String {
        match &self.shape {
            AddressShape::Missing => NOT_AVAILABLE.to_string(),
            AddressShape::Text(s) => s.clone(),
            AddressShape::Current(a) => join_parts([a.endereco.as_deref(), a.numero.as_deref()]),
            AddressShape::Capitalized(a) => join_parts([
                a.logradouro.as_deref(),
                a.numero.as_deref(),
                a.complemento.as_deref(),
            ]),
            AddressShape::Lowercase(a) => join_parts([
                a.logradouro.as_deref().or(a.endereco.as_deref()),
                a.numero.as_deref().or(a.numero_acentuado.as_deref()),
                a.complemento.as_deref(),
            ]),
            AddressShape::RawJson(s) => s.clone(),
        }
    }

    /// Neighborhood name, empty when none could be found
    pub fn bairro(&self) -> String {
        self.bairro.clone().unwrap_or_default()
    }
}

impl fmt::Display for DeliveryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn raw_json(value: &Value) -> AddressShape {
    tracing::debug!(address = %value, "Unrecognized address shape, showing raw JSON");
    AddressShape::RawJson(value.to_string())
}

/// Format any stored address value as one display line
pub fn format_address(value: Option<&Value>) -> String {
    DeliveryAddress::parse(value).display()
}

/// Extract the neighborhood from any stored address value (empty if absent)
pub fn bairro_from_address(value: Option<&Value>) -> String {
    DeliveryAddress::parse(value).bairro()
}

/// Neighborhood shown on receipts: the order's own column, then the one
/// inside the address, then `N/A`
pub fn resolve_bairro(order_bairro: Option<&str>, address: Option<&Value>) -> String {
    if let Some(b) = order_bairro.map(str::trim).filter(|b| !b.is_empty()) {
        return b.to_string();
    }
    let extracted = bairro_from_address(address);
    if extracted.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        extracted
    }
}

/// Address typed into a form: JSON text is stored as JSON, anything else as a string
pub fn parse_address_input(input: &str) -> Value {
    serde_json::from_str::<Value>(input).unwrap_or_else(|_| Value::String(input.to_string()))
}

fn parse_wrapped(first: &Map<String, Value>) -> Option<AddressShape> {
    let object = Value::Object(first.clone());
    if first.contains_key("endereco") && first.contains_key("numero") {
        return serde_json::from_value(object).ok().map(AddressShape::Current);
    }
    if first.contains_key("Logradouro") && first.contains_key("Número") {
        return serde_json::from_value(object)
            .ok()
            .map(AddressShape::Capitalized);
    }
    None
}

fn parse_object(map: &Map<String, Value>) -> Option<AddressShape> {
    let mut lowered = Map::new();
    for (key, value) in map {
        lowered
            .entry(key.to_lowercase())
            .or_insert_with(|| value.clone());
    }
    let recognized = ["logradouro", "endereco", "numero", "número"]
        .iter()
        .any(|k| lowered.contains_key(*k));
    if !recognized {
        return None;
    }
    serde_json::from_value(Value::Object(lowered))
        .ok()
        .map(AddressShape::Lowercase)
}

fn bairro_of(map: &Map<String, Value>) -> Option<String> {
    map.get("bairro")
        .and_then(text_of)
        .or_else(|| map.get("Bairro").and_then(text_of))
}

fn join_parts<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> String {
    parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Text of a JSON scalar; empty strings, zero, `false` and `null` count as absent
fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null | Value::Bool(false) => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) if n.as_f64() == Some(0.0) => return None,
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text_of))
}
