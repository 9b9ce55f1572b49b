use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A key/value setting handed to an artifact plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProperty", into = "RawProperty")]
pub struct ConfigurationProperty {
    pub key: String,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// As entered by the user.
    Plain(String),
    /// Cipher text produced by the encryption provider.
    Encrypted(String),
}

impl ConfigurationProperty {
    pub fn plain(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: PropertyValue::Plain(value.into()),
        }
    }

    pub fn encrypted(key: impl Into<String>, cipher_text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: PropertyValue::Encrypted(cipher_text.into()),
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self.value, PropertyValue::Encrypted(_))
    }
}

/// Positions of every property whose key occurs more than once.
///
/// Keys compare case-sensitively. All occurrences are reported, not only
/// the repeats.
pub fn duplicate_keys(properties: &[ConfigurationProperty]) -> Vec<(usize, &str)> {
    let mut positions: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (index, property) in properties.iter().enumerate() {
        positions.entry(property.key.as_str()).or_default().push(index);
    }

    let mut duplicates: Vec<(usize, &str)> = positions
        .into_iter()
        .filter(|(_, indices)| indices.len() > 1)
        .flat_map(|(key, indices)| indices.into_iter().map(move |index| (index, key)))
        .collect();
    duplicates.sort_by_key(|(index, _)| *index);
    duplicates
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawProperty {
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encrypted_value: Option<String>,
}

impl TryFrom<RawProperty> for ConfigurationProperty {
    type Error = String;

    fn try_from(raw: RawProperty) -> Result<Self, Self::Error> {
        let value = match (raw.value, raw.encrypted_value) {
            (Some(_), Some(_)) => {
                return Err(format!(
                    "Configuration property '{}' cannot have both a value and an encrypted value",
                    raw.key
                ))
            }
            (None, Some(cipher_text)) => PropertyValue::Encrypted(cipher_text),
            (value, None) => PropertyValue::Plain(value.unwrap_or_default()),
        };
        Ok(Self {
            key: raw.key,
            value,
        })
    }
}

impl From<ConfigurationProperty> for RawProperty {
    fn from(property: ConfigurationProperty) -> Self {
        let (value, encrypted_value) = match property.value {
            PropertyValue::Plain(value) => (Some(value), None),
            PropertyValue::Encrypted(cipher_text) => (None, Some(cipher_text)),
        };
        Self {
            key: property.key,
            value,
            encrypted_value,
        }
    }
}
