//! API (JSON) representation of artifact declarations.

use log::warn;
use serde_json::{json, Map, Value};

use super::{ArtifactConfig, ArtifactStores, ArtifactType, BuiltinArtifact, PluggableArtifact};
use crate::configuration::{ConfigurationProperty, PropertyValue};
use crate::error::{LineageError, Result};
use crate::validation::FieldErrors;

/// Collaborators needed to read pluggable artifacts.
pub struct ConfigHelperOptions<'a> {
    pub artifact_stores: &'a ArtifactStores,
}

impl<'a> ConfigHelperOptions<'a> {
    pub fn new(artifact_stores: &'a ArtifactStores) -> Self {
        Self { artifact_stores }
    }
}

const ERROR_FIELD_MAPPING: [(&str, &str); 4] = [
    ("src", "source"),
    ("dest", "destination"),
    ("id", "artifact_id"),
    ("storeId", "store_id"),
];

pub fn to_json(artifact: &ArtifactConfig, errors: &FieldErrors) -> Value {
    let mut object = Map::new();

    if !errors.is_empty() {
        let mut error_object = Map::new();
        for (field, field_errors) in errors.iter() {
            let name = ERROR_FIELD_MAPPING
                .iter()
                .find(|(internal, _)| *internal == field)
                .map_or(field, |(_, external)| *external);
            let messages: Vec<Value> = field_errors
                .iter()
                .map(|error| Value::String(error.to_string()))
                .collect();
            error_object.insert(name.to_string(), Value::Array(messages));
        }
        object.insert("errors".to_string(), Value::Object(error_object));
    }

    object.insert(
        "type".to_string(),
        Value::String(artifact.artifact_type().as_str().to_string()),
    );

    match artifact {
        ArtifactConfig::Build(builtin) | ArtifactConfig::Test(builtin) => {
            object.insert("source".to_string(), json!(builtin.source));
            object.insert("destination".to_string(), json!(builtin.destination));
        }
        ArtifactConfig::Pluggable(pluggable) => {
            object.insert("artifact_id".to_string(), json!(pluggable.id));
            object.insert("store_id".to_string(), json!(pluggable.store_id));
            let configuration: Vec<Value> =
                pluggable.configuration.iter().map(property_to_json).collect();
            object.insert("configuration".to_string(), Value::Array(configuration));
        }
    }

    Value::Object(object)
}

/// Reads an artifact declaration sent by an API client.
///
/// # Errors
///
/// Returns `LineageError::UnprocessableEntity` when the payload is not an
/// object, carries no `type`, or names a type other than `build`, `test` or
/// `external`. Field-level problems are left to validation.
pub fn from_json(value: &Value, options: &ConfigHelperOptions<'_>) -> Result<ArtifactConfig> {
    let object = value.as_object().ok_or_else(|| {
        LineageError::UnprocessableEntity(format!("Expected an artifact object, got: {value}"))
    })?;

    let kind = required_string(object, "type")?;
    let artifact = match kind {
        "build" => ArtifactConfig::Build(builtin_from_json(object)?),
        "test" => ArtifactConfig::Test(builtin_from_json(object)?),
        "external" => ArtifactConfig::Pluggable(pluggable_from_json(object, options)?),
        other => {
            let allowed = ArtifactType::ALL
                .iter()
                .map(|artifact_type| artifact_type.as_str())
                .collect::<Vec<_>>()
                .join(",");
            return Err(LineageError::UnprocessableEntity(format!(
                "Invalid Artifact type: '{other}'. It has to be one of {allowed}."
            )));
        }
    };

    Ok(artifact)
}

fn builtin_from_json(object: &Map<String, Value>) -> Result<BuiltinArtifact> {
    Ok(BuiltinArtifact {
        source: optional_string(object, "source")?.unwrap_or_default(),
        destination: optional_string(object, "destination")?,
    })
}

fn pluggable_from_json(
    object: &Map<String, Value>,
    options: &ConfigHelperOptions<'_>,
) -> Result<PluggableArtifact> {
    let id = optional_string(object, "artifact_id")?.unwrap_or_default();
    let store_id = optional_string(object, "store_id")?.unwrap_or_default();

    if !store_id.is_empty() && options.artifact_stores.find(&store_id).is_none() {
        warn!("Artifact '{id}' refers to unknown artifact store '{store_id}'");
    }

    let configuration = match object.get("configuration") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(property_from_json)
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(LineageError::UnprocessableEntity(format!(
                "Property 'configuration' must be an array, got: {other}"
            )))
        }
    };

    Ok(PluggableArtifact {
        id,
        store_id,
        configuration,
    })
}

fn property_to_json(property: &ConfigurationProperty) -> Value {
    match &property.value {
        PropertyValue::Plain(value) => json!({ "key": property.key, "value": value }),
        PropertyValue::Encrypted(cipher_text) => {
            json!({ "key": property.key, "encrypted_value": cipher_text })
        }
    }
}

fn property_from_json(value: &Value) -> Result<ConfigurationProperty> {
    let object = value.as_object().ok_or_else(|| {
        LineageError::UnprocessableEntity(format!(
            "Expected a configuration property object, got: {value}"
        ))
    })?;

    let key = required_string(object, "key")?;
    match optional_string(object, "encrypted_value")? {
        Some(cipher_text) => Ok(ConfigurationProperty::encrypted(key, cipher_text)),
        None => Ok(ConfigurationProperty::plain(
            key,
            optional_string(object, "value")?.unwrap_or_default(),
        )),
    }
}

fn required_string<'v>(object: &'v Map<String, Value>, property: &str) -> Result<&'v str> {
    match object.get(property) {
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(LineageError::UnprocessableEntity(format!(
            "Property '{property}' must be a string, got: {other}"
        ))),
        None => Err(LineageError::UnprocessableEntity(format!(
            "Json does not contain property '{property}'"
        ))),
    }
}

fn optional_string(object: &Map<String, Value>, property: &str) -> Result<Option<String>> {
    match object.get(property) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(LineageError::UnprocessableEntity(format!(
            "Property '{property}' must be a string, got: {other}"
        ))),
    }
}
