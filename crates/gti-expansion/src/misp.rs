//! MISP Event Model
//!
//! Just enough of the MISP object/attribute model to describe enrichment
//! results: named objects holding typed attributes, linked by references.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// Object holding the assessment of one observable
pub const REPORT_OBJECT_NAME: &str = "Google-Threat-Intel-report";
/// Relationship from an observable object to its report
pub const ANALYZED_WITH: &str = "analyzed-with";

/// Attribute of a MISP object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectAttribute {
    pub uuid: Uuid,
    pub object_relation: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
    pub value: String,
}

/// Directed, labelled edge between two objects of one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectReference {
    pub uuid: Uuid,
    pub object_uuid: Uuid,
    pub referenced_uuid: Uuid,
    pub relationship_type: String,
}

/// Standalone event attribute
///
/// Enrichment only produces objects; this keeps the `Attribute` side of the
/// results shape available to callers assembling their own events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MispAttribute {
    pub uuid: Uuid,
    #[serde(rename = "type")]
    pub attribute_type: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MispObject {
    pub name: String,
    #[serde(rename = "meta-category")]
    pub meta_category: String,
    pub uuid: Uuid,
    #[serde(rename = "Attribute")]
    pub attributes: Vec<ObjectAttribute>,
    #[serde(
        rename = "ObjectReference",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub references: Vec<ObjectReference>,
}

impl MispObject {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            meta_category: meta_category(name).to_string(),
            uuid: Uuid::new_v4(),
            attributes: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Add an attribute to the object.
    pub fn add_attribute(&mut self, relation: &str, attribute_type: &str, value: impl Into<String>) {
        self.attributes.push(ObjectAttribute {
            uuid: Uuid::new_v4(),
            object_relation: relation.to_string(),
            attribute_type: attribute_type.to_string(),
            value: value.into(),
        });
    }

    /// Add an attribute when a value is present.
    ///
    /// MISP drops object attributes without a value; the same happens here.
    pub fn add_optional_attribute(&mut self, relation: &str, attribute_type: &str, value: Option<String>) {
        match value {
            Some(value) => self.add_attribute(relation, attribute_type, value),
            None => warn!(object = %self.name, relation, "no value for attribute, skipping"),
        }
    }

    /// Link this object to another object of the same event.
    pub fn add_reference(&mut self, referenced_uuid: Uuid, relationship_type: &str) {
        self.references.push(ObjectReference {
            uuid: Uuid::new_v4(),
            object_uuid: self.uuid,
            referenced_uuid,
            relationship_type: relationship_type.to_string(),
        });
    }

    /// Value of the first attribute with the given relation
    pub fn get_value(&self, relation: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.object_relation == relation)
            .map(|a| a.value.as_str())
    }
}

fn meta_category(name: &str) -> &'static str {
    match name {
        "domain-ip" | "url" => "network",
        "file" => "file",
        _ => "misc",
    }
}

/// Accumulator for one enrichment call
#[derive(Debug, Clone, Default)]
pub struct MispEvent {
    pub attributes: Vec<MispAttribute>,
    pub objects: Vec<MispObject>,
}

impl MispEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&mut self, object: MispObject) -> Uuid {
        let uuid = object.uuid;
        self.objects.push(object);
        uuid
    }

    pub fn get_object(&self, uuid: Uuid) -> Option<&MispObject> {
        self.objects.iter().find(|o| o.uuid == uuid)
    }

    /// Serialize the non-empty `Attribute` and `Object` collections.
    pub fn to_results(&self) -> serde_json::Map<String, Value> {
        let mut results = serde_json::Map::new();

        if !self.attributes.is_empty() {
            results.insert("Attribute".into(), to_json_array(&self.attributes));
        }
        if !self.objects.is_empty() {
            results.insert("Object".into(), to_json_array(&self.objects));
        }

        results
    }
}

fn to_json_array<T: Serialize>(items: &[T]) -> Value {
    Value::Array(
        items
            .iter()
            .filter_map(|item| serde_json::to_value(item).ok())
            .collect(),
    )
}
