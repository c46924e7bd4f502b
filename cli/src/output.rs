//! Output formatting

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn print<T: Serialize>(&self, data: &T) {
        match self {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Yaml => {
                println!("{}", serde_yaml::to_string(data).unwrap_or_default());
            }
            OutputFormat::Table => {
                let value = serde_json::to_value(data).unwrap_or_default();
                let rows = attribute_rows(&value);
                if rows.is_empty() {
                    // Not a module response; nothing tabular to show
                    println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
                } else {
                    println!("{}", Table::new(rows));
                }
            }
        }
    }
}

/// One row per object attribute of a module response
#[derive(Debug, Tabled, PartialEq)]
pub struct AttributeRow {
    #[tabled(rename = "Object")]
    pub object: String,
    #[tabled(rename = "Relation")]
    pub relation: String,
    #[tabled(rename = "Type")]
    pub attribute_type: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub fn attribute_rows(response: &Value) -> Vec<AttributeRow> {
    let objects = response
        .pointer("/results/Object")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    objects
        .iter()
        .flat_map(|object| {
            let name = object["name"].as_str().unwrap_or_default().to_string();
            object["Attribute"]
                .as_array()
                .into_iter()
                .flatten()
                .map(move |attribute| AttributeRow {
                    object: name.clone(),
                    relation: text(&attribute["object_relation"]),
                    attribute_type: text(&attribute["type"]),
                    value: text(&attribute["value"]),
                })
        })
        .collect()
}

fn text(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_from_response() {
        let response = json!({"results": {"Object": [
            {"name": "Google-Threat-Intel-report", "Attribute": [
                {"object_relation": "Verdict", "type": "text", "value": "MALICIOUS"}
            ]},
            {"name": "domain-ip", "Attribute": [
                {"object_relation": "domain", "type": "domain", "value": "qexyhuv.com"}
            ]}
        ]}});

        let rows = attribute_rows(&response);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].object, "Google-Threat-Intel-report");
        assert_eq!(rows[0].value, "MALICIOUS");
        assert_eq!(rows[1].relation, "domain");
    }

    #[test]
    fn test_error_response_has_no_rows() {
        assert!(attribute_rows(&json!({"error": "Unsupported attribute type."})).is_empty());
    }
}
