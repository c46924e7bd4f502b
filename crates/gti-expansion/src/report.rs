//! API Reports
//!
//! A report is the `data` member of a v3 object response. It is kept as an
//! untyped JSON tree; fields are pulled out by dotted path.

use crate::error::{ExpansionError, Result};
use serde_json::Value;

/// Base of the web UI links built for each report
pub const GUI_BASE_URL: &str = "https://www.virustotal.com/gui";

/// Path of the assessed threat score
pub const THREAT_SCORE_PATH: &str = "attributes.gti_assessment.threat_score.value";
/// Path of the assessed verdict (`VERDICT_*`)
pub const VERDICT_PATH: &str = "attributes.gti_assessment.verdict.value";
/// Path of the assessed severity (`SEVERITY_*`)
pub const SEVERITY_PATH: &str = "attributes.gti_assessment.severity.value";
/// Path of the suggested threat label
pub const THREAT_LABEL_PATH: &str = "attributes.popular_threat_classification.suggested_threat_label";

/// One API object (file, domain, ip_address, url)
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    data: Value,
}

impl Report {
    /// Wrap an object tree shaped like `{id, type, attributes}`.
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// Extract the report from a full response body (`{"data": {...}}`).
    pub fn from_response(mut body: Value) -> Result<Self> {
        match body.get_mut("data").map(Value::take) {
            Some(data @ Value::Object(_)) => Ok(Self::new(data)),
            _ => Err(ExpansionError::api(
                "InvalidResponse",
                "The API response does not contain a data object.",
            )),
        }
    }

    pub fn id(&self) -> String {
        self.get("id")
    }

    /// Object type as named by the API (`file`, `ip_address`, ...)
    pub fn object_type(&self) -> String {
        self.get("type")
    }

    /// Value of a top-level attribute, if the report carries a non-null one
    pub fn attribute(&self, name: &str) -> Option<String> {
        lookup(&self.data, &format!("attributes.{}", name))
            .filter(|v| !v.is_null())
            .map(render)
    }

    /// Dotted-path lookup with an empty-string default
    pub fn get(&self, path: &str) -> String {
        get_key(&self.data, path)
    }

    pub fn permalink(&self) -> String {
        format!("{}/{}/{}", GUI_BASE_URL, self.object_type(), self.id())
    }

    pub fn threat_score(&self) -> String {
        self.get(THREAT_SCORE_PATH)
    }

    pub fn verdict(&self) -> String {
        strip_prefix_once(&self.get(VERDICT_PATH), "VERDICT_")
    }

    pub fn severity(&self) -> String {
        strip_prefix_once(&self.get(SEVERITY_PATH), "SEVERITY_")
    }

    pub fn threat_label(&self) -> String {
        self.get(THREAT_LABEL_PATH)
    }
}

/// Walk a dotted path through nested maps.
///
/// Stops with `None` as soon as a segment is missing or the current node is
/// not a map.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |node, key| node.as_object()?.get(key))
}

/// Dotted-path lookup rendered as text, `""` when absent or null.
pub fn get_key(root: &Value, path: &str) -> String {
    lookup(root, path).map(render).unwrap_or_default()
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn strip_prefix_once(value: &str, prefix: &str) -> String {
    value.strip_prefix(prefix).unwrap_or(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample_report() -> Report {
        Report::new(json!({
            "id": "ed01ebfbc9eb5bbea545af4d01bf5f1071661840480439c6e5babe8e080e41aa",
            "type": "file",
            "attributes": {
                "md5": "44d88612fea8a8f36de82e1278abb02f",
                "gti_assessment": {
                    "threat_score": {"value": 85},
                    "verdict": {"value": "VERDICT_MALICIOUS"},
                    "severity": {"value": "SEVERITY_HIGH"}
                },
                "popular_threat_classification": {
                    "suggested_threat_label": "trojan.wannacry/wanna"
                }
            }
        }))
    }

    #[test]
    fn test_get_key_leaf_and_missing() {
        let tree = json!({"a": {"b": {"c": "X"}}});
        assert_eq!(get_key(&tree, "a.b.c"), "X");

        let tree = json!({"a": {}});
        assert_eq!(get_key(&tree, "a.b.c"), "");
        assert_eq!(get_key(&json!({}), "a.b.c"), "");
    }

    #[test]
    fn test_get_key_through_non_map() {
        let tree = json!({"a": "scalar", "b": [1, 2], "c": null});
        assert_eq!(get_key(&tree, "a.b"), "");
        assert_eq!(get_key(&tree, "b.0"), "");
        assert_eq!(get_key(&tree, "c"), "");
    }

    #[test]
    fn test_get_key_renders_non_strings() {
        let tree = json!({"n": 85, "f": true, "l": ["x"]});
        assert_eq!(get_key(&tree, "n"), "85");
        assert_eq!(get_key(&tree, "f"), "true");
        assert_eq!(get_key(&tree, "l"), r#"["x"]"#);
    }

    #[test]
    fn test_report_fields() {
        let report = sample_report();
        assert_eq!(report.object_type(), "file");
        assert_eq!(report.threat_score(), "85");
        assert_eq!(report.verdict(), "MALICIOUS");
        assert_eq!(report.severity(), "HIGH");
        assert_eq!(report.threat_label(), "trojan.wannacry/wanna");
        assert_eq!(
            report.permalink(),
            "https://www.virustotal.com/gui/file/ed01ebfbc9eb5bbea545af4d01bf5f1071661840480439c6e5babe8e080e41aa"
        );
        assert_eq!(
            report.attribute("md5").as_deref(),
            Some("44d88612fea8a8f36de82e1278abb02f")
        );
        assert_eq!(report.attribute("sha1"), None);
    }

    #[test]
    fn test_report_without_assessment() {
        let report = Report::new(json!({"id": "1.2.3.4", "type": "ip_address", "attributes": {}}));
        assert_eq!(report.threat_score(), "");
        assert_eq!(report.verdict(), "");
        assert_eq!(report.severity(), "");
        assert_eq!(report.threat_label(), "");
    }

    #[test]
    fn test_from_response() {
        let report = Report::from_response(json!({"data": {"id": "x", "type": "domain"}})).unwrap();
        assert_eq!(report.id(), "x");

        let err = Report::from_response(json!({"error": {}})).unwrap_err();
        assert!(matches!(err, ExpansionError::Api { .. }));
    }

    #[test]
    fn test_prefix_only_stripped_at_start() {
        assert_eq!(strip_prefix_once("VERDICT_VERDICT_X", "VERDICT_"), "VERDICT_X");
        assert_eq!(strip_prefix_once("NOT_VERDICT_X", "VERDICT_"), "NOT_VERDICT_X");
        assert_eq!(strip_prefix_once("SEVERITY_LOW", "VERDICT_"), "SEVERITY_LOW");
    }

    proptest! {
        #[test]
        fn prop_prefix_strip_restores_suffix(suffix in "[A-Z_]{0,16}") {
            let prefixed = format!("SEVERITY_{}", suffix);
            prop_assert_eq!(strip_prefix_once(&prefixed, "SEVERITY_"), suffix.clone());
            if !suffix.starts_with("SEVERITY_") {
                prop_assert_eq!(strip_prefix_once(&suffix, "SEVERITY_"), suffix);
            }
        }
    }
}
