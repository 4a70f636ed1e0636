//! Project records: the central content type describing one architectural/design work.
//! Deserialized from dataset files, re-serialized verbatim into the generated index.

use serde::{Deserialize, Serialize};

/// One gallery entry. Field names follow the dataset JSON (camelCase on the wire).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytical_caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Methods>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
}

/// One of the (exactly three) images attached to a project.
/// `url` and `sourceUrl` are required by the invariant checker, not the schema,
/// so they deserialize as empty strings when absent and stay observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Methods {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub computational: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assembly_fabrication: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
}

impl Project {
    /// Sort key year: absent sorts as 0 (schema rejects non-numeric years).
    pub fn sort_year(&self) -> i64 {
        self.year.unwrap_or(0)
    }

    /// Sort key title: absent sorts as the empty string.
    pub fn sort_title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::Project;

    #[test]
    fn optional_fields_are_omitted_on_serialize() {
        let parsed: Project =
            serde_json::from_str(r#"{"id":"p1","images":[]}"#).expect("minimal project parses");
        let back = serde_json::to_string(&parsed).expect("project serializes");
        assert_eq!(back, r#"{"id":"p1","images":[]}"#);
    }

    #[test]
    fn camel_case_fields_round_trip() {
        let raw = r#"{
            "id": "p2",
            "analyticalCaption": "section through the vault",
            "images": [{"url": "/img/a.png", "sourceUrl": "https://example.org/a"}]
        }"#;
        let parsed: Project = serde_json::from_str(raw).expect("project parses");
        assert_eq!(
            parsed.analytical_caption.as_deref(),
            Some("section through the vault")
        );
        assert_eq!(parsed.images[0].source_url, "https://example.org/a");
        let back = serde_json::to_string(&parsed).expect("project serializes");
        assert!(back.contains("\"analyticalCaption\""));
        assert!(back.contains("\"sourceUrl\""));
    }

    #[test]
    fn sort_keys_default_for_absent_fields() {
        let parsed: Project =
            serde_json::from_str(r#"{"id":"p3","images":[]}"#).expect("minimal project parses");
        assert_eq!(parsed.sort_year(), 0);
        assert_eq!(parsed.sort_title(), "");
    }
}
