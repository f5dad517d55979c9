use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A request to build the insight deck for one reporting period.
///
/// The wire name of `folder_token` is `file_id`, but it has always been used as the
/// Drive folder the deck is filed under, never as a file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationRequest {
    pub quarter_no: String,
    pub year_no: String,
    #[serde(rename = "file_id")]
    pub folder_token: String,
}

impl GenerationRequest {
    /// True when every field carries a non-blank value.
    pub fn has_required_fields(&self) -> bool {
        [&self.quarter_no, &self.year_no, &self.folder_token]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// The period identifiers sent to the analytics service.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodQuery<'a> {
    pub quarter_no: &'a str,
    pub year_no: &'a str,
}

/// Everything that goes on a single slide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideContent {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub insights: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub drivers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub codes: Vec<String>,
}

impl SlideContent {
    /// The labeled sections of this slide in render order, skipping empty lists.
    pub fn sections(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        [
            ("Insights", self.insights.as_slice()),
            ("Recommendations", self.recommendations.as_slice()),
            ("Drivers", self.drivers.as_slice()),
            ("Codes", self.codes.as_slice()),
        ]
        .into_iter()
        .filter(|(_, items)| !items.is_empty())
    }
}

/// Slide index -> content. Iterates in ascending slide index.
pub type SlideContentMap = BTreeMap<i64, SlideContent>;

/// A finished presentation file, ready to upload.
#[derive(Debug, Clone)]
pub struct RenderedDeck {
    pub bytes: Vec<u8>,
    pub slide_count: usize,
}

/// What the storage backend hands back after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub id: String,
}

impl UploadedFile {
    pub fn web_link(&self) -> String {
        format!("https://drive.google.com/file/d/{}/view", self.id)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_reads_file_id_as_folder_token() {
        let request: GenerationRequest = serde_json::from_str(
            r#"{"quarter_no": "Q3", "year_no": "2024", "file_id": "folder-abc"}"#,
        )
        .unwrap();

        assert_eq!(request.folder_token, "folder-abc");
        assert!(request.has_required_fields());
    }

    #[test]
    fn test_blank_fields_are_not_present() {
        let request = GenerationRequest {
            quarter_no: "Q1".to_string(),
            year_no: "  ".to_string(),
            folder_token: "folder".to_string(),
        };

        assert!(!request.has_required_fields());
    }

    #[test]
    fn test_content_map_parses_string_keys_in_slide_order() {
        let json = r#"{
            "12": {"insights": ["late"], "recommendations": [], "drivers": [], "codes": []},
            "3": {"insights": ["early"], "recommendations": [], "drivers": [], "codes": []}
        }"#;

        let map: SlideContentMap = serde_json::from_str(json).unwrap();
        let keys: Vec<i64> = map.keys().copied().collect();

        assert_eq!(keys, vec![3, 12]);
        assert_eq!(map[&3].insights, vec!["early".to_string()]);
    }

    #[test]
    fn test_missing_and_null_lists_are_empty() {
        let content: SlideContent =
            serde_json::from_str(r#"{"insights": null, "codes": ["C1"]}"#).unwrap();

        assert!(content.insights.is_empty());
        assert!(content.recommendations.is_empty());
        assert_eq!(content.codes, vec!["C1".to_string()]);
    }

    #[test]
    fn test_sections_skip_empty_lists_and_keep_order() {
        let content = SlideContent {
            insights: vec!["a".to_string()],
            recommendations: vec![],
            drivers: vec!["b".to_string()],
            codes: vec!["c".to_string()],
        };

        let labels: Vec<&str> = content.sections().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["Insights", "Drivers", "Codes"]);
    }

    #[test]
    fn test_non_integer_slide_key_is_rejected() {
        let result = serde_json::from_str::<SlideContentMap>(r#"{"intro": {}}"#);
        assert!(result.is_err());
    }
}
