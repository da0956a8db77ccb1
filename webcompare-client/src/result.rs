use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One `(name, url)` pair as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebsiteInput {
    pub name: String,
    pub url: String,
}

impl WebsiteInput {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Both fields carry something other than whitespace
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.url.trim().is_empty()
    }
}

/// Reads `null` the same as a missing field. The analysis service passes
/// model output through unchecked, so empty lists sometimes arrive as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of the `POST /compare_websites` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub websites: Vec<WebsiteInput>,
    pub category: String,
}

/// The analysis response for one submitted batch.
///
/// Only the parts the views read are modelled; everything else the server
/// sends is kept in `extra` so a cached result serializes back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub websites: Vec<AnalyzedWebsite>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full: Vec<SectionScore>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub header: Vec<SectionScore>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub main: Vec<SectionScore>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub footer: Vec<SectionScore>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A row of a per-section table. Scores are on a 0.0-1.0 scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionScore {
    pub name: String,
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub criteria: BTreeMap<String, f64>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        rename = "gemini_strengths",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub strengths: Vec<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        rename = "gemini_weaknesses",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub weaknesses: Vec<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        rename = "gemini_recommendations",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub recommendations: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedWebsite {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Reported on a 1-10 scale by the analysis service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sections: BTreeMap<String, SectionAnalysis>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub vision_improvements: BTreeMap<String, VisionCategory>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub strengths: Vec<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub weaknesses: Vec<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub recommendations: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionCategory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_analysis: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_website_input_is_complete() {
        assert!(WebsiteInput::new("A", "http://a.test").is_complete());
        assert!(!WebsiteInput::new("A", "").is_complete());
        assert!(!WebsiteInput::new("   ", "http://a.test").is_complete());
    }

    #[test]
    fn test_unknown_fields_survive_serialization() {
        let raw = r#"{
            "full": [{"name": "A", "score": 0.5, "criteria": {"Clarity": 0.5},
                      "path": "screenshots/a/a_full.png", "gemini_score": 0.5}],
            "comparison": {"winner": "A"}
        }"#;

        let parsed: ComparisonResult = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.full[0].extra["path"], "screenshots/a/a_full.png");
        assert_eq!(parsed.extra["comparison"]["winner"], "A");

        let again: ComparisonResult =
            serde_json::from_str(&serde_json::to_string(&parsed).unwrap()).unwrap();
        assert_eq!(again, parsed);
    }

    #[test]
    fn test_integer_scores_are_accepted() {
        let raw = r#"{"websites": [{"name": "A", "overall_score": 8,
                       "sections": {"header": {"score": 7}}}]}"#;

        let parsed: ComparisonResult = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.websites[0].overall_score, Some(8.0));
        assert_eq!(parsed.websites[0].sections["header"].score, Some(7.0));
    }

    #[test]
    fn test_null_lists_read_as_empty() {
        let raw = r#"{
            "websites": [{"name": "A", "url": "http://a.test", "overall_score": 6,
                          "sections": {"header": {"score": 7, "strengths": null,
                                                  "weaknesses": ["Dense"], "recommendations": null}},
                          "vision_improvements": {"layout": {"current_analysis": "ok",
                                                             "recommendations": null}}}],
            "header": [{"name": "A", "score": 0.7, "criteria": null,
                        "gemini_strengths": null, "gemini_weaknesses": ["Busy"],
                        "gemini_recommendations": null}],
            "main": null
        }"#;

        let parsed: ComparisonResult = serde_json::from_str(raw).unwrap();

        let website = &parsed.websites[0];
        assert!(website.sections["header"].strengths.is_empty());
        assert_eq!(website.sections["header"].weaknesses, vec!["Dense"]);
        assert!(website.sections["header"].recommendations.is_empty());
        assert_eq!(
            website.vision_improvements["layout"].current_analysis.as_deref(),
            Some("ok")
        );
        assert!(website.vision_improvements["layout"].recommendations.is_empty());

        let row = &parsed.header[0];
        assert!(row.criteria.is_empty());
        assert!(row.strengths.is_empty());
        assert_eq!(row.weaknesses, vec!["Busy"]);
        assert!(parsed.main.is_empty());
    }

    #[test]
    fn test_null_vision_map_reads_as_empty() {
        let raw = r#"{"websites": [{"name": "A", "sections": null, "vision_improvements": null}]}"#;

        let parsed: ComparisonResult = serde_json::from_str(raw).unwrap();
        assert!(parsed.websites[0].sections.is_empty());
        assert!(parsed.websites[0].vision_improvements.is_empty());
    }
}
