use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The sections a generated case review is split into.
///
/// Every field is plain text and may be empty. An empty justification is
/// always accompanied by an [`ExtractionWarning`] in the [`Extraction`] that
/// produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CaseReview {
    #[schemars(description = "Structured summary of the case, its key decisions and outcomes")]
    pub brief_description: String,

    #[schemars(
        description = "Justification text per selected capability, in the order the capabilities were selected"
    )]
    pub capability_justifications: IndexMap<String, String>,

    #[schemars(description = "What will I maintain, improve or stop?")]
    pub reflection: String,

    #[schemars(description = "Learning needs identified from this event")]
    pub learning_needs: String,
}

impl CaseReview {
    /// An empty review whose justification keys are fixed to `capabilities`.
    pub fn for_capabilities<S: AsRef<str>>(capabilities: &[S]) -> Self {
        Self {
            capability_justifications: capabilities
                .iter()
                .map(|c| (c.as_ref().to_string(), String::new()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn justification(&self, capability: &str) -> Option<&str> {
        self.capability_justifications
            .get(capability)
            .map(String::as_str)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.capability_justifications.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.brief_description.is_empty()
            && self.reflection.is_empty()
            && self.learning_needs.is_empty()
            && self.capability_justifications.values().all(String::is_empty)
    }
}

/// A soft extraction failure. The operation still succeeds, but the caller
/// must show these to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionWarning {
    MissingCapability { capability: String },
}

impl ExtractionWarning {
    pub fn capability(&self) -> &str {
        match self {
            ExtractionWarning::MissingCapability { capability } => capability,
        }
    }
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionWarning::MissingCapability { capability } => {
                write!(f, "Could not find content for capability: {}", capability)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Extraction {
    pub review: CaseReview,
    pub warnings: Vec<ExtractionWarning>,
}

impl Extraction {
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// JSON Schema for [`Extraction`], for tooling that consumes `--json` output.
pub fn extraction_schema() -> crate::error::Result<serde_json::Value> {
    let schema = schemars::schema_for!(Extraction);
    Ok(serde_json::to_value(schema)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_capabilities_keeps_order() {
        let review = CaseReview::for_capabilities(&["Clinical management", "Community orientation"]);
        let names: Vec<&str> = review.capabilities().collect();
        assert_eq!(names, vec!["Clinical management", "Community orientation"]);
        assert!(review.is_empty());
        assert_eq!(review.justification("Community orientation"), Some(""));
    }

    #[test]
    fn test_warning_display() {
        let warning = ExtractionWarning::MissingCapability {
            capability: "Clinical management".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "Could not find content for capability: Clinical management"
        );
    }

    #[test]
    fn test_schema_lists_review_fields() {
        let schema = extraction_schema().unwrap().to_string();
        assert!(schema.contains("brief_description"));
        assert!(schema.contains("capability_justifications"));
        assert!(schema.contains("learning_needs"));
    }
}
