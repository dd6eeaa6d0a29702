use crate::extractor::{LEARNING_NEEDS_HEADING, REFLECTION_HEADINGS};
use crate::schema::CaseReview;

/// Render a review as the flat portfolio text: one `Capability:` /
/// `Justification:` block per capability, then the reflection and learning
/// needs blocks. The output is readable by the section extractor again.
pub fn export_text(review: &CaseReview) -> String {
    let mut output = String::new();

    for (capability, justification) in &review.capability_justifications {
        output.push_str(&format!(
            "Capability: {}\nJustification: {}\n\n",
            capability,
            justification.trim()
        ));
    }

    output.push_str(REFLECTION_HEADINGS[0]);
    output.push('\n');
    output.push_str(review.reflection.trim());
    output.push_str("\n\n");

    output.push_str(LEARNING_NEEDS_HEADING);
    output.push('\n');
    output.push_str(review.learning_needs.trim());
    output.push('\n');

    output
}

/// A file name for the exported text, derived from an optional title.
pub fn export_file_name(title: Option<&str>) -> String {
    let slug = title
        .map(|t| {
            t.chars()
                .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
                .collect::<String>()
                .split('-')
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join("-")
        })
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| "case-review".to_string());
    format!("{}.txt", slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review() -> CaseReview {
        let mut review = CaseReview::for_capabilities(&["Clinical management", "Community orientation"]);
        review.brief_description = "Not exported.".to_string();
        review.capability_justifications["Clinical management"] = "Arranged follow-up.".to_string();
        review.capability_justifications["Community orientation"] = "  Used local services. ".to_string();
        review.reflection = "Keep it up.".to_string();
        review.learning_needs = "Read the guideline.".to_string();
        review
    }

    #[test]
    fn test_export_layout() {
        assert_eq!(
            export_text(&review()),
            "Capability: Clinical management\nJustification: Arranged follow-up.\n\n\
             Capability: Community orientation\nJustification: Used local services.\n\n\
             Reflection: What will I maintain, improve or stop?\nKeep it up.\n\n\
             Learning needs identified from this event:\nRead the guideline.\n"
        );
    }

    #[test]
    fn test_export_empty_review_keeps_headings() {
        let text = export_text(&CaseReview::for_capabilities(&["Clinical management"]));
        assert!(text.starts_with("Capability: Clinical management\nJustification: \n\n"));
        assert!(text.contains("Reflection: What will I maintain, improve or stop?\n"));
        assert!(text.ends_with("Learning needs identified from this event:\n\n"));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(None), "case-review.txt");
        assert_eq!(
            export_file_name(Some("Chest pain in a 45 year old!")),
            "chest-pain-in-a-45-year-old.txt"
        );
        assert_eq!(export_file_name(Some("***")), "case-review.txt");
    }
}
