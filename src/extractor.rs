//! Splits a generated case review into its named sections.
//!
//! Every field is extracted on its own. A field that cannot be found is left
//! empty; for requested capabilities the miss is also reported as an
//! [`ExtractionWarning`]. Only a failure to build the per-capability patterns
//! fails the whole extraction.

use crate::error::{CaseReviewError, Result};
use crate::schema::{CaseReview, Extraction, ExtractionWarning};
use log::{debug, warn};
use regex::Regex;

pub const SUMMARY_HEADINGS: &[&str] = &["Brief Description:", "Case Summary:"];

pub const REFLECTION_HEADINGS: &[&str] = &[
    "Reflection: What will I maintain, improve or stop?",
    "Reflection: What will I maintain, improve or stop",
    "Reflection:",
];

pub const LEARNING_NEEDS_HEADING: &str = "Learning needs identified from this event:";

const CAPABILITY_MARKER: &str = "Capability:";
const REFLECTION_MARKER: &str = "Reflection:";
const LEARNING_NEEDS_MARKER: &str = "Learning needs";

/// Markers that end a justification body.
const SECTION_MARKERS: &[&str] = &[CAPABILITY_MARKER, REFLECTION_MARKER, LEARNING_NEEDS_MARKER];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SummaryBoundary {
    /// Stop at the next section heading line (or end of text).
    #[default]
    NextHeading,
    /// Additionally stop at the first blank line after the summary starts.
    FirstBlankLine,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractorOptions {
    pub summary_boundary: SummaryBoundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JustificationPattern {
    /// `Capability: <name>` ... `Justification ...:` <body>
    CapabilityHeading,
    /// `<name>:` at the start of a line, then <body>
    NameWithColon,
    /// `<name>` on its own line, then <body>
    NameOnOwnLine,
}

const JUSTIFICATION_PATTERNS: [JustificationPattern; 3] = [
    JustificationPattern::CapabilityHeading,
    JustificationPattern::NameWithColon,
    JustificationPattern::NameOnOwnLine,
];

struct CapabilityPatterns {
    name: String,
    with_colon: Regex,
    own_line: Regex,
}

impl CapabilityPatterns {
    fn build(name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(CaseReviewError::extraction(
                "capability name is empty and cannot be matched",
            ));
        }
        if name.contains(|c: char| c == '\n' || c == '\r') {
            return Err(CaseReviewError::extraction(format!(
                "capability name {:?} spans more than one line",
                name
            )));
        }

        let escaped = regex::escape(name);
        Ok(Self {
            name: name.to_string(),
            with_colon: Regex::new(&format!(r"(?m)^[ \t]*{}[ \t]*:", escaped))?,
            own_line: Regex::new(&format!(r"(?m)^[ \t]*{}[ \t]*$", escaped))?,
        })
    }
}

pub struct SectionExtractor {
    capabilities: Vec<CapabilityPatterns>,
    options: ExtractorOptions,
    capability_heading: Regex,
    justification_marker: Regex,
    paragraph_break: Regex,
    summary_stop: Regex,
    blank_line: Regex,
}

impl SectionExtractor {
    pub fn new<S: AsRef<str>>(capabilities: &[S]) -> Result<Self> {
        Self::with_options(capabilities, ExtractorOptions::default())
    }

    pub fn with_options<S: AsRef<str>>(
        capabilities: &[S],
        options: ExtractorOptions,
    ) -> Result<Self> {
        let mut compiled: Vec<CapabilityPatterns> = Vec::with_capacity(capabilities.len());
        for name in capabilities.iter().map(AsRef::as_ref) {
            if compiled.iter().any(|c| c.name == name) {
                debug!("Ignoring repeated capability '{}'", name);
                continue;
            }
            compiled.push(CapabilityPatterns::build(name)?);
        }

        Ok(Self {
            capabilities: compiled,
            options,
            capability_heading: Regex::new(r"Capability:[ \t]*")?,
            justification_marker: Regex::new(r"Justification[^\n]*?:")?,
            paragraph_break: Regex::new(r"\n[ \t]*\n[ \t]*[A-Z]")?,
            summary_stop: Regex::new(r"(?m)^[ \t]*(?:Capability:|Reflection:|Learning needs)")?,
            blank_line: Regex::new(r"\n[ \t]*\n")?,
        })
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.capabilities.iter().map(|c| c.name.as_str())
    }

    pub fn extract(&self, raw: &str) -> Extraction {
        let text = raw.replace("\r\n", "\n");

        let names: Vec<&str> = self.capabilities().collect();
        let mut review = CaseReview {
            brief_description: self.brief_description(&text),
            ..CaseReview::for_capabilities(&names)
        };
        let mut warnings = Vec::new();

        for patterns in &self.capabilities {
            match self.justification(&text, patterns) {
                Some((pattern, body)) => {
                    debug!("Capability '{}' matched by {:?}", patterns.name, pattern);
                    review
                        .capability_justifications
                        .insert(patterns.name.clone(), body);
                }
                None => {
                    warn!("Could not find content for capability: {}", patterns.name);
                    warnings.push(ExtractionWarning::MissingCapability {
                        capability: patterns.name.clone(),
                    });
                }
            }
        }

        review.reflection = reflection(&text);
        review.learning_needs = learning_needs(&text);

        debug!(
            "Extracted review: summary={} reflection={} learning_needs={} missing_capabilities={}",
            !review.brief_description.is_empty(),
            !review.reflection.is_empty(),
            !review.learning_needs.is_empty(),
            warnings.len()
        );

        Extraction { review, warnings }
    }

    fn brief_description(&self, text: &str) -> String {
        SUMMARY_HEADINGS
            .iter()
            .find_map(|heading| {
                let start = text.find(heading)? + heading.len();
                let body = &text[start..];
                let mut end = self
                    .summary_stop
                    .find(body)
                    .map_or(body.len(), |m| m.start());

                if self.options.summary_boundary == SummaryBoundary::FirstBlankLine {
                    let content_start = body.len() - body.trim_start().len();
                    if let Some(blank) = self.blank_line.find(&body[content_start..]) {
                        end = end.min(content_start + blank.start());
                    }
                }

                Some(body[..end].trim().to_string())
            })
            .unwrap_or_default()
    }

    fn justification(
        &self,
        text: &str,
        patterns: &CapabilityPatterns,
    ) -> Option<(JustificationPattern, String)> {
        JUSTIFICATION_PATTERNS.iter().find_map(|pattern| {
            let body = match pattern {
                JustificationPattern::CapabilityHeading => {
                    self.match_capability_heading(text, &patterns.name)
                }
                JustificationPattern::NameWithColon => {
                    self.match_loose(text, &patterns.with_colon)
                }
                JustificationPattern::NameOnOwnLine => self.match_loose(text, &patterns.own_line),
            };
            body.map(|body| (*pattern, body))
        })
    }

    /// First `Capability:` heading in document order that names exactly
    /// `name` and has a justification marker before the next section.
    fn match_capability_heading(&self, text: &str, name: &str) -> Option<String> {
        self.capability_heading.find_iter(text).find_map(|heading| {
            let rest = text[heading.end()..].strip_prefix(name)?;
            if !heading_names_exactly(rest) {
                return None;
            }
            let chunk = &rest[..earliest(rest, SECTION_MARKERS)];
            let marker = self.justification_marker.find(chunk)?;
            non_empty(&chunk[marker.end()..])
        })
    }

    fn match_loose(&self, text: &str, pattern: &Regex) -> Option<String> {
        pattern.find_iter(text).find_map(|m| {
            let body = &text[m.end()..];
            let content_start = body.len() - body.trim_start().len();
            let mut body = &body[content_start..];

            if let Some(marker) = self.justification_marker.find(body) {
                if marker.start() == 0 {
                    body = &body[marker.end()..];
                }
            }

            let paragraph_end = self
                .paragraph_break
                .find(body)
                .map_or(body.len(), |m| m.start());
            let end = paragraph_end.min(earliest(body, SECTION_MARKERS));
            non_empty(&body[..end])
        })
    }
}

/// Extract sections for `capabilities` from `text` with default options.
pub fn extract_sections<S: AsRef<str>>(text: &str, capabilities: &[S]) -> Result<Extraction> {
    Ok(SectionExtractor::new(capabilities)?.extract(text))
}

fn reflection(text: &str) -> String {
    REFLECTION_HEADINGS
        .iter()
        .find_map(|heading| {
            let start = text.find(heading)? + heading.len();
            let body = &text[start..];
            let end = body.find(LEARNING_NEEDS_MARKER).unwrap_or(body.len());
            Some(body[..end].trim().to_string())
        })
        .unwrap_or_default()
}

fn learning_needs(text: &str) -> String {
    text.find(LEARNING_NEEDS_HEADING)
        .map(|start| text[start + LEARNING_NEEDS_HEADING.len()..].trim().to_string())
        .unwrap_or_default()
}

/// The heading line must not continue the name with another word, so that
/// "Clinical management" does not claim "Clinical management of risk".
fn heading_names_exactly(rest: &str) -> bool {
    let line = rest.lines().next().unwrap_or("").trim_start();
    match line.chars().next() {
        None => true,
        Some(c) if !c.is_alphanumeric() => true,
        Some(_) => line.starts_with("Justification"),
    }
}

fn earliest(text: &str, markers: &[&str]) -> usize {
    markers
        .iter()
        .filter_map(|marker| text.find(marker))
        .min()
        .unwrap_or(text.len())
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_with_colon_fallback() {
        let text = "Brief Description:\nShort case.\n\n\
                    Clinical management:\nArranged follow-up in a week.\n\n\
                    Reflection:\nWent well.";
        let extraction = extract_sections(text, &["Clinical management"]).unwrap();

        assert_eq!(
            extraction.review.justification("Clinical management"),
            Some("Arranged follow-up in a week.")
        );
        assert!(extraction.warnings.is_empty());
        assert_eq!(extraction.review.reflection, "Went well.");
    }

    #[test]
    fn test_name_with_colon_must_start_the_line() {
        let text = "Brief Description:\nNon Clinical management: not relevant here.\n\nReflection: r";
        let extraction = extract_sections(text, &["Clinical management"]).unwrap();

        assert_eq!(extraction.review.justification("Clinical management"), Some(""));
        assert_eq!(
            extraction.warnings,
            vec![ExtractionWarning::MissingCapability {
                capability: "Clinical management".to_string()
            }]
        );
    }

    #[test]
    fn test_name_with_colon_allows_indent() {
        let text = "  Clinical management : Safety netted.\n\nReflection: r";
        let extraction = extract_sections(text, &["Clinical management"]).unwrap();
        assert_eq!(
            extraction.review.justification("Clinical management"),
            Some("Safety netted.")
        );
    }

    #[test]
    fn test_name_on_own_line_fallback() {
        let text = "Community orientation\n\nUsed the local social prescriber.\n\
                    Linked with the practice nurse.\n\nLearning needs identified from this event:\nNone.";
        let extraction = extract_sections(text, &["Community orientation"]).unwrap();

        assert_eq!(
            extraction.review.justification("Community orientation"),
            Some("Used the local social prescriber.\nLinked with the practice nurse.")
        );
        assert_eq!(extraction.review.learning_needs, "None.");
    }

    #[test]
    fn test_loose_match_drops_leading_justification_marker() {
        let text = "Clinical management\nJustification: Referred urgently.\n\nReflection: ok";
        let extraction = extract_sections(text, &["Clinical management"]).unwrap();
        assert_eq!(
            extraction.review.justification("Clinical management"),
            Some("Referred urgently.")
        );
    }

    #[test]
    fn test_justification_marker_with_instruction_text() {
        let text = "Capability: Clinical management\n\
                    Justification [describe how your actions and approach link to the capability]: \
                    Safety netted clearly.\nReflection: fine";
        let extraction = extract_sections(text, &["Clinical management"]).unwrap();
        assert_eq!(
            extraction.review.justification("Clinical management"),
            Some("Safety netted clearly.")
        );
    }

    #[test]
    fn test_heading_without_justification_falls_through() {
        // No Justification marker, so the heading pattern fails and the
        // own-line pattern cannot match either: the name shares its line
        // with the "Capability:" prefix.
        let text = "Capability: Clinical management\nDid some things.\n\nReflection: ok";
        let extraction = extract_sections(text, &["Clinical management"]).unwrap();
        assert_eq!(extraction.review.justification("Clinical management"), Some(""));
        assert_eq!(extraction.warnings.len(), 1);
    }

    #[test]
    fn test_prefix_name_does_not_claim_longer_heading() {
        let text = "Capability: Clinical management of risk\nJustification: Risk text.\n\n\
                    Capability: Clinical management\nJustification: Management text.\n";
        let extraction = extract_sections(text, &["Clinical management"]).unwrap();
        assert_eq!(
            extraction.review.justification("Clinical management"),
            Some("Management text.")
        );
    }

    #[test]
    fn test_first_matching_heading_wins() {
        let text = "Capability: Clinical management\nJustification: First.\n\n\
                    Capability: Clinical management\nJustification: Second.\n";
        let extraction = extract_sections(text, &["Clinical management"]).unwrap();
        assert_eq!(
            extraction.review.justification("Clinical management"),
            Some("First.")
        );
    }

    #[test]
    fn test_heading_tolerates_missing_space_and_crlf() {
        let text = "Capability:Clinical management\r\nJustification: Done.\r\n\r\nReflection: ok";
        let extraction = extract_sections(text, &["Clinical management"]).unwrap();
        assert_eq!(
            extraction.review.justification("Clinical management"),
            Some("Done.")
        );
    }

    #[test]
    fn test_case_summary_synonym() {
        let text = "Case Summary:\nOlder heading.\n\nCapability: X\nJustification: y";
        let extraction = extract_sections(text, &["X"]).unwrap();
        assert_eq!(extraction.review.brief_description, "Older heading.");
    }

    #[test]
    fn test_brief_description_preferred_over_case_summary() {
        let text = "Case Summary:\nold\nBrief Description:\nnew\nReflection: r";
        let extraction = extract_sections(text, &["X"]).unwrap();
        assert_eq!(extraction.review.brief_description, "new");
    }

    #[test]
    fn test_summary_first_blank_line_boundary() {
        let text = "Brief Description:\n\nFirst paragraph.\nStill first.\n\nSecond paragraph.\n\n\
                    Capability: X\nJustification: y";

        let lenient = extract_sections(text, &["X"]).unwrap();
        assert_eq!(
            lenient.review.brief_description,
            "First paragraph.\nStill first.\n\nSecond paragraph."
        );

        let strict = SectionExtractor::with_options(
            &["X"],
            ExtractorOptions {
                summary_boundary: SummaryBoundary::FirstBlankLine,
            },
        )
        .unwrap()
        .extract(text);
        assert_eq!(
            strict.review.brief_description,
            "First paragraph.\nStill first."
        );
    }

    #[test]
    fn test_reflection_variants() {
        let with_question = "Reflection: What will I maintain, improve or stop?\nA\nLearning needs: B";
        let without_question = "Reflection: What will I maintain, improve or stop\nA\nLearning needs: B";
        let bare = "Reflection:\nA\nLearning needs: B";
        for text in [with_question, without_question, bare] {
            assert_eq!(reflection(text), "A", "{:?}", text);
        }
        assert_eq!(reflection("no heading here"), "");
    }

    #[test]
    fn test_reflection_runs_to_end_without_learning_needs() {
        assert_eq!(reflection("Reflection:\nAll of this.\nAnd this."), "All of this.\nAnd this.");
    }

    #[test]
    fn test_invalid_capability_names() {
        for name in ["", "   ", "Clinical\nmanagement"] {
            let err = SectionExtractor::new(&[name]).err().unwrap();
            assert!(matches!(err, CaseReviewError::Extraction { .. }), "{:?}", name);
        }
    }

    #[test]
    fn test_special_characters_in_names_are_literal() {
        let name = "Making a decision/diagnosis (and more?)";
        let text = format!("Capability: {}\nJustification: Decided.\n", name);
        let extraction = extract_sections(&text, &[name]).unwrap();
        assert_eq!(extraction.review.justification(name), Some("Decided."));
    }

    #[test]
    fn test_repeated_capability_is_extracted_once() {
        let extractor = SectionExtractor::new(&["A", "A"]).unwrap();
        assert_eq!(extractor.capabilities().count(), 1);
        let extraction = extractor.extract("nothing");
        assert_eq!(extraction.warnings.len(), 1);
    }
}
