use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub const BULLET_MARKER: char = '-';

/// The GP training capability taxonomy shipped with the crate.
pub const DEFAULT_CAPABILITY_TEXT: &str = include_str!("../data/capabilities.txt");

/// Ordered capability name -> descriptive bullet lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityCatalog {
    entries: IndexMap<String, Vec<String>>,
}

impl CapabilityCatalog {
    /// Parse the heading/bullet grammar: every non-blank line that does not
    /// start with [`BULLET_MARKER`] opens a heading, and bullet lines attach
    /// to the most recent heading. Headings without bullets are dropped.
    pub fn parse(content: &str) -> Self {
        let mut entries: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut current_heading: Option<String> = None;
        let mut current_points: Vec<String> = Vec::new();

        for line in content
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
        {
            if line.starts_with(BULLET_MARKER) {
                current_points.push(line.to_string());
            } else {
                if let Some(heading) = current_heading.take() {
                    flush(&mut entries, heading, std::mem::take(&mut current_points));
                }
                current_heading = Some(line.to_string());
                current_points.clear();
            }
        }

        if let Some(heading) = current_heading {
            flush(&mut entries, heading, current_points);
        }

        debug!("Parsed capability catalog with {} entries", entries.len());
        Self { entries }
    }

    pub fn default_catalog() -> Self {
        Self::parse(DEFAULT_CAPABILITY_TEXT)
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, points)| (name.as_str(), points.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn flush(entries: &mut IndexMap<String, Vec<String>>, heading: String, points: Vec<String>) {
    if points.is_empty() {
        warn!("Dropping capability heading without bullet points: {}", heading);
        return;
    }
    entries.insert(heading, points);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headings_and_bullets() {
        let text = "\nAlpha\n- first\n- second\n\nBeta\n- only\n";
        let catalog = CapabilityCatalog::parse(text);

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.get("Alpha").unwrap(),
            &["- first".to_string(), "- second".to_string()]
        );
        assert_eq!(catalog.get("Beta").unwrap(), &["- only".to_string()]);
        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_heading_without_bullets_is_dropped() {
        let text = "Alpha\n- a\nEmpty heading\nGamma\n- g\nTrailing heading\n";
        let catalog = CapabilityCatalog::parse(text);

        assert_eq!(catalog.len(), 2);
        assert!(!catalog.contains("Empty heading"));
        assert!(!catalog.contains("Trailing heading"));
        assert!(catalog.contains("Gamma"));
    }

    #[test]
    fn test_entry_count_matches_bulleted_headings() {
        let cases = [
            ("", 0),
            ("- orphan bullet\n", 0),
            ("A\n", 0),
            ("A\n- x\nB\nC\n- y\n- z\n", 2),
            ("A\n- x\n\n\nB\n\n- y\n", 2),
        ];
        for (text, expected) in cases {
            assert_eq!(CapabilityCatalog::parse(text).len(), expected, "{:?}", text);
        }
    }

    #[test]
    fn test_duplicate_heading_overwrites_in_place() {
        let catalog = CapabilityCatalog::parse("A\n- one\nB\n- b\nA\n- two\n");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("A").unwrap(), &["- two".to_string()]);
        assert_eq!(catalog.names().next(), Some("A"));
    }

    #[test]
    fn test_trailing_whitespace_is_trimmed() {
        let catalog = CapabilityCatalog::parse("Alpha   \n- point  \n");
        assert_eq!(catalog.get("Alpha").unwrap(), &["- point".to_string()]);
    }

    #[test]
    fn test_default_catalog() {
        let catalog = CapabilityCatalog::default_catalog();
        assert_eq!(catalog.len(), 13);
        assert_eq!(catalog.names().next(), Some("Fitness to practise"));
        assert!(catalog.contains("Communication and consultation skills"));
        assert!(catalog.contains("Clinical management"));
        assert!(catalog.contains("Community orientation"));
        assert!(catalog
            .iter()
            .all(|(_, points)| points.iter().all(|p| p.starts_with(BULLET_MARKER))));
    }
}
