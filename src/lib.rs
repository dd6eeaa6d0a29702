//! # Case Review Builder
//!
//! A library for drafting structured clinical case reviews for a GP training
//! portfolio: a free-text case description and up to three capabilities go in,
//! an LLM drafts the review, and the returned text is split into editable
//! sections.
//!
//! ## Core Concepts
//!
//! - **Capability Catalog**: the ordered taxonomy of professional capabilities,
//!   parsed from a heading/bullet text format
//! - **Prompt Assembly**: the case and the selected capabilities are rendered
//!   into a prompt template
//! - **Generation**: any [`TextGenerator`] can draft the review; the `openai`
//!   feature provides an HTTP backend
//! - **Section Extraction**: the generated text is split into a [`CaseReview`]
//!   with ordered fallback patterns per field; a capability that cannot be
//!   found is reported as an [`ExtractionWarning`] instead of failing the run
//!
//! ## Example
//!
//! ```rust
//! use case_review_builder::*;
//!
//! let raw = "Capability: Clinical management\n\
//!            Justification: Arranged follow-up.\n\n\
//!            Reflection: What will I maintain, improve or stop?\n\
//!            Will keep safety netting.\n\n\
//!            Learning needs identified from this event:\n\
//!            Review the guideline.";
//!
//! let extraction = extract_sections(raw, &["Clinical management"]).unwrap();
//! assert_eq!(
//!     extraction.review.justification("Clinical management"),
//!     Some("Arranged follow-up.")
//! );
//! assert!(extraction.warnings.is_empty());
//! ```

pub mod assembler;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod generation;
pub mod prompts;
pub mod sanitize;
pub mod schema;
pub mod session;

#[cfg(feature = "openai")]
pub mod llm;

pub use assembler::{assemble_prompt, format_capabilities, validate_selection, MAX_SELECTED_CAPABILITIES};
pub use catalog::CapabilityCatalog;
pub use config::GenerationSettings;
pub use error::{CaseReviewError, Result};
pub use export::{export_file_name, export_text};
pub use extractor::{extract_sections, ExtractorOptions, SectionExtractor, SummaryBoundary};
pub use generation::{ChatMessage, CompletionRequest, GenerationClient, Role, TextGenerator};
pub use schema::*;
pub use session::{HistoryEntry, ReviewSession};
