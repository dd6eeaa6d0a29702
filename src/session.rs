//! One user's drafting session: case text, selection, editable prompts,
//! the current review and the conversation that produced it.

use crate::assembler::{assemble_prompt, validate_selection, MAX_SELECTED_CAPABILITIES};
use crate::catalog::CapabilityCatalog;
use crate::error::{CaseReviewError, Result};
use crate::export::export_text;
use crate::extractor::{ExtractorOptions, SectionExtractor};
use crate::generation::{ChatMessage, GenerationClient, TextGenerator};
use crate::prompts::{improvement_request, PROMPT_TEMPLATE, SYSTEM_PROMPT};
use crate::schema::{CaseReview, Extraction, ExtractionWarning};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub message: ChatMessage,
    pub at: DateTime<Utc>,
}

pub struct ReviewSession<G> {
    catalog: Arc<CapabilityCatalog>,
    client: GenerationClient<G>,
    extractor_options: ExtractorOptions,
    prompt_template: String,
    system_prompt: String,
    case_description: String,
    selected: Vec<String>,
    review: Option<CaseReview>,
    warnings: Vec<ExtractionWarning>,
    raw_response: Option<String>,
    title: Option<String>,
    history: Vec<HistoryEntry>,
}

impl<G: TextGenerator> ReviewSession<G> {
    pub fn new(catalog: Arc<CapabilityCatalog>, client: GenerationClient<G>) -> Self {
        Self {
            catalog,
            client,
            extractor_options: ExtractorOptions::default(),
            prompt_template: PROMPT_TEMPLATE.to_string(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            case_description: String::new(),
            selected: Vec::new(),
            review: None,
            warnings: Vec::new(),
            raw_response: None,
            title: None,
            history: Vec::new(),
        }
    }

    pub fn with_extractor_options(mut self, options: ExtractorOptions) -> Self {
        self.extractor_options = options;
        self
    }

    pub fn catalog(&self) -> &CapabilityCatalog {
        &self.catalog
    }

    pub fn case_description(&self) -> &str {
        &self.case_description
    }

    pub fn set_case_description(&mut self, description: impl Into<String>) {
        self.case_description = description.into();
    }

    pub fn selected_capabilities(&self) -> &[String] {
        &self.selected
    }

    /// Replace the selection. Every name must be in the catalog and at most
    /// three may be chosen; on error the previous selection is kept.
    pub fn select_capabilities<S: AsRef<str>>(&mut self, capabilities: &[S]) -> Result<()> {
        if capabilities.len() > MAX_SELECTED_CAPABILITIES {
            return Err(CaseReviewError::InvalidSelection(format!(
                "Please select no more than {} capabilities",
                MAX_SELECTED_CAPABILITIES
            )));
        }

        let mut selection: Vec<String> = Vec::with_capacity(capabilities.len());
        for name in capabilities.iter().map(AsRef::as_ref) {
            if !self.catalog.contains(name) {
                return Err(CaseReviewError::InvalidSelection(format!(
                    "Unknown capability: {}",
                    name
                )));
            }
            if !selection.iter().any(|s| s == name) {
                selection.push(name.to_string());
            }
        }

        self.selected = selection;
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn prompt_template(&self) -> &str {
        &self.prompt_template
    }

    pub fn set_prompt_template(&mut self, template: impl Into<String>) {
        self.prompt_template = template.into();
    }

    pub fn reset_prompt_template(&mut self) {
        self.prompt_template = PROMPT_TEMPLATE.to_string();
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = prompt.into();
    }

    pub fn reset_system_prompt(&mut self) {
        self.system_prompt = SYSTEM_PROMPT.to_string();
    }

    /// The prompt [`generate`](Self::generate) would send, without sending it.
    pub fn preview_prompt(&self) -> Result<String> {
        assemble_prompt(&self.prompt_template, &self.case_description, &self.selected)
    }

    /// Generate a fresh review for the current case and selection.
    ///
    /// The new review replaces the previous one only once generation and
    /// extraction have both succeeded; on error nothing changes.
    pub async fn generate(&mut self) -> Result<&[ExtractionWarning]> {
        validate_selection(&self.case_description, &self.selected)?;
        let prompt = assemble_prompt(&self.prompt_template, &self.case_description, &self.selected)?;
        let extractor = SectionExtractor::with_options(&self.selected, self.extractor_options)?;

        info!(
            "Generating case review for {} capabilities",
            self.selected.len()
        );
        let messages = self
            .client
            .initial_messages(&prompt, Some(self.system_prompt.as_str()));
        let raw = self.client.generate_messages(messages.clone()).await?;
        let extraction = extractor.extract(&raw);

        let now = Utc::now();
        self.history = messages
            .into_iter()
            .chain(std::iter::once(ChatMessage::assistant(raw.clone())))
            .map(|message| HistoryEntry { message, at: now })
            .collect();
        self.title = None;
        Ok(self.commit(raw, extraction))
    }

    /// Ask for a revised review, continuing the conversation that produced
    /// the current one. The revision fully replaces the current review,
    /// including any manual edits.
    pub async fn improve(&mut self, feedback: &str) -> Result<&[ExtractionWarning]> {
        let review = self.review.as_ref().ok_or(CaseReviewError::NoReview)?;
        if feedback.trim().is_empty() {
            return Err(CaseReviewError::InvalidSelection(
                "Please describe how the review should be improved".to_string(),
            ));
        }
        let capabilities: Vec<String> = review.capabilities().map(str::to_string).collect();
        let extractor = SectionExtractor::with_options(&capabilities, self.extractor_options)?;

        let request = ChatMessage::user(improvement_request(feedback));
        let mut messages: Vec<ChatMessage> =
            self.history.iter().map(|entry| entry.message.clone()).collect();
        messages.push(request.clone());

        info!("Requesting an improved case review");
        let raw = self.client.generate_messages(messages).await?;
        let extraction = extractor.extract(&raw);

        let now = Utc::now();
        self.history.push(HistoryEntry {
            message: request,
            at: now,
        });
        self.history.push(HistoryEntry {
            message: ChatMessage::assistant(raw.clone()),
            at: now,
        });
        Ok(self.commit(raw, extraction))
    }

    pub async fn generate_title(&mut self) -> Result<&str> {
        if self.case_description.trim().is_empty() {
            return Err(CaseReviewError::InvalidSelection(
                "Please enter a case description".to_string(),
            ));
        }
        let title = self.client.generate_title(&self.case_description).await?;
        Ok(self.title.insert(title).as_str())
    }

    fn commit(&mut self, raw: String, extraction: Extraction) -> &[ExtractionWarning] {
        for warning in &extraction.warnings {
            warn!("{}", warning);
        }
        self.review = Some(extraction.review);
        self.warnings = extraction.warnings;
        self.raw_response = Some(raw);
        &self.warnings
    }

    pub fn review(&self) -> Option<&CaseReview> {
        self.review.as_ref()
    }

    pub fn warnings(&self) -> &[ExtractionWarning] {
        &self.warnings
    }

    pub fn raw_response(&self) -> Option<&str> {
        self.raw_response.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    fn review_mut(&mut self) -> Result<&mut CaseReview> {
        self.review.as_mut().ok_or(CaseReviewError::NoReview)
    }

    pub fn edit_brief_description(&mut self, text: impl Into<String>) -> Result<()> {
        self.review_mut()?.brief_description = text.into();
        Ok(())
    }

    /// Replace one justification. Only capabilities the review was generated
    /// for can be edited.
    pub fn edit_justification(&mut self, capability: &str, text: impl Into<String>) -> Result<()> {
        let review = self.review_mut()?;
        let slot = review
            .capability_justifications
            .get_mut(capability)
            .ok_or_else(|| {
                CaseReviewError::InvalidSelection(format!(
                    "Capability is not part of this review: {}",
                    capability
                ))
            })?;
        *slot = text.into();
        Ok(())
    }

    pub fn edit_reflection(&mut self, text: impl Into<String>) -> Result<()> {
        self.review_mut()?.reflection = text.into();
        Ok(())
    }

    pub fn edit_learning_needs(&mut self, text: impl Into<String>) -> Result<()> {
        self.review_mut()?.learning_needs = text.into();
        Ok(())
    }

    pub fn export(&self) -> Result<String> {
        self.review
            .as_ref()
            .map(export_text)
            .ok_or(CaseReviewError::NoReview)
    }
}
