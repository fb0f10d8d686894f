//! Inbound generation request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CardId, PipelineError, UserId};

/// Answers to clarifying questions, keyed by question index.
pub type Answers = BTreeMap<usize, String>;

/// A request to moderate and generate content for one task.
///
/// Absent optional text fields behave exactly like empty strings. The title is
/// required and must be non-empty after trimming; see [`Self::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Trusted identity supplied by the authentication layer.
    pub user_id: UserId,
    /// Task title.
    #[serde(default)]
    pub title: String,
    /// Current task description.
    #[serde(default)]
    pub description: Option<String>,
    /// Free-text instructions for the advanced strategy.
    #[serde(default, rename = "userPrompt")]
    pub free_prompt: Option<String>,
    /// Clarifying questions previously returned to the caller, in order.
    #[serde(default)]
    pub questions: Vec<String>,
    /// Answers to those questions, keyed by index.
    #[serde(default)]
    pub answers: Answers,
    /// Card the description is for, recorded in the audit log.
    #[serde(default)]
    pub card_id: Option<CardId>,
}

impl GenerationRequest {
    /// Creates a request with only the required fields set.
    pub fn new(user_id: UserId, title: impl Into<String>) -> Self {
        Self {
            user_id,
            title: title.into(),
            description: None,
            free_prompt: None,
            questions: Vec::new(),
            answers: Answers::new(),
            card_id: None,
        }
    }

    /// Sets the current description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the free-text instructions.
    pub fn with_free_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.free_prompt = Some(prompt.into());
        self
    }

    /// Sets the card reference.
    pub fn with_card(mut self, card_id: CardId) -> Self {
        self.card_id = Some(card_id);
        self
    }

    /// Records an answer for the question at `index`, remembering its text.
    pub fn with_answer(
        mut self,
        index: usize,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        if self.questions.len() <= index {
            self.questions.resize(index + 1, String::new());
        }
        self.questions[index] = question.into();
        self.answers.insert(index, answer.into());
        self
    }

    /// Checks the request invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] if the title is blank.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.title.trim().is_empty() {
            return Err(PipelineError::Validation);
        }
        Ok(())
    }

    /// Trimmed title.
    pub fn title(&self) -> &str {
        self.title.trim()
    }

    /// Trimmed description, empty when absent.
    pub fn description(&self) -> &str {
        self.description.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Trimmed free-text instructions, empty when absent.
    pub fn free_prompt(&self) -> &str {
        self.free_prompt.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Question/answer pairs in index order.
    ///
    /// Blank answers are omitted. A question whose text was not supplied is
    /// labelled by its one-based position.
    pub fn answered_questions(&self) -> Vec<(String, String)> {
        self.answers
            .iter()
            .filter(|(_, answer)| !answer.trim().is_empty())
            .map(|(&index, answer)| {
                let question = self
                    .questions
                    .get(index)
                    .map(|q| q.trim())
                    .filter(|q| !q.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Question {}", index + 1));
                (question, answer.trim().to_string())
            })
            .collect()
    }
}
