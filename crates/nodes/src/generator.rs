//! Content generator: the basic and advanced description strategies and the
//! clarifying-questions step.

use pipeline::{
    temperature_for, CompletionRequest, Creativity, GenerationRequest, GenerationResult, LlmError,
    QuestionSet, Temperature, Tone,
};
use serde_json::Value;
use tracing::debug;

use crate::parsing::{clean_generated_text, first_balanced, list_item};
use crate::{prompts, ModelGateway};

/// Reply budget for a description (roughly 300 words plus slack).
const DESCRIPTION_MAX_TOKENS: u32 = 600;

/// Reply budget for the question list.
const QUESTIONS_MAX_TOKENS: u32 = 300;

/// Most questions ever returned to the caller.
pub const MAX_QUESTIONS: usize = 5;

/// Sampling parameters derived from a user's creativity preference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    /// Sampling temperature.
    pub temperature: Temperature,
    /// Register requested in the persona instruction.
    pub tone: Tone,
}

impl Sampling {
    /// Derives temperature and tone from a preference.
    pub fn for_creativity(creativity: Creativity) -> Self {
        Self {
            temperature: temperature_for(creativity),
            tone: Tone::for_creativity(creativity),
        }
    }
}

/// Builds prompts for each strategy and calls the model.
#[derive(Debug, Clone)]
pub struct ContentGenerator {
    gateway: ModelGateway,
    locale: String,
}

impl ContentGenerator {
    /// Creates a generator answering in `locale` (e.g. `"English"`).
    pub fn new(gateway: ModelGateway, locale: impl Into<String>) -> Self {
        Self {
            gateway,
            locale: locale.into(),
        }
    }

    /// Improves a description from the title and current description only.
    ///
    /// # Errors
    ///
    /// Any gateway failure, or [`LlmError::MalformedResponse`] if the reply is
    /// empty once cleaned.
    pub async fn generate_basic(
        &self,
        title: &str,
        description: &str,
        sampling: Sampling,
    ) -> Result<GenerationResult, LlmError> {
        let request = CompletionRequest {
            system: prompts::persona(&self.locale, sampling.tone),
            user: prompts::basic_message(title, description),
            temperature: sampling.temperature,
            max_tokens: DESCRIPTION_MAX_TOKENS,
        };
        let reply = self.gateway.complete("generate_basic", request).await?;
        into_result(&reply)
    }

    /// Improves a description using free instructions and clarifying answers.
    ///
    /// # Errors
    ///
    /// As for [`Self::generate_basic`].
    pub async fn generate_advanced(
        &self,
        request: &GenerationRequest,
        sampling: Sampling,
    ) -> Result<GenerationResult, LlmError> {
        let completion = CompletionRequest {
            system: prompts::persona(&self.locale, sampling.tone),
            user: prompts::advanced_message(request),
            temperature: sampling.temperature,
            max_tokens: DESCRIPTION_MAX_TOKENS,
        };
        let reply = self.gateway.complete("generate_advanced", completion).await?;
        into_result(&reply)
    }

    /// Asks the model for clarifying questions. An empty set is a valid answer.
    ///
    /// # Errors
    ///
    /// Any gateway failure.
    pub async fn generate_questions(
        &self,
        title: &str,
        description: &str,
        free_prompt: &str,
        sampling: Sampling,
    ) -> Result<QuestionSet, LlmError> {
        let request = CompletionRequest {
            system: prompts::questions_instruction(&self.locale),
            user: prompts::questions_message(title, description, free_prompt),
            temperature: sampling.temperature,
            max_tokens: QUESTIONS_MAX_TOKENS,
        };
        let reply = self.gateway.complete("generate_questions", request).await?;
        let questions = parse_questions(&reply);
        debug!(count = questions.len(), "clarifying questions parsed");
        Ok(questions)
    }
}

fn into_result(reply: &str) -> Result<GenerationResult, LlmError> {
    let content = clean_generated_text(reply);
    if content.is_empty() {
        return Err(LlmError::MalformedResponse(
            "model returned an empty description".to_string(),
        ));
    }
    Ok(GenerationResult { content })
}

/// Reads questions from a reply. A JSON array wins when one parses: its string
/// items, or the `question` field of object items. Otherwise each list item or
/// line ending in `?` is a question; prose and broken JSON yield nothing.
/// Keeps at most [`MAX_QUESTIONS`].
pub fn parse_questions(reply: &str) -> QuestionSet {
    let parsed = first_balanced(reply, '[', ']')
        .and_then(|array| serde_json::from_str::<Vec<Value>>(array).ok())
        .map(|items| items.into_iter().filter_map(question_text).collect::<Vec<_>>());

    let questions = match parsed {
        Some(list) => list,
        None => reply
            .lines()
            .map(str::trim)
            .filter(|line| !line.starts_with(['[', '{', ']', '}']) && !line.starts_with("```"))
            .filter_map(|line| list_item(line).or_else(|| line.ends_with('?').then_some(line)))
            .map(str::to_string)
            .collect(),
    };

    QuestionSet::new(
        questions
            .into_iter()
            .filter(|q| !q.trim().is_empty())
            .take(MAX_QUESTIONS),
    )
}

fn question_text(item: Value) -> Option<String> {
    match item {
        Value::String(text) => Some(text),
        Value::Object(mut fields) => match fields.remove("question") {
            Some(Value::String(text)) => Some(text),
            _ => None,
        },
        _ => None,
    }
}
