//! Pipeline orchestrator: sequences availability check, validation,
//! moderation, generation and accounting for every entry point.
//!
//! Per request the state machine is
//! `Received → Moderating → (Rejected | Generating → Logged → Responded)`,
//! with `Errored` reachable from any step after `Received`. The moderation
//! entry is persisted before any generation call and is never rolled back.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pipeline::{
    AuditLogEntry, Creativity, GenerationMode, GenerationRequest, LanguageModel, PipelineError,
    RecordStore, UserId,
};
use tracing::{error, info, info_span, Instrument};

use crate::generator::Sampling;
use crate::response::{GenerateResponse, QuestionsOutcome, UsageStats};
use crate::{ContentGenerator, ModelGateway, ModerationEvaluator, UsageLedger};

/// Tunables for an [`Orchestrator`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Language the model must answer in.
    pub locale: String,
    /// Bound on every model call.
    pub model_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            locale: "English".to_string(),
            model_timeout: ModelGateway::DEFAULT_TIMEOUT,
        }
    }
}

/// Description strategy dispatched after the moderation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Basic,
    Advanced,
}

impl Strategy {
    fn mode(self) -> GenerationMode {
        match self {
            Self::Basic => GenerationMode::Basic,
            Self::Advanced => GenerationMode::Advanced,
        }
    }
}

/// Entry points of the generation pipeline.
///
/// Every error is converted to a [`PipelineError`] here; nothing from the
/// infrastructure escapes to the caller.
#[derive(Debug)]
pub struct Orchestrator {
    gateway: ModelGateway,
    moderation: ModerationEvaluator,
    generator: ContentGenerator,
    ledger: UsageLedger,
}

impl Orchestrator {
    /// Wires the pipeline over a language model and a record store.
    pub fn new(
        model: Arc<dyn LanguageModel>,
        store: Arc<dyn RecordStore>,
        settings: PipelineSettings,
    ) -> Self {
        let gateway = ModelGateway::new(model).with_timeout(settings.model_timeout);
        Self {
            moderation: ModerationEvaluator::new(gateway.clone()),
            generator: ContentGenerator::new(gateway.clone(), settings.locale),
            ledger: UsageLedger::new(store),
            gateway,
        }
    }

    /// Moderates, then improves the description from title and description.
    ///
    /// # Errors
    ///
    /// See [`PipelineError`] for the terminal states.
    pub async fn generate_basic(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerateResponse, PipelineError> {
        traced(GenerationMode::Basic, &request.user_id, async {
            let sampling = self.admit(&request).await?;
            self.describe(Strategy::Basic, &request, sampling).await
        })
        .await
    }

    /// Moderates, then improves the description using the free prompt and
    /// any clarifying answers.
    ///
    /// # Errors
    ///
    /// See [`PipelineError`] for the terminal states.
    pub async fn generate_advanced(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerateResponse, PipelineError> {
        traced(GenerationMode::Advanced, &request.user_id, async {
            let sampling = self.admit(&request).await?;
            self.describe(Strategy::Advanced, &request, sampling).await
        })
        .await
    }

    /// Moderates, then asks the model for clarifying questions.
    ///
    /// Produces no generation log entry and leaves the usage counter alone,
    /// unless the model has no questions: then advanced generation runs
    /// immediately with no answers and is accounted as such.
    ///
    /// # Errors
    ///
    /// See [`PipelineError`] for the terminal states.
    pub async fn questions(
        &self,
        request: GenerationRequest,
    ) -> Result<QuestionsOutcome, PipelineError> {
        traced(GenerationMode::Questions, &request.user_id, async {
            let sampling = self.admit(&request).await?;
            let questions = self
                .generator
                .generate_questions(
                    request.title(),
                    request.description(),
                    request.free_prompt(),
                    sampling,
                )
                .await
                .map_err(PipelineError::from_llm)?;

            if !questions.is_empty() {
                return Ok(QuestionsOutcome::questions(questions));
            }

            info!("no clarifying questions; generating directly");
            let mut unanswered = request.clone();
            unanswered.questions.clear();
            unanswered.answers.clear();
            let response = self
                .describe(Strategy::Advanced, &unanswered, sampling)
                .await?;
            Ok(QuestionsOutcome::Generated(response))
        })
        .await
    }

    /// The user's generation counter.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Storage`] if the store cannot be read.
    pub async fn usage_stats(&self, user_id: &UserId) -> Result<UsageStats, PipelineError> {
        let ai_usage_count = self
            .ledger
            .usage_count(user_id)
            .await
            .map_err(|e| log_failure(e.into()))?;
        Ok(UsageStats { ai_usage_count })
    }

    /// Stores a creativity preference, clamping it into `[0, 100]`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Storage`] if the store cannot be written.
    pub async fn set_creativity(
        &self,
        user_id: &UserId,
        value: i64,
    ) -> Result<Creativity, PipelineError> {
        let creativity = Creativity::clamped(value);
        self.ledger
            .set_creativity(user_id, creativity)
            .await
            .map_err(|e| log_failure(e.into()))?;
        Ok(creativity)
    }

    /// The user's audit entries, newest first.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Storage`] if the store cannot be read.
    pub async fn audit_log(&self, user_id: &UserId) -> Result<Vec<AuditLogEntry>, PipelineError> {
        self.ledger
            .entries_for(user_id)
            .await
            .map_err(|e| log_failure(e.into()))
    }

    /// Received → Moderating: availability, validation, moderation.
    ///
    /// The moderation entry is persisted whatever the verdict. Returns the
    /// sampling parameters for the approved request.
    async fn admit(&self, request: &GenerationRequest) -> Result<Sampling, PipelineError> {
        if !self.gateway.is_configured() {
            info!("language model not configured");
            return Err(PipelineError::ServiceUnavailable);
        }
        request.validate()?;

        let verdict = self
            .moderation
            .evaluate(request.title(), request.description(), request.free_prompt())
            .await;
        self.ledger
            .record_moderation(AuditLogEntry::moderation(request, &verdict))
            .await?;

        if !verdict.approved {
            info!(reason = ?verdict.reason, "content rejected");
            return Err(PipelineError::rejected(verdict.reason));
        }

        let creativity = self.ledger.creativity(&request.user_id).await?;
        Ok(Sampling::for_creativity(creativity))
    }

    /// Generating → Logged: run a description strategy, then log the
    /// generation before incrementing the counter.
    async fn describe(
        &self,
        strategy: Strategy,
        request: &GenerationRequest,
        sampling: Sampling,
    ) -> Result<GenerateResponse, PipelineError> {
        let result = match strategy {
            Strategy::Basic => {
                self.generator
                    .generate_basic(request.title(), request.description(), sampling)
                    .await
            }
            Strategy::Advanced => self.generator.generate_advanced(request, sampling).await,
        }
        .map_err(PipelineError::from_llm)?;

        let entry = AuditLogEntry::generation(request, strategy.mode(), &result);
        let usage_count = self.ledger.record_generation(entry).await?;
        info!(usage_count, "generation recorded");
        Ok(GenerateResponse::new(result, usage_count))
    }
}

/// Runs one entry point inside its span, logging system faults on the way out.
async fn traced<T>(
    mode: GenerationMode,
    user_id: &UserId,
    work: impl Future<Output = Result<T, PipelineError>>,
) -> Result<T, PipelineError> {
    let span = info_span!("pipeline", user_id = %user_id, %mode);
    work.instrument(span).await.map_err(log_failure)
}

/// Logs system faults with full detail; the caller only ever sees
/// [`PipelineError::to_body`].
fn log_failure(err: PipelineError) -> PipelineError {
    match &err {
        PipelineError::Configuration(_)
        | PipelineError::Generation(_)
        | PipelineError::Storage(_) => error!(error = %err, "pipeline request failed"),
        PipelineError::Validation
        | PipelineError::ServiceUnavailable
        | PipelineError::ModerationRejected { .. } => {}
    }
    err
}
