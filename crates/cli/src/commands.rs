//! Command-line surface: one subcommand per pipeline entry point.

use clap::{Args, Parser, Subcommand};
use pipeline::{CardId, GenerationRequest, UserId};

/// Improve task descriptions with a moderated language model.
#[derive(Debug, Parser)]
#[command(name = "taskgen", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a description from the title and current description.
    Basic(TaskArgs),
    /// Generate a description using instructions and clarifying answers.
    Advanced(TaskArgs),
    /// Ask for clarifying questions (generates directly if there are none).
    Questions(TaskArgs),
    /// Show how many descriptions a user has generated.
    Usage(UserArgs),
    /// Set a user's creativity preference (0-100, clamped).
    SetCreativity {
        #[command(flatten)]
        user: UserArgs,
        /// Preference value.
        #[arg(long, allow_hyphen_values = true)]
        value: i64,
    },
    /// List a user's moderation and generation audit entries, newest first.
    Logs(UserArgs),
}

#[derive(Debug, Args)]
pub struct UserArgs {
    /// Authenticated user id.
    #[arg(long = "user")]
    pub user_id: String,
}

impl UserArgs {
    pub fn user_id(&self) -> anyhow::Result<UserId> {
        UserId::new(self.user_id.clone()).ok_or_else(|| anyhow::anyhow!("--user must not be blank"))
    }
}

#[derive(Debug, Args)]
pub struct TaskArgs {
    #[command(flatten)]
    pub user: UserArgs,
    /// Task title.
    #[arg(long, default_value = "")]
    pub title: String,
    /// Current task description.
    #[arg(long)]
    pub description: Option<String>,
    /// Free-text instructions.
    #[arg(long = "prompt")]
    pub free_prompt: Option<String>,
    /// Card the description is for.
    #[arg(long = "card")]
    pub card_id: Option<String>,
    /// A clarifying question, in order. Repeat for each question.
    #[arg(long = "question")]
    pub questions: Vec<String>,
    /// An answer as INDEX=TEXT, where INDEX is the zero-based question index.
    #[arg(long = "answer", value_parser = parse_answer)]
    pub answers: Vec<(usize, String)>,
}

impl TaskArgs {
    /// Builds the pipeline request.
    pub fn into_request(self) -> anyhow::Result<GenerationRequest> {
        let mut request = GenerationRequest::new(self.user.user_id()?, self.title);
        request.description = self.description;
        request.free_prompt = self.free_prompt;
        request.card_id = self.card_id.and_then(CardId::new);
        request.questions = self.questions;
        request.answers = self.answers.into_iter().collect();
        Ok(request)
    }
}

fn parse_answer(raw: &str) -> Result<(usize, String), String> {
    let (index, text) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=TEXT, got {raw:?}"))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("answer index must be a number, got {index:?}"))?;
    Ok((index, text.to_string()))
}
