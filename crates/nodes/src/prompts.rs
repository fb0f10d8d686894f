//! Fixed instructions and message builders for every model call.

use pipeline::{GenerationRequest, Tone};

/// Policy instruction for the moderation gate.
pub const MODERATION_POLICY: &str = r#"You are a content moderator for a personal task manager.
Decide whether the task below may be processed.

Reject the content if it contains any of:
- hate speech or discrimination
- explicit sexual content
- extreme or gratuitous violence
- instructions for or promotion of illegal activities
- harassment, threats or bullying
- spam or meaningless gibberish

Approve anything that is a plausible task, in any language, even if it is short,
informal or oddly phrased.

Answer ONLY with a JSON object, no other text:
{"approved": true}
or
{"approved": false, "reason": "<short explanation for the user>"}"#;

/// Builds the labelled text block the moderation gate classifies.
pub fn moderation_message(title: &str, description: &str, free_prompt: &str) -> String {
    format!("Title: {title}\nDescription: {description}\nInstructions: {free_prompt}")
}

/// Builds the persona instruction shared by both description strategies.
pub fn persona(locale: &str, tone: Tone) -> String {
    format!(
        "You are an assistant that improves task descriptions in a personal task manager.\n\
         Respond only in {locale}.\n\
         Write a concise, actionable description of the task: what to do, the key steps \
         and anything needed to finish it.\n\
         Keep it under 300 words.\n\
         Return only the description itself, with no introduction, title or closing remarks.\n\
         {}",
        tone.instruction()
    )
}

/// User message for the basic strategy.
pub fn basic_message(title: &str, description: &str) -> String {
    let mut message = format!("Task title: {title}");
    if !description.is_empty() {
        message.push_str("\nCurrent description: ");
        message.push_str(description);
    }
    message
}

/// User message for the advanced strategy.
///
/// Only answered questions appear; nothing is invented for the rest.
pub fn advanced_message(request: &GenerationRequest) -> String {
    let mut message = basic_message(request.title(), request.description());

    let free_prompt = request.free_prompt();
    if !free_prompt.is_empty() {
        message.push_str("\nAdditional instructions: ");
        message.push_str(free_prompt);
    }

    let answered = request.answered_questions();
    if !answered.is_empty() {
        message.push_str("\n\nClarifications from the user:");
        for (question, answer) in answered {
            message.push_str(&format!("\n- Q: {question}\n  A: {answer}"));
        }
    }
    message
}

/// Instruction for the clarifying-questions step.
pub fn questions_instruction(locale: &str) -> String {
    format!(
        "You help users write better task descriptions in a personal task manager.\n\
         Respond only in {locale}.\n\
         Ask between 3 and 5 short clarifying questions whose answers would make the \
         task description clearer and more actionable.\n\
         Each question must be independent of the others and answerable in a single phrase.\n\
         If the task is already perfectly clear, return an empty list.\n\
         Answer ONLY with a JSON array of strings, for example:\n\
         [\"What is the deadline?\", \"Who else is involved?\"]"
    )
}

/// User message for the clarifying-questions step.
pub fn questions_message(title: &str, description: &str, free_prompt: &str) -> String {
    let mut message = basic_message(title, description);
    if !free_prompt.is_empty() {
        message.push_str("\nAdditional instructions: ");
        message.push_str(free_prompt);
    }
    message
}
