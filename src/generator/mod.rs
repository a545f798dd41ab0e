pub mod client;
pub mod payload;
pub mod prompts;

use thiserror::Error;

use crate::session::mistakes::MistakeLog;
use crate::session::question::Question;

pub const STUDY_PLAN_EMPTY: &str = "Could not generate plan.";
pub const STUDY_PLAN_OFFLINE: &str = "Our AI coach is currently offline. Please try again later.";
pub const DEEP_DIVE_EMPTY: &str = "No info available.";
pub const DEEP_DIVE_OFFLINE: &str = "Context currently unavailable.";

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("service returned HTTP {0}")]
    Status(u16),

    #[error("response contained no text")]
    NoText,

    #[error("malformed question payload: {0}")]
    Format(String),
}

impl GenerationError {
    /// True for failures reaching the service, false for unusable answers.
    pub fn is_transport(&self) -> bool {
        matches!(self, GenerationError::Transport(_) | GenerationError::Status(_))
    }
}

/// A text-generation backend: prompt in, answer text out.
pub trait TextService: Send + Sync {
    fn complete(
        &self,
        prompt: &str,
        json_response: bool,
        credential: &str,
    ) -> Result<String, GenerationError>;
}

/// Ask for `count` questions on a topic and give each a fresh id.
pub fn generate_questions(
    service: &dyn TextService,
    topic_context: &str,
    count: usize,
    credential: &str,
) -> Result<Vec<Question>, GenerationError> {
    let prompt = prompts::questions_prompt(topic_context, count);
    let text = service.complete(&prompt, true, credential)?;
    let mut questions = payload::decode_questions(&text)?;
    for question in &mut questions {
        question.id = format!("q-{}", uuid::Uuid::new_v4());
    }
    Ok(questions)
}

pub fn generate_study_plan(
    service: &dyn TextService,
    mistakes: &MistakeLog,
    credential: &str,
) -> String {
    let prompt = prompts::study_plan_prompt(mistakes);
    free_text(service, &prompt, credential, STUDY_PLAN_EMPTY, STUDY_PLAN_OFFLINE)
}

pub fn generate_deep_dive(
    service: &dyn TextService,
    question: &Question,
    credential: &str,
) -> String {
    let prompt = prompts::deep_dive_prompt(question);
    free_text(service, &prompt, credential, DEEP_DIVE_EMPTY, DEEP_DIVE_OFFLINE)
}

fn free_text(
    service: &dyn TextService,
    prompt: &str,
    credential: &str,
    empty: &str,
    offline: &str,
) -> String {
    match service.complete(prompt, false, credential) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) | Err(GenerationError::NoText) => empty.to_string(),
        Err(err) => {
            log::warn!("free-text generation failed: {err}");
            offline.to_string()
        }
    }
}
