//! Exam session state and the reducer that drives it.
//!
//! All mutation goes through [`reduce`], which consumes the previous state and
//! returns the next one together with the side effects the shell must run
//! (network generation, persistence). Nothing here touches I/O.

pub mod mistakes;
pub mod question;
pub mod result;
pub mod stats;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::catalog::{self, VIDEO_QUEST_QUESTION_COUNT};
use crate::generator::GenerationError;
use mistakes::MistakeLog;
use question::Question;
use result::ExamResult;

/// Percentage a video quest needs before the video counts as mastered.
pub const MASTERY_THRESHOLD: f64 = 80.0;

pub const TEST_FAILED_MESSAGE: &str =
    "Failed to generate test. Please check your connection or API key and try again.";
pub const VIDEO_FAILED_MESSAGE: &str = "Failed to generate video quiz. Please try again.";

pub type MasteryMap = IndexMap<String, bool>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Active,
    Review,
    Study,
    Progress,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestVariant {
    Standard(String),
    MistakeReview,
    VideoQuest(String),
}

impl TestVariant {
    /// Display title used for the quiz header and the history entry.
    pub fn title(&self) -> String {
        match self {
            TestVariant::MistakeReview => "Mistake Review".to_string(),
            TestVariant::VideoQuest(id) => match catalog::find_video(id) {
                Some(video) => format!("Quest: {}", video.title),
                None => "Video Quest".to_string(),
            },
            TestVariant::Standard(id) => catalog::find_test(id)
                .map(|t| t.title.to_string())
                .unwrap_or_else(|| "Exam".to_string()),
        }
    }

    pub fn video_id(&self) -> Option<&str> {
        match self {
            TestVariant::VideoQuest(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_mistake_review(&self) -> bool {
        matches!(self, TestVariant::MistakeReview)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub active: Option<TestVariant>,
    pub questions: Vec<Question>,
    pub current_index: usize,
    pub answers: HashMap<String, usize>,
    pub status: Status,
    pub error: Option<String>,
    /// Ticket of the generation request whose answer is still awaited.
    pub pending: Option<u64>,
    pub(crate) next_ticket: u64,
    pub mistake_log: MistakeLog,
    pub history: Vec<ExamResult>,
    pub mastery: MasteryMap,
}

impl SessionState {
    pub fn new(mistake_log: MistakeLog, history: Vec<ExamResult>, mastery: MasteryMap) -> Self {
        Self {
            mistake_log,
            history,
            mastery,
            ..Self::default()
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn answer_for(&self, question_id: &str) -> Option<usize> {
        self.answers.get(question_id).copied()
    }

    pub fn is_mastered(&self, video_id: &str) -> bool {
        self.mastery.get(video_id).copied().unwrap_or(false)
    }

    pub fn score(&self) -> usize {
        result::score(&self.questions, &self.answers)
    }

    pub fn title(&self) -> String {
        self.active
            .as_ref()
            .map(TestVariant::title)
            .unwrap_or_else(|| "Exam".to_string())
    }

    fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.pending = Some(self.next_ticket);
        self.next_ticket
    }

    fn clear_exam(&mut self) {
        self.questions.clear();
        self.answers.clear();
        self.current_index = 0;
    }
}

#[derive(Debug)]
pub enum Intent {
    StartTest { test_id: String },
    StartVideoQuest { video_id: String },
    StartMistakeReview,
    GenerationFinished {
        ticket: u64,
        outcome: Result<Vec<Question>, GenerationError>,
    },
    Answer { question_id: String, option: usize },
    Navigate { index: usize },
    Finish,
    Abort,
    Retry,
    GoHome,
    OpenStudy,
    OpenProgress,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slice {
    Mistakes,
    History,
    Mastery,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Generate {
        ticket: u64,
        topic_context: String,
        count: usize,
    },
    Persist(Slice),
}

/// Apply one intent. Intents that make no sense in the current status leave
/// the state untouched and produce no effects.
pub fn reduce(
    mut state: SessionState,
    intent: Intent,
    now: DateTime<Utc>,
) -> (SessionState, Vec<Effect>) {
    let mut effects = Vec::new();

    match intent {
        Intent::StartTest { test_id } => {
            if let Some(test) = catalog::find_test(&test_id) {
                effects.push(begin_generation(
                    &mut state,
                    TestVariant::Standard(test_id),
                    test.topic_context,
                    test.question_count,
                ));
            }
        }
        Intent::StartVideoQuest { video_id } => {
            if let Some(video) = catalog::find_video(&video_id) {
                effects.push(begin_generation(
                    &mut state,
                    TestVariant::VideoQuest(video_id),
                    video.topic_context,
                    VIDEO_QUEST_QUESTION_COUNT,
                ));
            }
        }
        Intent::GenerationFinished { ticket, outcome } => {
            if state.status != Status::Loading || state.pending != Some(ticket) {
                log::debug!("discarding stale generation response #{ticket}");
                return (state, effects);
            }
            state.pending = None;
            match outcome {
                Ok(questions) => {
                    log::info!("generated {} questions for {}", questions.len(), state.title());
                    state.questions = questions;
                    state.current_index = 0;
                    state.answers.clear();
                    state.status = Status::Active;
                }
                Err(err) => {
                    if err.is_transport() {
                        log::warn!("question service unreachable: {err}");
                    } else {
                        log::warn!("question service sent an unusable answer: {err}");
                    }
                    state.clear_exam();
                    if matches!(state.active, Some(TestVariant::VideoQuest(_))) {
                        state.status = Status::Study;
                        state.error = Some(VIDEO_FAILED_MESSAGE.to_string());
                    } else {
                        state.status = Status::Idle;
                        state.active = None;
                        state.error = Some(TEST_FAILED_MESSAGE.to_string());
                    }
                }
            }
        }
        Intent::StartMistakeReview => {
            if !state.mistake_log.is_empty() {
                state.questions = mistakes::review_selection(&state.mistake_log);
                state.active = Some(TestVariant::MistakeReview);
                state.current_index = 0;
                state.answers.clear();
                state.pending = None;
                state.status = Status::Active;
            }
        }
        Intent::Answer {
            question_id,
            option,
        } => {
            if state.status == Status::Active {
                state.answers.insert(question_id, option);
            }
        }
        Intent::Navigate { index } => {
            if state.status == Status::Active {
                state.current_index = index;
            }
        }
        Intent::Finish | Intent::Abort => {
            if state.status == Status::Active {
                finish(&mut state, now, &mut effects);
            }
        }
        Intent::Retry => {
            if state.status == Status::Review {
                let retry = match state.active.clone() {
                    Some(TestVariant::MistakeReview) => Some(Intent::StartMistakeReview),
                    Some(TestVariant::VideoQuest(video_id)) => {
                        Some(Intent::StartVideoQuest { video_id })
                    }
                    Some(TestVariant::Standard(test_id)) => Some(Intent::StartTest { test_id }),
                    None => None,
                };
                if let Some(intent) = retry {
                    return reduce(state, intent, now);
                }
            }
        }
        Intent::GoHome => {
            state.status = Status::Idle;
            state.active = None;
            state.pending = None;
            state.clear_exam();
        }
        Intent::OpenStudy => {
            if state.status == Status::Idle {
                state.status = Status::Study;
            }
        }
        Intent::OpenProgress => {
            if state.status == Status::Idle {
                state.status = Status::Progress;
            }
        }
    }

    (state, effects)
}

fn begin_generation(
    state: &mut SessionState,
    variant: TestVariant,
    topic_context: &str,
    count: usize,
) -> Effect {
    state.active = Some(variant);
    state.error = None;
    state.clear_exam();
    state.status = Status::Loading;
    let ticket = state.issue_ticket();
    Effect::Generate {
        ticket,
        topic_context: topic_context.to_string(),
        count,
    }
}

fn finish(state: &mut SessionState, now: DateTime<Utc>, effects: &mut Vec<Effect>) {
    let title = state.title();
    let exam = ExamResult::from_exam(&state.questions, &state.answers, &title, now);
    let percentage = exam.percentage();
    log::info!("finished {title}: {}/{}", exam.score, exam.total);
    state.history.push(exam);
    effects.push(Effect::Persist(Slice::History));

    if let Some(video_id) = state.active.as_ref().and_then(TestVariant::video_id)
        && percentage >= MASTERY_THRESHOLD
        && !state.is_mastered(video_id)
    {
        state.mastery.insert(video_id.to_string(), true);
        effects.push(Effect::Persist(Slice::Mastery));
    }

    let reviewing = state
        .active
        .as_ref()
        .is_some_and(TestVariant::is_mistake_review);
    let mut log_changed = false;
    for question in &state.questions {
        if question.is_correct(state.answers.get(&question.id).copied()) {
            if reviewing {
                log_changed |= mistakes::record_review_correct(&mut state.mistake_log, &question.id);
            }
        } else {
            mistakes::record_incorrect(&mut state.mistake_log, question, now);
            log_changed = true;
        }
    }
    if log_changed {
        effects.push(Effect::Persist(Slice::Mistakes));
    }

    state.status = Status::Review;
}
