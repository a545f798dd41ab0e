use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;

use knm_trainer::app::App;
use knm_trainer::catalog::STUDY_MATERIALS;
use knm_trainer::config::Config;
use knm_trainer::event::AppEvent;
use knm_trainer::generator::{GenerationError, TextService};
use knm_trainer::session::mistakes::{MistakeLog, record_incorrect};
use knm_trainer::session::question::Question;
use knm_trainer::session::{
    Effect, Intent, SessionState, Slice, Status, TEST_FAILED_MESSAGE, TestVariant,
    VIDEO_FAILED_MESSAGE, reduce,
};
use knm_trainer::store::json_store::JsonStore;
use knm_trainer::ui::components::menu::MenuAction;

/// Replays canned answers in order, failing once they run out.
struct FakeService {
    answers: Mutex<Vec<Result<String, GenerationError>>>,
}

impl FakeService {
    fn new(mut answers: Vec<Result<String, GenerationError>>) -> Self {
        answers.reverse();
        Self {
            answers: Mutex::new(answers),
        }
    }
}

impl TextService for FakeService {
    fn complete(
        &self,
        _prompt: &str,
        _json_response: bool,
        _credential: &str,
    ) -> Result<String, GenerationError> {
        self.answers
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(GenerationError::Transport("no more answers".into())))
    }
}

fn question(id: &str, correct: usize) -> Question {
    Question {
        id: id.to_string(),
        question_text: format!("Wat is {id}?"),
        question_text_en: format!("What is {id}?"),
        options: vec!["een".into(), "twee".into(), "drie".into(), "vier".into()],
        options_en: vec!["one".into(), "two".into(), "three".into(), "four".into()],
        correct_option_index: correct,
        explanation: "Omdat.".into(),
        explanation_en: "Because.".into(),
        topic: Some("Werk".into()),
    }
}

/// Service payload for `n` questions, all with option 1 correct.
fn payload(n: usize) -> String {
    let items: Vec<_> = (0..n)
        .map(|i| {
            json!({
                "questionText": format!("Vraag {i}?"),
                "questionTextEn": format!("Question {i}?"),
                "options": ["a", "b", "c"],
                "optionsEn": ["a", "b", "c"],
                "correctOptionIndex": 1,
                "explanation": "Uitleg",
                "explanationEn": "Explanation",
                "topic": "Werk"
            })
        })
        .collect();
    json!({ "questions": items }).to_string()
}

fn make_app(
    dir: &TempDir,
    answers: Vec<Result<String, GenerationError>>,
) -> (App, mpsc::Receiver<AppEvent>) {
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    store.save_credential("test-key");
    let mut app = App::new(
        Config::default(),
        Some(store),
        Arc::new(FakeService::new(answers)),
    );
    let (tx, rx) = mpsc::channel();
    app.connect(tx);
    (app, rx)
}

fn pump(app: &mut App, rx: &mpsc::Receiver<AppEvent>) {
    let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    app.handle_worker_event(event);
}

fn reopen(dir: &TempDir) -> JsonStore {
    JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap()
}

#[test]
fn work_exam_from_menu_to_results() {
    let dir = TempDir::new().unwrap();
    let (mut app, rx) = make_app(&dir, vec![Ok(payload(15))]);

    app.activate_menu(MenuAction::StartTest("work"));
    assert_eq!(app.status(), Status::Loading);
    pump(&mut app, &rx);

    assert_eq!(app.status(), Status::Active);
    assert_eq!(app.session.current_index, 0);
    assert!(app.session.answers.is_empty());
    assert_eq!(app.session.questions.len(), 15);
    assert!(app.session.questions.iter().all(|q| q.id.starts_with("q-")));

    // 14 right, the last one wrong.
    for i in 0..15 {
        app.answer_current(if i == 14 { 0 } else { 1 });
        app.next_question();
    }
    assert_eq!(app.status(), Status::Review);
    assert_eq!(app.session.score(), 14);

    let store = reopen(&dir);
    let history = store.load_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].test_title, "Work & Income");
    assert_eq!((history[0].score, history[0].total), (14, 15));
    assert_eq!(store.load_mistakes().len(), 1);
}

#[test]
fn server_error_returns_to_origin_screen() {
    let dir = TempDir::new().unwrap();
    let (mut app, rx) = make_app(
        &dir,
        vec![Err(GenerationError::Status(500)), Err(GenerationError::Status(500))],
    );

    app.activate_menu(MenuAction::StartTest("work"));
    pump(&mut app, &rx);
    assert_eq!(app.status(), Status::Idle);
    assert_eq!(app.session.error.as_deref(), Some(TEST_FAILED_MESSAGE));
    assert!(app.session.questions.is_empty());
    assert!(app.session.active.is_none());

    app.activate_menu(MenuAction::Study);
    app.start_selected_video();
    assert_eq!(app.status(), Status::Loading);
    pump(&mut app, &rx);
    assert_eq!(app.status(), Status::Study);
    assert_eq!(app.session.error.as_deref(), Some(VIDEO_FAILED_MESSAGE));
    assert!(app.session.questions.is_empty());
}

#[test]
fn malformed_payload_is_a_failure() {
    let dir = TempDir::new().unwrap();
    let (mut app, rx) = make_app(&dir, vec![Ok(r#"{"answer": 42}"#.into())]);
    app.activate_menu(MenuAction::StartTest("health"));
    pump(&mut app, &rx);
    assert_eq!(app.status(), Status::Idle);
    assert!(app.session.error.is_some());
}

#[test]
fn mistake_review_orders_and_decays_records() {
    let dir = TempDir::new().unwrap();
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    let mut log = MistakeLog::new();
    for (id, count) in [("A", 5), ("B", 2), ("C", 5), ("D", 1)] {
        for _ in 0..count {
            record_incorrect(&mut log, &question(id, 0), now);
        }
    }
    reopen(&dir).save_mistakes(&log);

    let (mut app, _rx) = make_app(&dir, vec![]);
    app.activate_menu(MenuAction::MistakeReview);
    assert_eq!(app.status(), Status::Active);
    let order: Vec<&str> = app.session.questions.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(order, vec!["A", "C", "B", "D"]);

    // A right, C wrong, B right, D right.
    for option in [0, 2, 0, 0] {
        app.answer_current(option);
        app.next_question();
    }
    assert_eq!(app.status(), Status::Review);

    let stored = reopen(&dir).load_mistakes();
    assert_eq!(stored["A"].error_count, 4);
    assert_eq!(stored["C"].error_count, 6);
    assert_eq!(stored["B"].error_count, 1);
    assert!(!stored.contains_key("D"));
}

#[test]
fn empty_mistake_log_does_not_start_review() {
    let dir = TempDir::new().unwrap();
    let (mut app, _rx) = make_app(&dir, vec![]);
    app.activate_menu(MenuAction::MistakeReview);
    assert_eq!(app.status(), Status::Idle);
    assert!(app.session.active.is_none());
}

#[test]
fn stale_generation_responses_are_dropped() {
    let now = Utc::now();
    let (state, effects) = reduce(
        SessionState::default(),
        Intent::StartTest {
            test_id: "work".into(),
        },
        now,
    );
    let Some(Effect::Generate { ticket: first, .. }) = effects.first().cloned() else {
        panic!("expected a generate effect");
    };
    let (state, effects) = reduce(
        state,
        Intent::StartTest {
            test_id: "history".into(),
        },
        now,
    );
    let Some(Effect::Generate { ticket: second, .. }) = effects.first().cloned() else {
        panic!("expected a generate effect");
    };
    assert_ne!(first, second);

    let (state, _) = reduce(
        state,
        Intent::GenerationFinished {
            ticket: first,
            outcome: Ok(vec![question("old", 0)]),
        },
        now,
    );
    assert_eq!(state.status, Status::Loading);
    assert!(state.questions.is_empty());

    let (state, _) = reduce(
        state,
        Intent::GenerationFinished {
            ticket: second,
            outcome: Ok(vec![question("new", 0)]),
        },
        now,
    );
    assert_eq!(state.status, Status::Active);
    assert_eq!(state.questions[0].id, "new");
    assert_eq!(state.active, Some(TestVariant::Standard("history".into())));
}

#[test]
fn going_home_cancels_pending_generation() {
    let now = Utc::now();
    let (state, effects) = reduce(
        SessionState::default(),
        Intent::StartTest {
            test_id: "work".into(),
        },
        now,
    );
    let Some(Effect::Generate { ticket, .. }) = effects.first().cloned() else {
        panic!("expected a generate effect");
    };
    let (state, _) = reduce(state, Intent::GoHome, now);
    assert_eq!(state.status, Status::Idle);

    let (state, _) = reduce(
        state,
        Intent::GenerationFinished {
            ticket,
            outcome: Ok(vec![question("late", 0)]),
        },
        now,
    );
    assert_eq!(state.status, Status::Idle);
    assert!(state.questions.is_empty());
}

fn run_video_quest(correct_answers: usize) -> (SessionState, Vec<Effect>) {
    let now = Utc::now();
    let video_id = STUDY_MATERIALS[0].id.to_string();
    let (state, effects) = reduce(
        SessionState::default(),
        Intent::StartVideoQuest {
            video_id: video_id.clone(),
        },
        now,
    );
    let Some(Effect::Generate { ticket, count, .. }) = effects.first().cloned() else {
        panic!("expected a generate effect");
    };
    assert_eq!(count, 5);

    let questions: Vec<Question> = (0..10).map(|i| question(&format!("v{i}"), 0)).collect();
    let (mut state, _) = reduce(
        state,
        Intent::GenerationFinished {
            ticket,
            outcome: Ok(questions.clone()),
        },
        now,
    );
    for (i, q) in questions.iter().enumerate() {
        let option = if i < correct_answers { 0 } else { 1 };
        state = reduce(
            state,
            Intent::Answer {
                question_id: q.id.clone(),
                option,
            },
            now,
        )
        .0;
    }
    reduce(state, Intent::Finish, now)
}

#[test]
fn video_mastery_needs_eighty_percent() {
    let video_id = STUDY_MATERIALS[0].id;

    let (state, effects) = run_video_quest(9);
    assert!(state.is_mastered(video_id));
    assert!(effects.contains(&Effect::Persist(Slice::Mastery)));
    assert_eq!(state.history[0].test_title, format!("Quest: {}", STUDY_MATERIALS[0].title));

    let (state, effects) = run_video_quest(7);
    assert!(!state.is_mastered(video_id));
    assert!(!effects.contains(&Effect::Persist(Slice::Mastery)));
    assert!(effects.contains(&Effect::Persist(Slice::History)));
}

#[test]
fn progress_survives_export_and_import() {
    let dir = TempDir::new().unwrap();
    let (mut app, rx) = make_app(&dir, vec![Ok(payload(3))]);
    app.activate_menu(MenuAction::StartTest("education"));
    pump(&mut app, &rx);
    app.dispatch(Intent::Abort);
    assert_eq!(app.status(), Status::Review);

    let export = reopen(&dir).export_all();
    assert_eq!(export.history.len(), 1);
    assert_eq!(export.mistakes.len(), 3);

    let other = TempDir::new().unwrap();
    let target = reopen(&other);
    target.import_all(&export).unwrap();
    assert_eq!(target.load_history(), export.history);
    assert_eq!(target.load_mistakes(), export.mistakes);
}
