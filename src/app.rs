use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use chrono::Utc;

use crate::config::Config;
use crate::event::AppEvent;
use crate::generator::{self, GenerationError, TextService};
use crate::session::question::Question;
use crate::session::{self, Effect, Intent, SessionState, Slice, Status};
use crate::store::json_store::JsonStore;
use crate::ui::components::menu::{Menu, MenuAction};
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeepDive {
    Loading,
    Ready(String),
}

/// Screen-local state of the results screen.
#[derive(Default)]
pub struct ReviewView {
    pub selected: usize,
    pub expanded: HashSet<String>,
    pub only_incorrect: bool,
}

pub struct App {
    pub session: SessionState,
    pub config: Config,
    pub theme: &'static Theme,
    pub store: Option<JsonStore>,
    pub credential: Option<String>,
    pub credential_input: LineInput,
    pub menu: Menu<'static>,
    pub show_english: bool,
    pub review: ReviewView,
    pub study_selected: usize,
    pub history_scroll: usize,
    pub study_plan: Option<String>,
    pub study_plan_loading: bool,
    pub deep_dives: HashMap<String, DeepDive>,
    pub tick: usize,
    pub should_quit: bool,
    service: Arc<dyn TextService>,
    events: Option<Sender<AppEvent>>,
}

impl App {
    pub fn new(config: Config, store: Option<JsonStore>, service: Arc<dyn TextService>) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));

        let session = match store {
            Some(ref s) => {
                if s.check_interrupted_import() {
                    log::warn!("cleaned up backups from an interrupted import");
                }
                SessionState::new(s.load_mistakes(), s.load_history(), s.load_mastery())
            }
            None => SessionState::default(),
        };
        let credential = store.as_ref().and_then(JsonStore::load_credential);
        log::info!(
            "loaded {} mistakes, {} exams, {} mastered videos",
            session.mistake_log.len(),
            session.history.len(),
            session.mastery.len()
        );

        Self {
            session,
            show_english: config.show_english,
            config,
            theme,
            store,
            credential,
            credential_input: LineInput::new(""),
            menu: Menu::new(theme),
            review: ReviewView::default(),
            study_selected: 0,
            history_scroll: 0,
            study_plan: None,
            study_plan_loading: false,
            deep_dives: HashMap::new(),
            tick: 0,
            should_quit: false,
            service,
            events: None,
        }
    }

    /// Channel that background generation workers report on.
    pub fn connect(&mut self, events: Sender<AppEvent>) {
        self.events = Some(events);
    }

    pub fn set_theme(&mut self, name: &str) {
        if let Some(theme) = Theme::load(name) {
            let theme: &'static Theme = Box::leak(Box::new(theme));
            self.theme = theme;
            self.menu.theme = theme;
            self.config.theme = name.to_string();
        }
    }

    /// Switch to the next bundled theme in name order.
    pub fn cycle_theme(&mut self) {
        let mut names = Theme::available_themes();
        names.sort();
        let next = names
            .iter()
            .position(|n| *n == self.config.theme)
            .map(|i| (i + 1) % names.len())
            .unwrap_or(0);
        if let Some(name) = names.get(next).cloned() {
            self.set_theme(&name);
        }
    }

    pub fn status(&self) -> Status {
        self.session.status
    }

    /// Run one intent through the reducer and carry out its effects.
    pub fn dispatch(&mut self, intent: Intent) {
        let before = self.session.status;
        let state = std::mem::take(&mut self.session);
        let (next, effects) = session::reduce(state, intent, Utc::now());
        self.session = next;

        if self.session.status != before {
            self.on_enter(self.session.status);
        }
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn on_enter(&mut self, status: Status) {
        match status {
            Status::Review => {
                // Wrong answers start expanded.
                self.review = ReviewView {
                    expanded: self
                        .session
                        .questions
                        .iter()
                        .filter(|q| !q.is_correct(self.session.answer_for(&q.id)))
                        .map(|q| q.id.clone())
                        .collect(),
                    ..ReviewView::default()
                };
            }
            Status::Study => self.study_selected = self.study_selected.min(
                crate::catalog::STUDY_MATERIALS.len().saturating_sub(1),
            ),
            Status::Progress => self.history_scroll = 0,
            Status::Idle => self.deep_dives.clear(),
            Status::Loading | Status::Active => {}
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Generate {
                ticket,
                topic_context,
                count,
            } => self.spawn_generation(ticket, topic_context, count),
            Effect::Persist(slice) => self.persist(slice),
        }
    }

    fn persist(&self, slice: Slice) {
        let Some(ref store) = self.store else {
            return;
        };
        match slice {
            Slice::Mistakes => store.save_mistakes(&self.session.mistake_log),
            Slice::History => store.save_history(&self.session.history),
            Slice::Mastery => store.save_mastery(&self.session.mastery),
        }
    }

    fn spawn_generation(&mut self, ticket: u64, topic_context: String, count: usize) {
        let (Some(tx), Some(credential)) = (self.events.clone(), self.credential.clone()) else {
            self.dispatch(Intent::GenerationFinished {
                ticket,
                outcome: Err(GenerationError::Transport(
                    "no credential or event channel".to_string(),
                )),
            });
            return;
        };
        let service = Arc::clone(&self.service);
        log::debug!("request #{ticket}: {count} questions");
        thread::spawn(move || {
            let outcome =
                generator::generate_questions(service.as_ref(), &topic_context, count, &credential);
            let _ = tx.send(AppEvent::Questions { ticket, outcome });
        });
    }

    /// Apply a result sent back by a worker thread.
    pub fn handle_worker_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Questions { ticket, outcome } => {
                self.dispatch(Intent::GenerationFinished { ticket, outcome });
            }
            AppEvent::StudyPlan(text) => {
                self.study_plan = Some(text);
                self.study_plan_loading = false;
            }
            AppEvent::DeepDive { question_id, text } => {
                if self.deep_dives.contains_key(&question_id) {
                    self.deep_dives.insert(question_id, DeepDive::Ready(text));
                }
            }
            AppEvent::Key(_) | AppEvent::Tick | AppEvent::Resize(..) | AppEvent::Paste(_) => {}
        }
    }

    pub fn request_study_plan(&mut self) {
        if self.study_plan_loading {
            return;
        }
        let (Some(tx), Some(credential)) = (self.events.clone(), self.credential.clone()) else {
            self.study_plan = Some(generator::STUDY_PLAN_OFFLINE.to_string());
            return;
        };
        self.study_plan_loading = true;
        let service = Arc::clone(&self.service);
        let mistakes = self.session.mistake_log.clone();
        thread::spawn(move || {
            let plan = generator::generate_study_plan(service.as_ref(), &mistakes, &credential);
            let _ = tx.send(AppEvent::StudyPlan(plan));
        });
    }

    pub fn request_deep_dive(&mut self, question: &Question) {
        if self.deep_dives.contains_key(&question.id) {
            return;
        }
        let (Some(tx), Some(credential)) = (self.events.clone(), self.credential.clone()) else {
            self.deep_dives.insert(
                question.id.clone(),
                DeepDive::Ready(generator::DEEP_DIVE_OFFLINE.to_string()),
            );
            return;
        };
        self.deep_dives.insert(question.id.clone(), DeepDive::Loading);
        let service = Arc::clone(&self.service);
        let question = question.clone();
        thread::spawn(move || {
            let text = generator::generate_deep_dive(service.as_ref(), &question, &credential);
            let _ = tx.send(AppEvent::DeepDive {
                question_id: question.id,
                text,
            });
        });
    }

    pub fn submit_credential(&mut self) -> bool {
        let key = self.credential_input.value().trim().to_string();
        if key.is_empty() {
            return false;
        }
        if let Some(ref store) = self.store {
            store.save_credential(&key);
        }
        self.credential = Some(key);
        self.credential_input = LineInput::new("");
        true
    }

    pub fn reset_credential(&mut self) {
        if let Some(ref store) = self.store {
            store.clear_credential();
        }
        self.credential = None;
        self.credential_input = LineInput::new("");
        self.dispatch(Intent::GoHome);
    }

    pub fn activate_menu(&mut self, action: MenuAction) {
        match action {
            MenuAction::StartTest(test_id) => self.dispatch(Intent::StartTest {
                test_id: test_id.to_string(),
            }),
            MenuAction::MistakeReview => self.dispatch(Intent::StartMistakeReview),
            MenuAction::Study => self.dispatch(Intent::OpenStudy),
            MenuAction::Progress => {
                self.dispatch(Intent::OpenProgress);
            }
            MenuAction::ResetKey => self.reset_credential(),
            MenuAction::Quit => self.should_quit = true,
        }
    }

    pub fn start_selected_video(&mut self) {
        if let Some(video) = crate::catalog::STUDY_MATERIALS.get(self.study_selected) {
            self.dispatch(Intent::StartVideoQuest {
                video_id: video.id.to_string(),
            });
        }
    }

    pub fn toggle_english(&mut self) {
        self.show_english = !self.show_english;
        self.config.show_english = self.show_english;
    }

    // Quiz navigation. Only valid indices are ever offered to the reducer.

    pub fn answer_current(&mut self, option: usize) {
        let Some(question) = self.session.current_question() else {
            return;
        };
        if option >= question.options.len() {
            return;
        }
        let question_id = question.id.clone();
        self.dispatch(Intent::Answer {
            question_id,
            option,
        });
    }

    pub fn next_question(&mut self) {
        let idx = self.session.current_index;
        if idx + 1 < self.session.questions.len() {
            self.dispatch(Intent::Navigate { index: idx + 1 });
        } else {
            self.dispatch(Intent::Finish);
        }
    }

    pub fn prev_question(&mut self) {
        let idx = self.session.current_index;
        if idx > 0 {
            self.dispatch(Intent::Navigate { index: idx - 1 });
        }
    }

    // Results screen.

    pub fn review_questions(&self) -> Vec<&Question> {
        self.session
            .questions
            .iter()
            .filter(|q| {
                !self.review.only_incorrect || !q.is_correct(self.session.answer_for(&q.id))
            })
            .collect()
    }

    pub fn selected_review_question(&self) -> Option<&Question> {
        self.review_questions().get(self.review.selected).copied()
    }

    pub fn review_move(&mut self, down: bool) {
        let len = self.review_questions().len();
        if len == 0 {
            self.review.selected = 0;
        } else if down {
            self.review.selected = (self.review.selected + 1).min(len - 1);
        } else {
            self.review.selected = self.review.selected.saturating_sub(1);
        }
    }

    pub fn review_toggle_expand(&mut self) {
        let Some(id) = self.selected_review_question().map(|q| q.id.clone()) else {
            return;
        };
        if !self.review.expanded.remove(&id) {
            self.review.expanded.insert(id);
        }
    }

    pub fn review_toggle_expand_all(&mut self) {
        if self.review.expanded.len() == self.session.questions.len() {
            self.review.expanded.clear();
        } else {
            self.review.expanded = self.session.questions.iter().map(|q| q.id.clone()).collect();
        }
    }

    pub fn review_toggle_filter(&mut self) {
        self.review.only_incorrect = !self.review.only_incorrect;
        self.review.selected = 0;
    }

    pub fn review_deep_dive(&mut self) {
        if let Some(question) = self.selected_review_question().cloned() {
            self.review.expanded.insert(question.id.clone());
            self.request_deep_dive(&question);
        }
    }
}
