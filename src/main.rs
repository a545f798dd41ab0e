use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use env_logger::Env;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};

use knm_trainer::app::App;
use knm_trainer::catalog::STUDY_MATERIALS;
use knm_trainer::config::Config;
use knm_trainer::event::{AppEvent, EventHandler};
use knm_trainer::generator::client::GeminiClient;
use knm_trainer::session::stats;
use knm_trainer::session::{Intent, Status};
use knm_trainer::store::json_store::JsonStore;
use knm_trainer::store::schema::ExportData;
use knm_trainer::ui::components::credential::CredentialPrompt;
use knm_trainer::ui::components::progress::ProgressDashboard;
use knm_trainer::ui::components::quiz::QuizView;
use knm_trainer::ui::components::results::ResultsView;
use knm_trainer::ui::components::study::StudyList;
use knm_trainer::ui::layout::{AppLayout, centered_rect, pack_hint_lines};
use knm_trainer::ui::line_input::InputResult;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Parser)]
#[command(
    name = "knm-trainer",
    version,
    about = "Practice the Dutch KNM civic integration exam in your terminal"
)]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Gemini model used for generation")]
    model: Option<String>,

    #[arg(long, help = "Store this Gemini API key and skip the key prompt")]
    api_key: Option<String>,

    #[arg(long, help = "Directory holding progress files")]
    data_dir: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Write all progress to a JSON file and exit")]
    export: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Replace all progress with a JSON export and exit")]
    import: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let store = match cli.data_dir {
        Some(ref dir) => JsonStore::with_base_dir(dir.clone())?,
        None => JsonStore::new()?,
    };
    init_logging(store.base_dir());

    if let Some(ref path) = cli.export {
        return export_progress(&store, path);
    }
    if let Some(ref path) = cli.import {
        return import_progress(&store, path);
    }

    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("ignoring unreadable config: {e:#}");
        Config::default()
    });
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    config.normalize();
    if let Some(ref key) = cli.api_key {
        store.save_credential(key);
    }

    let client = GeminiClient::from_config(&config).context("building the Gemini client")?;
    log::info!("generating with {}", client.endpoint());
    let mut app = App::new(config, Some(store), Arc::new(client));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));
    app.connect(events.sender());

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(e) = app.config.save() {
        log::warn!("failed to save config: {e:#}");
    }
    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// Log to a file next to the progress data; the terminal belongs to the UI.
fn init_logging(data_dir: &Path) {
    let path = data_dir.join("knm-trainer.log");
    let file = match fs::OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(_) => return,
    };
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

fn export_progress(store: &JsonStore, path: &Path) -> Result<()> {
    let data = store.export_all();
    let json = serde_json::to_string_pretty(&data)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    println!(
        "Exported {} mistakes and {} exams to {}",
        data.mistakes.len(),
        data.history.len(),
        path.display()
    );
    Ok(())
}

fn import_progress(store: &JsonStore, path: &Path) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let data: ExportData = serde_json::from_str(&content).context("parsing export file")?;
    store.import_all(&data)?;
    println!(
        "Imported {} mistakes and {} exams from {}",
        data.mistakes.len(),
        data.history.len(),
        path.display()
    );
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.tick = app.tick.wrapping_add(1),
            AppEvent::Resize(_, _) => {}
            AppEvent::Paste(text) => {
                if app.credential.is_none() {
                    app.credential_input.insert_str(&text);
                }
            }
            worker => app.handle_worker_event(worker),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    if app.credential.is_none() {
        handle_credential_key(app, key);
        return;
    }

    match app.status() {
        Status::Idle => handle_menu_key(app, key),
        Status::Loading => handle_loading_key(app, key),
        Status::Active => handle_quiz_key(app, key),
        Status::Review => handle_review_key(app, key),
        Status::Study => handle_study_key(app, key),
        Status::Progress => handle_progress_key(app, key),
    }
}

fn handle_credential_key(app: &mut App, key: KeyEvent) {
    match app.credential_input.handle(key) {
        InputResult::Submit => {
            app.submit_credential();
        }
        InputResult::Cancel => app.should_quit = true,
        InputResult::Continue => {}
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter => {
            if let Some(action) = app.menu.selected_action() {
                app.activate_menu(action);
            }
        }
        KeyCode::Char('t') => app.toggle_english(),
        KeyCode::Char('c') => app.cycle_theme(),
        KeyCode::Char(ch) => {
            if let Some(action) = app.menu.action_for_key(ch) {
                app.activate_menu(action);
            }
        }
        _ => {}
    }
}

fn handle_loading_key(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
        app.dispatch(Intent::GoHome);
    }
}

fn handle_quiz_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char(ch @ '1'..='4') => app.answer_current(ch as usize - '1' as usize),
        KeyCode::Char(ch @ 'a'..='d') => app.answer_current(ch as usize - 'a' as usize),
        KeyCode::Enter => app.next_question(),
        KeyCode::Right | KeyCode::Char('l') => {
            if app.session.current_index + 1 < app.session.questions.len() {
                app.next_question();
            }
        }
        KeyCode::Left | KeyCode::Char('h') => app.prev_question(),
        KeyCode::Char('t') => app.toggle_english(),
        KeyCode::Char('f') => app.dispatch(Intent::Finish),
        KeyCode::Esc => app.dispatch(Intent::Abort),
        _ => {}
    }
}

fn handle_review_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => app.review_move(true),
        KeyCode::Up | KeyCode::Char('k') => app.review_move(false),
        KeyCode::Enter | KeyCode::Char(' ') => app.review_toggle_expand(),
        KeyCode::Char('a') => app.review_toggle_expand_all(),
        KeyCode::Char('f') => app.review_toggle_filter(),
        KeyCode::Char('d') => app.review_deep_dive(),
        KeyCode::Char('t') => app.toggle_english(),
        KeyCode::Char('r') => app.dispatch(Intent::Retry),
        KeyCode::Esc | KeyCode::Char('q') => app.dispatch(Intent::GoHome),
        _ => {}
    }
}

fn handle_study_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => {
            app.study_selected = (app.study_selected + 1).min(STUDY_MATERIALS.len() - 1);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.study_selected = app.study_selected.saturating_sub(1);
        }
        KeyCode::Enter => app.start_selected_video(),
        KeyCode::Esc | KeyCode::Char('q') => app.dispatch(Intent::GoHome),
        _ => {}
    }
}

fn handle_progress_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('g') => app.request_study_plan(),
        KeyCode::Down | KeyCode::Char('j') => {
            let max = app.session.history.len().saturating_sub(1);
            app.history_scroll = (app.history_scroll + 1).min(max);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.history_scroll = app.history_scroll.saturating_sub(1);
        }
        KeyCode::Esc | KeyCode::Char('q') => app.dispatch(Intent::GoHome),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    if app.credential.is_none() {
        let popup = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup);
        frame.render_widget(CredentialPrompt::new(&app.credential_input, app.theme), popup);
        return;
    }

    let hints = footer_hints(app);
    let packed = pack_hint_lines(&hints, area.width as usize);
    let layout = AppLayout::new(area, packed.len() as u16);

    render_header(frame, app, layout.header);

    match app.status() {
        Status::Idle => render_menu(frame, app, layout.main),
        Status::Loading => render_loading(frame, app, layout.main),
        Status::Active => {
            frame.render_widget(QuizView::new(&app.session, app.show_english, app.theme), layout.main);
        }
        Status::Review => {
            let questions = app.review_questions();
            frame.render_widget(
                ResultsView::new(
                    &app.session,
                    &questions,
                    &app.review,
                    &app.deep_dives,
                    app.show_english,
                    app.theme,
                ),
                layout.main,
            );
        }
        Status::Study => {
            let main = render_error(frame, app, layout.main);
            frame.render_widget(
                StudyList::new(STUDY_MATERIALS, &app.session.mastery, app.study_selected, app.theme),
                main,
            );
        }
        Status::Progress => {
            frame.render_widget(
                ProgressDashboard::new(&app.session.history, &app.session.mistake_log, app.theme)
                    .study_plan(app.study_plan.as_deref(), app.study_plan_loading)
                    .scroll(app.history_scroll)
                    .tier(layout.tier),
                layout.main,
            );
        }
    }

    let footer_lines: Vec<Line> = packed
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.muted()))))
        .collect();
    frame.render_widget(Paragraph::new(footer_lines), layout.footer);
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let session = &app.session;

    let info = match session.status {
        Status::Active | Status::Review | Status::Loading => format!(" {}", session.title()),
        _ => format!(
            " {} exams | avg {}% | {} mistakes to review",
            session.history.len(),
            stats::rounded_average(&session.history),
            stats::mistake_count(&session.mistake_log)
        ),
    };
    let language = if app.show_english { " EN " } else { " NL " };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " KNM Trainer ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default().fg(colors.header_fg()).bg(colors.header_bg()),
        ),
        Span::styled(
            format!(" |{language}"),
            Style::default().fg(colors.accent()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

/// Draw the last failure message, if any, and return the area left below it.
fn render_error(frame: &mut ratatui::Frame, app: &App, area: Rect) -> Rect {
    let Some(ref error) = app.session.error else {
        return area;
    };
    let colors = &app.theme.colors;
    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);
    let banner = Paragraph::new(Span::styled(
        error.as_str(),
        Style::default().fg(colors.error()),
    ))
    .block(Block::bordered().border_style(Style::default().fg(colors.error())))
    .wrap(Wrap { trim: true });
    frame.render_widget(banner, split[0]);
    split[1]
}

fn render_menu(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let main = render_error(frame, app, area);
    let menu_area = centered_rect(50, 90, main);
    frame.render_widget(&app.menu, menu_area);
}

fn render_loading(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let spinner = SPINNER[app.tick % SPINNER.len()];
    let popup = centered_rect(40, 30, area);
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{spinner} Generating questions"),
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            app.session.title(),
            Style::default().fg(colors.fg()),
        )),
        Line::from(Span::styled(
            "This can take up to a minute.",
            Style::default().fg(colors.muted()),
        )),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::bordered().border_style(Style::default().fg(colors.border_focused()))),
        popup,
    );
}

fn footer_hints(app: &App) -> Vec<&'static str> {
    match app.status() {
        Status::Idle => vec![
            "[1-8] Exam",
            "[m] Mistakes",
            "[v] Videos",
            "[p] Progress",
            "[j/k] Move",
            "[Enter] Select",
            "[t] NL/EN",
            "[c] Theme",
            "[x] Reset key",
            "[q] Quit",
        ],
        Status::Loading => vec!["[Esc] Cancel"],
        Status::Active => vec![
            "[1-4/a-d] Answer",
            "[h/l] Prev/Next",
            "[Enter] Next",
            "[f] Finish",
            "[t] NL/EN",
            "[Esc] End exam",
        ],
        Status::Review => vec![
            "[j/k] Move",
            "[Enter] Expand",
            "[a] Expand all",
            "[f] Wrong only",
            "[d] Deep dive",
            "[t] NL/EN",
            "[r] Retry",
            "[q] Home",
        ],
        Status::Study => vec!["[j/k] Move", "[Enter] Start quest", "[q] Home"],
        Status::Progress => vec!["[g] Study plan", "[j/k] Scroll history", "[q] Home"],
    }
}
