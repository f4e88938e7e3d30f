use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};

use globequiz::app::{App, AppScreen, ZOOM_STEP};
use globequiz::config::Config;
use globequiz::event::{AppEvent, EventHandler};
use globequiz::session::quiz::{GameMode, Mark, QUESTION_COUNTS, QuizPhase};
use globequiz::session::training::population_intensity;
use globequiz::ui::components::browser::{BrowserTab, BrowserView};
use globequiz::ui::components::globe::GlobeView;
use globequiz::ui::components::info_panel::InfoPanel;
use globequiz::ui::components::progress_bar::ProgressBar;
use globequiz::ui::components::quiz_panel::QuizSidebar;
use globequiz::ui::components::results::ResultsDashboard;
use globequiz::ui::layout::{self, AppLayout, GlobeScreenLayout, pack_hint_lines};

#[derive(Parser)]
#[command(name = "globequiz", version, about = "Find countries on a spinning terminal globe")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Questions per game (5, 10, 20, 30, 40, 50)")]
    questions: Option<u32>,

    #[arg(short, long, help = "Game mode (names, capitals)")]
    mode: Option<String>,

    #[arg(long, help = "Country outlines: bundled, a GeoJSON path, or an http(s) URL")]
    dataset: Option<String>,

    #[arg(long, help = "Country facts: bundled, a JSON path, or an http(s) URL")]
    enrichment: Option<String>,

    #[arg(long, help = "Don't look up flags and capitals online in training")]
    no_lookup: bool,

    #[arg(long, help = "Write the log here instead of the default location")]
    log_file: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_default();
    if let Some(questions) = cli.questions {
        config.question_count = questions;
    }
    if let Some(mode) = cli.mode {
        match GameMode::parse(&mode) {
            Some(mode) => config.game_mode = mode.as_str().to_string(),
            None => eprintln!("unknown mode {mode}, using {}", config.game_mode),
        }
    }
    if let Some(dataset) = cli.dataset {
        config.dataset = dataset;
    }
    if let Some(enrichment) = cli.enrichment {
        config.enrichment = enrichment;
    }
    if cli.no_lookup {
        config.metadata_lookup = false;
    }
    if let Some(log_file) = cli.log_file {
        config.log_file = log_file;
    }
    config.normalize();

    init_logging(Path::new(&config.log_file));
    log::info!("globequiz {} starting", env!("CARGO_PKG_VERSION"));

    let theme_override = cli.theme;
    let mut app = App::new(config);
    if let Some(theme_name) = theme_override {
        app.set_theme(&theme_name);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        log::error!("exiting on error: {err:?}");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// The terminal belongs to the UI, so the log goes to a file.
fn init_logging(path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        let size = terminal.size()?;
        app.area = Rect::new(0, 0, size.width, size.height);
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }
        app.tick(Instant::now());

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

    match app.screen {
        AppScreen::Menu => handle_menu_key(app, key),
        AppScreen::Quiz => handle_quiz_key(app, key),
        AppScreen::Training => handle_training_key(app, key),
        AppScreen::Results => handle_results_key(app, key),
        AppScreen::Browser => handle_browser_key(app, key),
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('1') => app.start_quiz(),
        KeyCode::Char('t') => app.go_to_training(),
        KeyCode::Char('b') => app.go_to_browser(),
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Left | KeyCode::Char('h') => {
            let action = app.menu.selected_action();
            app.cycle_selector(action, false);
        }
        KeyCode::Right | KeyCode::Char('l') => {
            let action = app.menu.selected_action();
            app.cycle_selector(action, true);
        }
        KeyCode::Enter => {
            let action = app.menu.selected_action();
            app.activate_menu(action);
        }
        _ => {}
    }
}

/// Rotation, zoom and the crosshair click, shared by quiz and training.
fn handle_globe_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => app.rotate_globe(-1.0, 0.0),
        KeyCode::Right | KeyCode::Char('l') => app.rotate_globe(1.0, 0.0),
        KeyCode::Up | KeyCode::Char('k') => app.rotate_globe(0.0, 1.0),
        KeyCode::Down | KeyCode::Char('j') => app.rotate_globe(0.0, -1.0),
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_globe(ZOOM_STEP),
        KeyCode::Char('-') => app.zoom_globe(1.0 / ZOOM_STEP),
        KeyCode::Enter | KeyCode::Char(' ') => app.crosshair_click(Instant::now()),
        _ => return false,
    }
    true
}

fn handle_quiz_key(app: &mut App, key: KeyEvent) {
    if handle_globe_key(app, key) {
        return;
    }
    let failed = app
        .quiz
        .as_ref()
        .is_some_and(|q| matches!(q.phase(), QuizPhase::Failed(_)));
    match key.code {
        KeyCode::Esc => app.go_to_menu(),
        KeyCode::Char('e') => app.end_quiz(Instant::now()),
        KeyCode::Char('r') if failed => app.retry_load(),
        _ => {}
    }
}

fn handle_training_key(app: &mut App, key: KeyEvent) {
    if handle_globe_key(app, key) {
        return;
    }
    match key.code {
        KeyCode::Esc => app.go_to_menu(),
        KeyCode::Char('c') => {
            if let Some(training) = app.training.as_mut() {
                training.clear();
            }
        }
        KeyCode::Char('g') => app.center_on_selected(),
        KeyCode::Char('r') => app.retry_load(),
        _ => {}
    }
}

fn handle_results_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.play_again(),
        KeyCode::Char('m') | KeyCode::Esc => app.go_to_menu(),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

fn handle_browser_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.go_to_menu();
        return;
    }
    if key.code == KeyCode::Char('r') && app.browser.is_none() {
        app.retry_load();
        return;
    }
    let Some(browser) = app.browser.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Char('1') => browser.tab = BrowserTab::Bubbles,
        KeyCode::Char('2') => browser.tab = BrowserTab::Continents,
        KeyCode::Char('3') => browser.tab = BrowserTab::Compare,
        KeyCode::Tab => browser.tab = browser.tab.next(),
        KeyCode::BackTab => browser.tab = browser.tab.prev(),
        _ => match browser.tab {
            BrowserTab::Bubbles => match key.code {
                KeyCode::Right | KeyCode::Down | KeyCode::Char('l') | KeyCode::Char('j') => {
                    browser.bubbles.select_next()
                }
                KeyCode::Left | KeyCode::Up | KeyCode::Char('h') | KeyCode::Char('k') => {
                    browser.bubbles.select_prev()
                }
                KeyCode::Enter => {
                    browser.bubbles.enter_selected();
                }
                KeyCode::Backspace => browser.bubbles.zoom_out(),
                KeyCode::Char('0') => browser.bubbles.reset(),
                _ => {}
            },
            BrowserTab::Continents => match key.code {
                KeyCode::Down | KeyCode::Char('j') => browser.tree.next(),
                KeyCode::Up | KeyCode::Char('k') => browser.tree.prev(),
                KeyCode::Enter | KeyCode::Char(' ') => browser.tree.toggle(),
                KeyCode::Char('e') => browser.tree.set_all(true),
                KeyCode::Char('c') => browser.tree.set_all(false),
                _ => {}
            },
            BrowserTab::Compare => match key.code {
                KeyCode::Down | KeyCode::Char('j') => browser.scroll_compare(true),
                KeyCode::Up | KeyCode::Char('k') => browser.scroll_compare(false),
                _ => {}
            },
        },
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (col, row) = (mouse.column, mouse.row);
    match app.screen {
        AppScreen::Menu => {
            if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
                app.click_menu(col, row);
            }
        }
        AppScreen::Quiz | AppScreen::Training => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => app.begin_drag(col, row),
            MouseEventKind::Drag(MouseButton::Left) => app.drag_to(col, row),
            MouseEventKind::Up(MouseButton::Left) => app.end_drag(col, row, Instant::now()),
            MouseEventKind::Moved => app.hover_cell(col, row),
            MouseEventKind::ScrollUp => app.zoom_globe(ZOOM_STEP),
            MouseEventKind::ScrollDown => app.zoom_globe(1.0 / ZOOM_STEP),
            _ => {}
        },
        AppScreen::Browser => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => app.click_browser(col, row),
            MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => {
                let down = mouse.kind == MouseEventKind::ScrollDown;
                if let Some(browser) = app.browser.as_mut() {
                    match browser.tab {
                        BrowserTab::Compare => browser.scroll_compare(down),
                        BrowserTab::Continents if down => browser.tree.next(),
                        BrowserTab::Continents => browser.tree.prev(),
                        BrowserTab::Bubbles => {}
                    }
                }
            }
            _ => {}
        },
        AppScreen::Results => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Menu => render_menu(frame, app),
        AppScreen::Quiz => render_quiz(frame, app),
        AppScreen::Training => render_training(frame, app),
        AppScreen::Results => render_results(frame, app),
        AppScreen::Browser => render_browser(frame, app),
    }
}

fn header_line(app: &App, title: &str, info: String) -> Paragraph<'static> {
    let colors = &app.theme.colors;
    Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()))
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, hints: &[&str], area: Rect) {
    let lines: Vec<Line> = pack_hint_lines(hints, area.width as usize)
        .into_iter()
        .take(area.height as usize)
        .map(|l| {
            Line::from(Span::styled(
                l,
                Style::default().fg(app.theme.colors.text_muted()),
            ))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn loading_status(app: &App) -> String {
    match app.load_error.as_ref() {
        Some(err) => format!(" | Data unavailable: {err}"),
        None if app.is_loading() => " | Loading countries...".to_string(),
        None => app
            .atlas()
            .map(|a| format!(" | {} countries", a.len()))
            .unwrap_or_default(),
    }
}

fn render_menu(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let app_layout = AppLayout::new(area);

    let info = format!(
        " {} questions | {}{}",
        app.config.question_count,
        app.config.game_mode().label(),
        loading_status(app)
    );
    frame.render_widget(header_line(app, "globequiz", info), app_layout.header);

    frame.render_widget(&app.menu, layout::menu_area(area));

    let count_hint = format!(
        "[h/l] Questions ({})",
        QUESTION_COUNTS
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("/")
    );
    render_footer(
        frame,
        app,
        &[
            "[1] Play",
            "[t] Training",
            "[b] Browser",
            count_hint.as_str(),
            "[Enter] Select",
            "[q] Quit",
        ],
        app_layout.footer,
    );
}

/// A bordered message in place of the globe while the atlas isn't ready.
fn render_globe_placeholder(
    frame: &mut ratatui::Frame,
    app: &App,
    area: Rect,
    text: &str,
    failed: bool,
) {
    let colors = &app.theme.colors;
    let color = if failed { colors.error() } else { colors.text_muted() };
    let block = Block::bordered().border_style(Style::default().fg(colors.border()));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let y = inner.y + inner.height / 2;
    let text_area = Rect::new(inner.x, y.saturating_sub(1), inner.width, 3.min(inner.height));
    frame.render_widget(
        Paragraph::new(text.to_string())
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        text_area,
    );
}

fn render_quiz(frame: &mut ratatui::Frame, app: &App) {
    let Some(quiz) = app.quiz.as_ref() else {
        return;
    };
    let area = frame.area();
    let colors = &app.theme.colors;
    let screen = GlobeScreenLayout::new(area, true);
    let now = Instant::now();

    let info = match quiz.phase() {
        QuizPhase::Loading => " Loading countries...".to_string(),
        QuizPhase::Failed(_) => " Could not load the map".to_string(),
        QuizPhase::Playing | QuizPhase::Terminal => {
            let ask = format!(" {}", quiz.question().unwrap_or_default());
            if screen.tier.show_sidebar() {
                ask
            } else {
                format!(
                    "{ask} | {}/{} | Misses: {}",
                    quiz.countries_found(),
                    quiz.question_count(),
                    quiz.incorrect_attempts()
                )
            }
        }
    };
    frame.render_widget(header_line(app, "Quiz", info), screen.header);

    match quiz.phase() {
        QuizPhase::Loading => {
            render_globe_placeholder(frame, app, screen.globe, "Loading countries...", false)
        }
        QuizPhase::Failed(reason) => render_globe_placeholder(
            frame,
            app,
            screen.globe,
            &format!("Could not load the map: {reason}\n[r] Retry  [Esc] Menu"),
            true,
        ),
        QuizPhase::Playing | QuizPhase::Terminal => {
            let atlas = app.atlas().map(|a| a.as_ref());
            let title = if quiz.is_advancing() { "Correct!" } else { "Click the country" };
            let globe = GlobeView::new(atlas, &app.globe, app.theme)
                .title(title)
                .hovered(app.hover)
                .paint(move |idx, hovered| match quiz.mark(idx) {
                    Some(Mark::Found) => colors.success(),
                    Some(Mark::Missed) => colors.error(),
                    None if hovered => colors.land_hover(),
                    None => colors.land(),
                });
            frame.render_widget(globe, screen.globe);
        }
    }

    if let Some(progress) = screen.progress {
        frame.render_widget(
            ProgressBar::new(
                "Found",
                quiz.countries_found(),
                quiz.question_count(),
                app.theme,
            ),
            progress,
        );
    }

    if let Some(panel) = screen.panel {
        frame.render_widget(
            QuizSidebar::new(quiz, app.last_result.as_ref(), now, app.theme),
            panel,
        );
    }

    render_footer(
        frame,
        app,
        &[
            "[click/Enter] Pick",
            "[drag/arrows] Rotate",
            "[scroll/+/-] Zoom",
            "[e] End game",
            "[Esc] Menu",
        ],
        screen.footer,
    );
}

fn render_training(frame: &mut ratatui::Frame, app: &App) {
    let Some(training) = app.training.as_ref() else {
        return;
    };
    let area = frame.area();
    let colors = &app.theme.colors;
    let screen = GlobeScreenLayout::new(area, false);
    let atlas = app.atlas().map(|a| a.as_ref());

    let selected = atlas.and_then(|a| training.selected_country(a));
    let info = match selected {
        Some(country) => format!(" {}", country.name),
        None => " Click a country to learn about it".to_string(),
    };
    frame.render_widget(header_line(app, "Training", info), screen.header);

    match atlas {
        Some(atlas) => {
            let max_population = atlas.max_population();
            let selected_idx = training.selected();
            let globe = GlobeView::new(Some(atlas), &app.globe, app.theme)
                .title("Training")
                .hovered(app.hover)
                .paint(move |idx, hovered| {
                    if Some(idx) == selected_idx {
                        return colors.land_selected();
                    }
                    if hovered {
                        return colors.land_hover();
                    }
                    let population = atlas.get(idx).and_then(|c| c.facts.population);
                    match population_intensity(population, max_population) {
                        Some(t) => colors.population_color(t),
                        None => colors.land(),
                    }
                });
            frame.render_widget(globe, screen.globe);
        }
        None => {
            let text = match app.load_error.as_ref() {
                Some(err) => format!("Could not load the map: {err}\n[r] Retry  [Esc] Menu"),
                None => "Loading countries...".to_string(),
            };
            render_globe_placeholder(frame, app, screen.globe, &text, app.load_error.is_some());
        }
    }

    if let Some(panel) = screen.panel {
        let capital = atlas.and_then(|a| training.capital(a));
        frame.render_widget(
            InfoPanel::new(selected, app.theme)
                .capital(capital)
                .metadata(training.metadata(), training.lookup_pending()),
            panel,
        );
    }

    render_footer(
        frame,
        app,
        &[
            "[click/Enter] Select",
            "[drag/arrows] Rotate",
            "[scroll/+/-] Zoom",
            "[g] Go to selection",
            "[c] Clear",
            "[Esc] Menu",
        ],
        screen.footer,
    );
}

fn render_results(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let centered = layout::centered_rect(90, 90, area);
    frame.render_widget(
        ResultsDashboard::new(app.last_result.as_ref(), app.theme),
        centered,
    );
}

fn render_browser(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    match (app.browser.as_ref(), app.atlas()) {
        (Some(browser), Some(atlas)) => {
            frame.render_widget(BrowserView::new(browser, atlas, app.theme), area);
        }
        _ => {
            let text = match app.load_error.as_ref() {
                Some(err) => format!("Could not load countries: {err}\n[r] Retry  [Esc] Menu"),
                None => "Loading countries...\n[Esc] Menu".to_string(),
            };
            render_globe_placeholder(frame, app, area, &text, app.load_error.is_some());
        }
    }
}
