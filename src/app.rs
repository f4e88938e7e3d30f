use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use crate::config::Config;
use crate::geo::dataset::{Atlas, AtlasLoader, DatasetSource};
use crate::geo::lookup::MetadataLookup;
use crate::geo::projection::{Globe, Viewport};
use crate::session::quiz::{ClickOutcome, QuizParams, QuizPhase, QuizSession};
use crate::session::result::QuizResult;
use crate::session::training::TrainingSession;
use crate::ui::components::browser::{Browser, BrowserLayout, BrowserTab};
use crate::ui::components::menu::{Menu, MenuAction};
use crate::ui::layout::{self, GlobeScreenLayout};
use crate::ui::theme::Theme;

/// Degrees per arrow-key press at scale 1.
const ROTATE_STEP: f64 = 10.0;
pub const ZOOM_STEP: f64 = 1.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Menu,
    Quiz,
    Training,
    Results,
    Browser,
}

#[derive(Clone, Copy, Debug)]
struct Drag {
    last: (u16, u16),
    moved: bool,
}

pub struct App {
    pub screen: AppScreen,
    pub menu: Menu<'static>,
    pub theme: &'static Theme,
    pub config: Config,
    pub should_quit: bool,
    /// Terminal size as of the last draw; mouse hit tests use it.
    pub area: Rect,
    pub quiz: Option<QuizSession>,
    pub training: Option<TrainingSession>,
    pub browser: Option<Browser>,
    pub last_result: Option<QuizResult>,
    pub globe: Globe,
    pub hover: Option<usize>,
    pub load_error: Option<String>,
    atlas: Option<Arc<Atlas>>,
    loader: Option<AtlasLoader>,
    lookup: MetadataLookup,
    last_params: QuizParams,
    drag: Option<Drag>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
        let mut menu = Menu::new(theme);
        menu.question_count = config.question_count;
        menu.mode = config.game_mode();

        let last_params = QuizParams {
            mode: config.game_mode(),
            question_count: config.question_count,
        };

        let mut app = Self {
            screen: AppScreen::Menu,
            menu,
            theme,
            config,
            should_quit: false,
            area: Rect::new(0, 0, 120, 40),
            quiz: None,
            training: None,
            browser: None,
            last_result: None,
            globe: Globe::default(),
            hover: None,
            load_error: None,
            atlas: None,
            loader: None,
            lookup: MetadataLookup::default(),
            last_params,
            drag: None,
        };
        app.spawn_loader();
        app
    }

    pub fn set_theme(&mut self, name: &str) {
        match Theme::load(name) {
            Some(theme) => {
                let theme: &'static Theme = Box::leak(Box::new(theme));
                self.theme = theme;
                self.menu.theme = theme;
                self.config.theme = name.to_string();
            }
            None => log::warn!("unknown theme {name}, keeping {}", self.theme.name),
        }
    }

    pub fn atlas(&self) -> Option<&Arc<Atlas>> {
        self.atlas.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_some()
    }

    fn spawn_loader(&mut self) {
        let geometry = DatasetSource::parse(&self.config.dataset);
        let enrichment = DatasetSource::parse(&self.config.enrichment);
        log::info!("loading atlas from {geometry} with facts from {enrichment}");
        self.load_error = None;
        self.loader = Some(AtlasLoader::spawn(geometry, enrichment));
    }

    /// Starts another load after a failure. No-op while loaded or loading.
    pub fn retry_load(&mut self) {
        if self.atlas.is_some() || self.loader.is_some() {
            return;
        }
        self.spawn_loader();
        if let Some(quiz) = self.quiz.as_mut() {
            quiz.retry();
        }
    }

    pub fn poll_loader(&mut self, now: Instant) {
        let Some(result) = self.loader.as_ref().and_then(AtlasLoader::poll) else {
            return;
        };
        self.loader = None;
        match result {
            Ok(atlas) => {
                log::info!("atlas ready with {} countries", atlas.len());
                if let Some(quiz) = self.quiz.as_mut() {
                    quiz.atlas_loaded(Arc::clone(&atlas), now);
                }
                if self.screen == AppScreen::Browser && self.browser.is_none() {
                    self.browser = Some(Browser::new(&atlas));
                }
                self.atlas = Some(atlas);
            }
            Err(e) => {
                log::error!("atlas load failed: {e}");
                let reason = e.to_string();
                if let Some(quiz) = self.quiz.as_mut() {
                    quiz.atlas_failed(reason.clone());
                }
                self.load_error = Some(reason);
            }
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.poll_loader(now);

        while let Some(reply) = self.lookup.try_next() {
            if let (Some(training), Some(atlas)) = (self.training.as_mut(), self.atlas.as_ref()) {
                training.apply_lookup(reply, atlas);
            }
        }

        if let Some(quiz) = self.quiz.as_mut() {
            if quiz.tick(now) {
                self.hover = None;
            }
        }
        self.finish_quiz_if_done();
    }

    fn lookup_enabled(&self) -> bool {
        self.config.metadata_lookup && cfg!(feature = "network")
    }

    pub fn start_quiz(&mut self) {
        let params = QuizParams {
            mode: self.config.game_mode(),
            question_count: self.config.question_count,
        };
        self.start_quiz_with(params);
    }

    /// Same settings as the last game.
    pub fn play_again(&mut self) {
        self.start_quiz_with(self.last_params);
    }

    fn start_quiz_with(&mut self, params: QuizParams) {
        log::info!(
            "starting quiz: {} questions, {} mode",
            params.question_count,
            params.mode.as_str()
        );
        let delay = Duration::from_millis(self.config.advance_delay_ms);
        let mut quiz = QuizSession::new(params).with_advance_delay(delay);
        if let Some(atlas) = self.atlas.as_ref() {
            quiz.atlas_loaded(Arc::clone(atlas), Instant::now());
        } else if let Some(reason) = self.load_error.as_ref() {
            quiz.atlas_failed(reason.clone());
        }
        self.last_params = params;
        self.quiz = Some(quiz);
        self.training = None;
        self.browser = None;
        self.hover = None;
        self.drag = None;
        self.screen = AppScreen::Quiz;
    }

    /// Ends the running quiz early, with the rounds played so far.
    pub fn end_quiz(&mut self, now: Instant) {
        if let Some(quiz) = self.quiz.as_mut() {
            quiz.end_game(now);
        }
        self.finish_quiz_if_done();
    }

    fn finish_quiz_if_done(&mut self) {
        let Some(quiz) = self.quiz.as_mut() else {
            return;
        };
        if *quiz.phase() != QuizPhase::Terminal {
            return;
        }
        if let Some(result) = quiz.take_result() {
            self.last_result = Some(result);
        }
        self.quiz = None;
        self.hover = None;
        self.screen = AppScreen::Results;
    }

    pub fn go_to_menu(&mut self) {
        self.screen = AppScreen::Menu;
        self.quiz = None;
        self.training = None;
        self.browser = None;
        self.hover = None;
        self.drag = None;
    }

    pub fn go_to_training(&mut self) {
        self.quiz = None;
        self.browser = None;
        self.training = Some(TrainingSession::new());
        self.hover = None;
        self.drag = None;
        self.screen = AppScreen::Training;
    }

    pub fn go_to_browser(&mut self) {
        self.quiz = None;
        self.training = None;
        self.browser = self.atlas.as_ref().map(|atlas| Browser::new(atlas));
        self.screen = AppScreen::Browser;
    }

    pub fn activate_menu(&mut self, action: MenuAction) {
        match action {
            MenuAction::Play => self.start_quiz(),
            MenuAction::Training => self.go_to_training(),
            MenuAction::Browser => self.go_to_browser(),
            MenuAction::QuestionCount | MenuAction::GameMode => self.cycle_selector(action, true),
            MenuAction::Quit => self.should_quit = true,
        }
    }

    pub fn cycle_selector(&mut self, action: MenuAction, forward: bool) {
        match action {
            MenuAction::QuestionCount => self.config.cycle_question_count(forward),
            MenuAction::GameMode => self.config.cycle_game_mode(),
            _ => return,
        }
        self.menu.question_count = self.config.question_count;
        self.menu.mode = self.config.game_mode();
        if let Err(e) = self.config.save() {
            log::warn!("could not save config: {e}");
        }
    }

    fn globe_layout(&self) -> GlobeScreenLayout {
        GlobeScreenLayout::new(self.area, self.screen == AppScreen::Quiz)
    }

    /// The country drawn at a terminal cell of the globe, if any.
    pub fn country_at(&self, col: u16, row: u16) -> Option<usize> {
        let viewport = Viewport::new(self.globe_layout().canvas());
        let (x, y) = viewport.cell_to_canvas(col, row)?;
        let (lon, lat) = self.globe.invert(x, y)?;
        self.atlas.as_ref()?.hit_test(lon, lat)
    }

    fn crosshair_cell(&self) -> (u16, u16) {
        Viewport::new(self.globe_layout().canvas()).center_cell()
    }

    /// A click on a country (atlas index) or on the ocean.
    pub fn click_country(&mut self, country: Option<usize>, now: Instant) {
        match self.screen {
            AppScreen::Quiz => {
                let Some(quiz) = self.quiz.as_mut() else {
                    return;
                };
                match quiz.click(country, now) {
                    ClickOutcome::Hit { finished: true } => self.finish_quiz_if_done(),
                    ClickOutcome::Miss => log::debug!("miss on {country:?}"),
                    _ => {}
                }
            }
            AppScreen::Training => {
                let lookup = self.lookup_enabled();
                let (Some(training), Some(atlas)) = (self.training.as_mut(), self.atlas.as_ref())
                else {
                    return;
                };
                if let Some(name) = training.select(country, atlas) {
                    if lookup {
                        self.lookup.request(&name);
                    } else {
                        training.cancel_lookup();
                    }
                }
            }
            _ => {}
        }
    }

    pub fn click_cell(&mut self, col: u16, row: u16, now: Instant) {
        if !Viewport::new(self.globe_layout().canvas()).contains_cell(col, row) {
            return;
        }
        let country = self.country_at(col, row);
        self.click_country(country, now);
    }

    pub fn crosshair_click(&mut self, now: Instant) {
        let (col, row) = self.crosshair_cell();
        self.click_cell(col, row, now);
    }

    pub fn hover_cell(&mut self, col: u16, row: u16) {
        self.hover = self.country_at(col, row);
    }

    fn hover_crosshair(&mut self) {
        let (col, row) = self.crosshair_cell();
        self.hover_cell(col, row);
    }

    /// Turns the globe so the training selection faces the viewer.
    pub fn center_on_selected(&mut self) {
        let centroid = match (self.training.as_ref(), self.atlas.as_ref()) {
            (Some(training), Some(atlas)) => training
                .selected_country(atlas)
                .and_then(|country| country.centroid()),
            _ => None,
        };
        if let Some((lon, lat)) = centroid {
            self.globe.center_on(lon, lat);
            self.hover_crosshair();
        }
    }

    /// Keyboard rotation in units of [`ROTATE_STEP`].
    pub fn rotate_globe(&mut self, dx: f64, dy: f64) {
        let step = ROTATE_STEP / self.globe.scale;
        self.globe.rotate(dx * step, dy * step);
        self.hover_crosshair();
    }

    pub fn zoom_globe(&mut self, factor: f64) {
        self.globe.zoom(factor);
        self.hover_crosshair();
    }

    pub fn begin_drag(&mut self, col: u16, row: u16) {
        self.drag = Some(Drag {
            last: (col, row),
            moved: false,
        });
    }

    pub fn drag_to(&mut self, col: u16, row: u16) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let dx = col as i32 - drag.last.0 as i32;
        let dy = row as i32 - drag.last.1 as i32;
        if dx == 0 && dy == 0 {
            return;
        }
        drag.last = (col, row);
        drag.moved = true;
        self.globe.drag(dx, dy);
    }

    /// Releasing without having moved counts as a click.
    pub fn end_drag(&mut self, col: u16, row: u16, now: Instant) {
        if let Some(drag) = self.drag.take() {
            if !drag.moved {
                self.click_cell(col, row, now);
            }
        }
        self.hover_cell(col, row);
    }

    pub fn click_menu(&mut self, col: u16, row: u16) {
        let area = layout::menu_area(self.area);
        if let Some(idx) = self.menu.item_at(area, col, row) {
            self.menu.selected = idx;
            self.activate_menu(self.menu.selected_action());
        }
    }

    pub fn click_browser(&mut self, col: u16, row: u16) {
        let canvas = BrowserLayout::new(self.area).bubble_canvas();
        if let Some(browser) = self.browser.as_mut() {
            if browser.tab == BrowserTab::Bubbles {
                browser.click_bubbles(canvas, col, row);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            metadata_lookup: false,
            advance_delay_ms: 0,
            ..Config::default()
        }
    }

    #[test]
    fn test_starts_on_menu_and_loads_in_background() {
        let app = App::new(test_config());
        assert_eq!(app.screen, AppScreen::Menu);
        assert!(app.is_loading());
        assert_eq!(app.menu.question_count, 10);
    }

    #[test]
    fn test_quiz_started_before_atlas_waits_in_loading() {
        let mut app = App::new(test_config());
        app.start_quiz();
        assert_eq!(app.screen, AppScreen::Quiz);
        assert_eq!(*app.quiz.as_ref().unwrap().phase(), QuizPhase::Loading);
    }

    #[test]
    fn test_failed_load_reaches_quiz_and_retry_reloads() {
        let mut app = App::new(Config {
            dataset: "/nonexistent/world.geojson".to_string(),
            ..test_config()
        });
        app.start_quiz();
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.is_loading() && Instant::now() < deadline {
            app.tick(Instant::now());
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(app.load_error.is_some());
        assert!(matches!(app.quiz.as_ref().unwrap().phase(), QuizPhase::Failed(_)));

        app.retry_load();
        assert!(app.is_loading());
        assert_eq!(*app.quiz.as_ref().unwrap().phase(), QuizPhase::Loading);
    }

    #[test]
    fn test_unknown_theme_keeps_current() {
        let mut app = App::new(test_config());
        let before = app.theme.name.clone();
        app.set_theme("no-such-theme");
        assert_eq!(app.theme.name, before);
        assert_eq!(app.config.theme, "terminal-default");
    }

    #[test]
    fn test_drag_without_motion_is_a_click() {
        let mut app = App::new(test_config());
        app.go_to_training();
        let before = app.globe;
        app.begin_drag(10, 10);
        app.drag_to(12, 10);
        assert_ne!(app.globe, before);

        let rotated = app.globe;
        app.begin_drag(10, 10);
        app.end_drag(10, 10, Instant::now());
        assert_eq!(app.globe, rotated);
    }

    #[test]
    fn test_escape_discards_sessions() {
        let mut app = App::new(test_config());
        app.start_quiz();
        app.go_to_menu();
        assert!(app.quiz.is_none());
        assert_eq!(app.screen, AppScreen::Menu);
    }
}
