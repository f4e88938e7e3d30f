use std::time::{Duration, Instant};

use globequiz::app::{App, AppScreen};
use globequiz::config::Config;
use globequiz::session::quiz::{GameMode, QuizPhase};

fn offline_config(question_count: u32) -> Config {
    Config {
        question_count,
        metadata_lookup: false,
        advance_delay_ms: 0,
        ..Config::default()
    }
}

fn wait_for_atlas(app: &mut App) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while app.atlas().is_none() && Instant::now() < deadline {
        app.tick(Instant::now());
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(app.atlas().is_some(), "bundled atlas did not load: {:?}", app.load_error);
}

#[test]
fn test_full_game_reaches_results() {
    let mut app = App::new(offline_config(5));
    wait_for_atlas(&mut app);
    app.start_quiz();
    assert_eq!(*app.quiz.as_ref().unwrap().phase(), QuizPhase::Playing);

    let mut now = Instant::now();
    for round in 0..5 {
        let quiz = app.quiz.as_ref().expect("quiz running");
        let target = quiz.target().expect("target drawn");
        let wrong = (target + 1) % app.atlas().unwrap().len();

        if round == 0 {
            app.click_country(Some(wrong), now);
        }
        now += Duration::from_millis(500);
        app.click_country(Some(target), now);
        now += Duration::from_millis(10);
        app.tick(now);
    }

    assert_eq!(app.screen, AppScreen::Results);
    assert!(app.quiz.is_none());
    let result = app.last_result.as_ref().expect("result stored");
    assert_eq!(result.countries_found, 5);
    assert_eq!(result.question_count, 5);
    assert_eq!(result.total_attempts, 6);
    assert_eq!(result.incorrect_attempts, 1);
    assert_eq!(result.detailed_stats.len(), 5);
    assert_eq!(result.detailed_stats[0].attempts, 2);
    assert_eq!(result.mode, GameMode::Names);
}

#[test]
fn test_ocean_click_is_not_an_attempt() {
    let mut app = App::new(offline_config(5));
    wait_for_atlas(&mut app);
    app.start_quiz();
    app.click_country(None, Instant::now());
    assert_eq!(app.quiz.as_ref().unwrap().total_attempts(), 0);
}

#[test]
fn test_end_game_keeps_partial_result() {
    let mut app = App::new(offline_config(10));
    wait_for_atlas(&mut app);
    app.start_quiz();
    let target = app.quiz.as_ref().unwrap().target().unwrap();
    let now = Instant::now();
    app.click_country(Some(target), now);
    app.end_quiz(now + Duration::from_secs(2));

    assert_eq!(app.screen, AppScreen::Results);
    let result = app.last_result.as_ref().unwrap();
    assert_eq!(result.countries_found, 1);
    assert_eq!(result.question_count, 10);
}

#[test]
fn test_play_again_reuses_last_settings() {
    let mut app = App::new(offline_config(5));
    wait_for_atlas(&mut app);
    app.start_quiz();
    app.end_quiz(Instant::now());
    app.config.question_count = 20;

    app.play_again();
    assert_eq!(app.screen, AppScreen::Quiz);
    assert_eq!(app.quiz.as_ref().unwrap().question_count(), 5);
}

#[test]
fn test_crosshair_selects_country_in_training() {
    let mut app = App::new(offline_config(5));
    wait_for_atlas(&mut app);
    app.go_to_training();

    let brazil = app.atlas().unwrap().index_of("Brazil").expect("Brazil in bundled data");
    app.globe.center_on(-50.0, -10.0);
    app.crosshair_click(Instant::now());

    let training = app.training.as_ref().unwrap();
    assert_eq!(training.selected(), Some(brazil));
    assert!(!training.lookup_pending());
}

#[test]
fn test_go_to_selection_faces_selected_country() {
    let mut app = App::new(offline_config(5));
    wait_for_atlas(&mut app);
    app.go_to_training();
    app.globe.center_on(-50.0, -10.0);
    app.crosshair_click(Instant::now());

    let (lon, lat) = app
        .atlas()
        .unwrap()
        .get(app.training.as_ref().unwrap().selected().unwrap())
        .and_then(|c| c.centroid())
        .unwrap();
    app.rotate_globe(9.0, 3.0);
    app.center_on_selected();

    assert!((app.globe.lon0 - lon).abs() < 1e-9);
    assert!((app.globe.lat0 - lat).abs() < 1e-9);
}

#[test]
fn test_leaving_discards_sessions() {
    let mut app = App::new(offline_config(5));
    wait_for_atlas(&mut app);
    app.go_to_training();
    app.go_to_menu();
    assert!(app.training.is_none());

    app.go_to_browser();
    assert!(app.browser.is_some());
    app.go_to_menu();
    assert!(app.browser.is_none());
    assert_eq!(app.screen, AppScreen::Menu);
}
