use std::sync::mpsc::{self, Sender};
use std::time::Duration;

use chrono::{Local, TimeZone};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mapty::{
    app::App,
    controller::Controller,
    identity::ManualClock,
    keymap::Focus,
    persistence::WorkoutStore,
    runtime::{AppEvent, FixedTicker, Runner, TestEventSource},
    storage::SqliteStore,
    ui::{form::TerminalForm, list::TerminalList, map::TerminalMap},
    workout::{Coords, WorkoutKind},
};
use tempfile::tempdir;

type HeadlessApp = App<SqliteStore, ManualClock>;

fn open_app(db: &std::path::Path) -> HeadlessApp {
    let controller = Controller::new(
        TerminalMap::default(),
        TerminalForm::new(WorkoutKind::Running),
        TerminalList::default(),
        WorkoutStore::new(SqliteStore::open(db).unwrap()),
        ManualClock::new(Local.with_ymd_and_hms(2024, 9, 7, 7, 15, 0).unwrap()),
        13,
    );
    App::new(controller)
}

fn key(tx: &Sender<AppEvent>, code: KeyCode) {
    tx.send(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
        .unwrap();
}

fn text(tx: &Sender<AppEvent>, s: &str) {
    for c in s.chars() {
        key(tx, KeyCode::Char(c));
    }
}

/// Drive the app until the channel is drained or it quits
fn pump(app: &mut HeadlessApp, runner: &Runner<TestEventSource, FixedTicker>) {
    for _ in 0..500u32 {
        match runner.step() {
            AppEvent::Tick => break,
            event => {
                if !app.handle(event) {
                    break;
                }
            }
        }
    }
}

fn runner() -> (Sender<AppEvent>, Runner<TestEventSource, FixedTicker>) {
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );
    (tx, runner)
}

#[test]
fn headless_session_logs_and_restores_workouts() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("workouts.db");

    // First session: log one run and one ride
    {
        let mut app = open_app(&db);
        let (tx, runner) = runner();
        tx.send(AppEvent::Position(Ok(Coords::new(10.0, 20.0))))
            .unwrap();

        key(&tx, KeyCode::Enter);
        text(&tx, "5");
        key(&tx, KeyCode::Tab);
        text(&tx, "30");
        key(&tx, KeyCode::Tab);
        text(&tx, "180");
        key(&tx, KeyCode::Enter);

        key(&tx, KeyCode::Right);
        key(&tx, KeyCode::Enter);
        key(&tx, KeyCode::BackTab);
        key(&tx, KeyCode::Right);
        key(&tx, KeyCode::Tab);
        text(&tx, "20");
        key(&tx, KeyCode::Tab);
        text(&tx, "60");
        key(&tx, KeyCode::Tab);
        text(&tx, "150");
        key(&tx, KeyCode::Enter);

        pump(&mut app, &runner);

        let workouts = app.controller.workouts();
        assert_eq!(workouts.len(), 2);
        assert_eq!(workouts[0].pace(), Some(6.0));
        assert_eq!(workouts[1].speed(), Some(20.0));
        assert_eq!(app.focus, Focus::Map);
    }

    // Second session: entries are rendered before the map exists
    let mut app = open_app(&db);
    assert_eq!(app.controller.workouts().len(), 2);
    assert_eq!(app.controller.list().entries().len(), 2);
    assert!(app.controller.map().markers().is_empty());

    let (tx, runner) = runner();
    tx.send(AppEvent::Position(Ok(Coords::new(10.0, 20.0))))
        .unwrap();
    pump(&mut app, &runner);

    let kinds: Vec<_> = app
        .controller
        .map()
        .markers()
        .iter()
        .map(|m| m.style_class.as_str())
        .collect();
    assert_eq!(kinds, ["running-popup", "cycling-popup"]);
}

#[test]
fn headless_invalid_submission_writes_nothing() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("workouts.db");

    {
        let mut app = open_app(&db);
        let (tx, runner) = runner();
        tx.send(AppEvent::Position(Ok(Coords::new(0.0, 0.0)))).unwrap();
        key(&tx, KeyCode::Enter);
        text(&tx, "-1");
        key(&tx, KeyCode::Tab);
        text(&tx, "30");
        key(&tx, KeyCode::Tab);
        text(&tx, "180");
        key(&tx, KeyCode::Enter);
        pump(&mut app, &runner);

        assert!(app.controller.workouts().is_empty());
        assert_eq!(app.focus, Focus::Form);
    }

    assert!(open_app(&db).controller.workouts().is_empty());
}

#[test]
fn headless_quit_stops_processing() {
    let dir = tempdir().unwrap();
    let mut app = open_app(&dir.path().join("workouts.db"));
    let (tx, runner) = runner();
    tx.send(AppEvent::Position(Ok(Coords::new(0.0, 0.0)))).unwrap();
    key(&tx, KeyCode::Char('q'));
    key(&tx, KeyCode::Enter);
    pump(&mut app, &runner);

    // the Enter after quitting never opened the form
    assert!(!app.controller.form().is_visible());
}
