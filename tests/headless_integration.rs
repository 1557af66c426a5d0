use std::fs;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use image::{Rgba, RgbaImage};
use noita_deathmap::app::{Action, App, Mode};
use noita_deathmap::config::{Config, MapConfig};
use noita_deathmap::runtime::{AppEvent, ChannelEventSource, Runner};
use noita_deathmap::SessionRecord;

// Headless integration using the internal runtime + App without a TTY.
// Keys go through the same Runner the binary uses.

fn press(tx: &mpsc::Sender<AppEvent>, code: KeyCode) {
    tx.send(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
        .unwrap();
}

fn runner() -> (mpsc::Sender<AppEvent>, Runner<ChannelEventSource>) {
    let (tx, events) = ChannelEventSource::pair();
    (tx, Runner::new(events, Duration::from_millis(5)))
}

/// Run until the queue goes quiet or the app quits
fn drive(app: &mut App, runner: &Runner<ChannelEventSource>) -> Vec<Action> {
    let mut actions = Vec::new();
    while let Some(action) = runner.next_action(app) {
        let quit = action == Action::Quit;
        actions.push(action);
        if quit {
            break;
        }
    }
    actions
}

fn app_with_background(out: &std::path::Path) -> App {
    let map = MapConfig {
        width: 4000,
        height: 600,
        ..MapConfig::default()
    };
    let mut app = App::new(Config {
        sessions_dir: None,
        background_image: None,
        output: Some(out.join("deaths.png")),
        map,
    });
    app.view
        .set_background(RgbaImage::from_pixel(4000, 600, Rgba([10, 10, 10, 255])));
    app
}

#[test]
fn headless_pick_flow_loads_sessions() {
    let out = tempfile::tempdir().unwrap();
    let sessions = tempfile::tempdir().unwrap();
    fs::write(
        sessions.path().join("20240101-101010_stats.xml"),
        r#"<Stats><stats death_pos.x="100" death_pos.y="200" /></Stats>"#,
    )
    .unwrap();

    let mut app = app_with_background(out.path());
    let (tx, runner) = runner();

    press(&tx, KeyCode::Char('o'));
    for c in sessions.path().display().to_string().chars() {
        press(&tx, KeyCode::Char(c));
    }
    press(&tx, KeyCode::Enter);
    drive(&mut app, &runner);

    assert_eq!(app.mode, Mode::Browse);
    assert_eq!(
        app.store.sessions(),
        Some(&[SessionRecord::new(100.0, 200.0)][..])
    );
    let png = image::open(out.path().join("deaths.png")).unwrap().to_rgba8();
    assert_eq!(png.dimensions(), (4000, 600));
    assert_eq!(*png.get_pixel(3937, 534), Rgba([255, 255, 255, 255]));
}

#[test]
fn headless_second_pick_replaces_markers() {
    let out = tempfile::tempdir().unwrap();
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    fs::write(
        first.path().join("a_stats.xml"),
        r#"<Stats><stats death_pos.x="100" death_pos.y="200" /></Stats>"#,
    )
    .unwrap();
    fs::write(
        second.path().join("b_stats.xml"),
        r#"<Stats><stats death_pos.x="-3700" death_pos.y="370" /></Stats>"#,
    )
    .unwrap();

    let mut app = app_with_background(out.path());
    app.load_folder(first.path());
    app.load_folder(second.path());

    let png = image::open(out.path().join("deaths.png")).unwrap().to_rgba8();
    // old marker gone, new one at (2910, 580)
    assert_eq!(*png.get_pixel(3937, 534), Rgba([10, 10, 10, 255]));
    assert_eq!(*png.get_pixel(2910, 580), Rgba([255, 255, 255, 255]));
}

#[test]
fn headless_quit_and_viewer_actions() {
    let out = tempfile::tempdir().unwrap();
    let mut app = app_with_background(out.path());
    app.load_folder(out.path());

    let (tx, runner) = runner();
    press(&tx, KeyCode::Char('x'));
    press(&tx, KeyCode::Char('v'));
    press(&tx, KeyCode::Char('q'));
    press(&tx, KeyCode::Char('o'));

    let actions = drive(&mut app, &runner);
    assert_eq!(
        actions,
        vec![
            Action::None,
            Action::OpenViewer(out.path().join("deaths.png")),
            Action::Quit,
        ]
    );
    assert_eq!(app.mode, Mode::Browse);
}
