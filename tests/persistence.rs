use genesis_io::SaveStore;
use genesis_lib::app::{App, StopReason};
use genesis_lib::model::config::AppConfig;
use std::path::PathBuf;

fn temp_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("genesis-{label}-{}", uuid::Uuid::new_v4()))
}

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.world.width = 8;
    config.world.height = 8;
    config.world.initial_population = 10;
    config.world.seed = Some(2024);
    config.world.deterministic = true;
    config
}

#[test]
fn test_saved_run_resumes_where_it_stopped() {
    let dir = temp_dir("resume");
    let mut app = App::new(config(), Some(dir.clone()), false).unwrap();
    app.save_interval = 2;
    app.set_tick_budget(5);
    let reason = app.run().unwrap();
    if reason == StopReason::Extinction {
        std::fs::remove_dir_all(&dir).ok();
        return;
    }

    let store = SaveStore::open(&dir).unwrap();
    // Ticks 2 and 4 plus the exit save.
    assert_eq!(store.sequences().unwrap(), vec![1, 2, 3]);

    let resumed = App::new(config(), Some(dir.clone()), true).unwrap();
    assert_eq!(resumed.world.tick, 5);
    assert_eq!(resumed.world.organisms, app.world.organisms);
    assert_eq!(resumed.world.next_id, app.world.next_id);
    for (a, b) in resumed.world.grid.cells.iter().zip(&app.world.grid.cells) {
        assert_eq!(a.stock, b.stock);
    }

    let history = app.history.read_events().unwrap();
    assert!(history.iter().all(|line| line.event.tick <= 5));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_failed_save_is_an_error_and_keeps_the_sequence() {
    let dir = temp_dir("failed-save");
    let mut app = App::new(config(), Some(dir.clone()), false).unwrap();
    app.step().unwrap();

    // A directory squatting on the target path makes the rename fail.
    let blocked = app.store.as_ref().unwrap().path_for(1);
    std::fs::create_dir_all(&blocked).unwrap();
    assert!(app.save_state().is_err());
    assert_eq!(app.store.as_ref().unwrap().next_seq(), 1);

    std::fs::remove_dir_all(&blocked).unwrap();
    let path = app.save_state().unwrap().unwrap();
    assert_eq!(path, app.store.as_ref().unwrap().path_for(1));
    assert_eq!(app.store.as_ref().unwrap().next_seq(), 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_resume_without_save_dir_is_rejected() {
    assert!(App::new(config(), None, true).is_err());
}
