//! Integration test: wiring a runtime from a config file.
//!
//! Loads a config with `volta-data`, builds the cache, the background
//! sweep and the power module from it, and checks each one honours its
//! setting.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use volta_cache::{CacheJanitor, PathCache};
use volta_core::clock::ManualClock;
use volta_core::test_utils::{fixed, line_world, pos, sheet_world};
use volta_data::load_config_or_default;
use volta_network::NetworkTracer;
use volta_power::{Generator, MachineConsumer, PowerEvent, PowerModule};

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "volta_integration_{suffix}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Poll `done` until it holds or two seconds pass.
fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    done()
}

#[test]
fn config_file_sets_burnout_threshold() {
    let dir = make_test_dir("burnout");
    fs::write(dir.join("volta.toml"), "burnout_ticks = 2\ncache_shards = 2\n").unwrap();
    let config = load_config_or_default(&dir, "volta").unwrap();
    assert_eq!(config.burnout_ticks, 2);

    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(PathCache::with_config(&config, clock));
    let mut power = PowerModule::new(NetworkTracer::new(cache), &config);
    power.add_producer(Box::new(Generator::new(pos(0, 0, 0), fixed(5000.0))));
    power.add_consumer(Box::new(MachineConsumer::new(pos(1, 0, 0), fixed(2000.0))));

    let world = line_world(2);
    let first = power.tick(&world, 1, 1);
    assert!(matches!(
        first.as_slice(),
        [PowerEvent::Overcurrent {
            ticks_before_burnout: 1,
            ..
        }]
    ));
    let second = power.tick(&world, 1, 2);
    assert!(matches!(second.as_slice(), [PowerEvent::Burnout { .. }]));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn janitor_expires_unread_paths() {
    let dir = make_test_dir("janitor");
    fs::write(
        dir.join("volta.json"),
        r#"{"cache_ttl_minutes": 1, "cleanup_interval_secs": 1}"#,
    )
    .unwrap();
    let config = load_config_or_default(&dir, "volta").unwrap();
    let _ = fs::remove_dir_all(&dir);

    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(PathCache::with_config(&config, clock.clone()));
    let tracer = NetworkTracer::new(Arc::clone(&cache));

    let world = sheet_world(4, 2);
    tracer.find_path(&world, pos(0, 0, 0), pos(3, 0, 0), 1);
    tracer.find_path(&world, pos(0, 0, 1), pos(3, 0, 0), 1);
    assert_eq!(cache.len(), 2);

    // One path is read again at 50s; at 70s only the other is past the TTL.
    clock.advance(Duration::from_secs(50));
    tracer.find_path(&world, pos(0, 0, 0), pos(3, 0, 0), 1);
    clock.advance(Duration::from_secs(20));

    // The sweep period comes from the config, but the test cannot wait a
    // whole second per sweep, so the janitor runs on a short interval here.
    assert_eq!(config.cleanup_interval(), Duration::from_secs(1));
    let janitor = CacheJanitor::spawn(Arc::clone(&cache), Duration::from_millis(10)).unwrap();

    assert!(wait_until(|| cache.len() == 1));
    assert!(cache.contains(pos(0, 0, 0), pos(3, 0, 0)));
    assert!(!cache.contains(pos(0, 0, 1), pos(3, 0, 0)));
    assert!(wait_until(|| janitor.sweeps() >= 1));
    assert!(janitor.stop());

    // Nothing sweeps after stop.
    clock.advance(Duration::from_secs(600));
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(cache.len(), 1);
}
