use chrono::TimeDelta;
use lapwatch::{FormattingMode, Lap, LapData, Stopwatch};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn laps_follow_real_time() {
    let stopwatch = Stopwatch::new(TimeDelta::zero(), true);

    let a = stopwatch.lap("a");
    thread::sleep(Duration::from_millis(50));
    let b = stopwatch.lap("b");

    assert!(a.duration() < TimeDelta::milliseconds(10), "{:?}", a);
    assert!(b.duration() >= TimeDelta::milliseconds(50), "{:?}", b);
    assert!(b.duration() < TimeDelta::milliseconds(250), "{:?}", b);

    let states: Vec<_> = stopwatch.laps().iter().map(|lap| lap.state().to_string()).collect();
    assert_eq!(states, ["a", "b"]);
}

#[test]
fn lap_time_grows_until_the_next_lap() {
    let stopwatch = Stopwatch::default();

    thread::sleep(Duration::from_millis(20));
    let pending = stopwatch.lap_time();
    assert!(pending >= TimeDelta::milliseconds(20));
    assert!(stopwatch.laps().is_empty());

    stopwatch.lap("first");
    assert!(stopwatch.lap_time() < pending);
}

#[test]
fn stopped_time_is_excluded() {
    let stopwatch = Stopwatch::default();
    thread::sleep(Duration::from_millis(10));
    stopwatch.stop();
    let frozen = stopwatch.elapsed_time();

    thread::sleep(Duration::from_millis(40));
    assert_eq!(stopwatch.elapsed_time(), frozen);

    stopwatch.start();
    let resumed = stopwatch.elapsed_time();
    assert!(resumed >= frozen);
    assert!(resumed < frozen + TimeDelta::milliseconds(30), "{resumed} vs {frozen}");
}

#[test]
fn concurrent_laps_are_all_recorded() {
    let stopwatch = Arc::new(Stopwatch::default());
    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let stopwatch = Arc::clone(&stopwatch);
            thread::spawn(move || {
                for step in 0..25 {
                    let mut data = LapData::new();
                    data.insert("worker".to_string(), json!(worker));
                    stopwatch.lap_with_data(format!("{worker}-{step}"), Some(data));
                    let _ = stopwatch.to_string();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker panicked");
    }

    let laps = stopwatch.laps();
    assert_eq!(laps.len(), 100);

    let total = laps
        .iter()
        .map(Lap::duration)
        .fold(TimeDelta::zero(), |sum, duration| sum + duration);
    assert!(total <= stopwatch.elapsed_time());
}

#[test]
fn object_rendering_is_valid_json_without_repeats() {
    let stopwatch = Stopwatch::default();
    stopwatch.set_formatting_mode(FormattingMode::JsonObjectMs);
    stopwatch.lap("connect");
    stopwatch.lap("query");

    let parsed: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&stopwatch.to_json_bytes()).expect("rendering should be JSON");

    assert_eq!(parsed.keys().collect::<Vec<_>>(), ["connect", "query"]);
    assert!(parsed.values().all(serde_json::Value::is_f64));
}
