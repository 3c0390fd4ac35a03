//! End-to-end monitor loop on tokio's paused clock.

use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use cursor_monitor::activity::{ActivityTracker, IntervalCadence, SystemClock};
use cursor_monitor::config::MonitorConfig;
use cursor_monitor::monitor::{self, Monitor};
use cursor_monitor::presentation::{ColorClass, NotificationLevel};
use cursor_monitor::protocol::Command;
use cursor_monitor::sinks::MemorySink;
use cursor_monitor::sources::{ActivitySignal, HostEvent};

struct Harness {
    events: mpsc::Sender<HostEvent>,
    sink: MemorySink,
    stop: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<anyhow::Result<()>>,
}

fn spawn_monitor(config: MonitorConfig) -> Harness {
    let sink = MemorySink::new();
    let tracker = ActivityTracker::new(IntervalCadence::new(), SystemClock);
    let mut monitor = Monitor::new(tracker, Box::new(sink.clone()), Box::new(sink.clone()));
    monitor.start(&config);

    let (events, rx) = mpsc::channel(16);
    let (stop, stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(monitor::run(monitor, rx, None, async move {
        let _ = stop_rx.await;
    }));

    Harness {
        events,
        sink,
        stop: Some(stop),
        task,
    }
}

fn warnings(sink: &MemorySink) -> usize {
    sink.notifications()
        .iter()
        .filter(|n| n.level == NotificationLevel::Warning)
        .count()
}

async fn settle() {
    // Let the monitor task drain its channel without moving the clock far.
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn warns_once_after_threshold() {
    let harness = spawn_monitor(MonitorConfig::default());

    tokio::time::sleep(Duration::from_millis(49_500)).await;
    assert_eq!(warnings(&harness.sink), 0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(warnings(&harness.sink), 1);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(warnings(&harness.sink), 1);
    assert_eq!(harness.sink.last_status().unwrap().color, ColorClass::Error);

    harness.events.send(HostEvent::Shutdown).await.unwrap();
    harness.task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn activity_keeps_the_warning_away() {
    let harness = spawn_monitor(MonitorConfig::default());

    for _ in 0..10 {
        tokio::time::sleep(Duration::from_secs(30)).await;
        harness
            .events
            .send(HostEvent::Activity(ActivitySignal::DocumentEdited))
            .await
            .unwrap();
    }
    settle().await;

    assert_eq!(warnings(&harness.sink), 0);
    assert_eq!(harness.sink.last_status().unwrap().text, "💚 Active: 0s");

    harness.events.send(HostEvent::Shutdown).await.unwrap();
    harness.task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn disabled_monitor_never_ticks() {
    let harness = spawn_monitor(MonitorConfig::default());

    harness
        .events
        .send(HostEvent::Command(Command::Toggle))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(300)).await;

    assert_eq!(warnings(&harness.sink), 0);
    assert_eq!(
        harness.sink.last_status().unwrap().text,
        "🖱️ Monitor: OFF"
    );

    harness.events.send(HostEvent::Shutdown).await.unwrap();
    harness.task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_future_ends_the_loop() {
    let mut harness = spawn_monitor(MonitorConfig::default());

    tokio::time::sleep(Duration::from_secs(3)).await;
    harness.stop.take().unwrap().send(()).unwrap();
    harness.task.await.unwrap().unwrap();

    // Final frame after shutdown shows the monitor as off.
    assert_eq!(
        harness.sink.last_status().unwrap().text,
        "🖱️ Monitor: OFF"
    );
}
