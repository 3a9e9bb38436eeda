use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Tracks how many tasks are running and the highest count observed
#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_outcomes_follow_input_order() {
    // Later tasks finish first
    let tasks = (0..6u64).map(|i| {
        move || async move {
            tokio::time::sleep(Duration::from_millis((6 - i) * 10)).await;
            Ok::<u64, String>(i)
        }
    });

    let outcomes = run_bounded(tasks, 3).await;

    let values: Vec<u64> = outcomes.iter().map(|o| *o.value().unwrap()).collect();
    assert_eq!(values, vec![0, 1, 2, 3, 4, 5]);
    for (position, outcome) in outcomes.iter().enumerate() {
        assert_eq!(outcome.index, position);
    }
}

#[tokio::test]
async fn test_never_exceeds_limit() {
    for limit in 1..=4 {
        let gauge = Arc::new(Gauge::default());

        let tasks = (0..10).map(|i| {
            let gauge = gauge.clone();
            move || async move {
                gauge.enter();
                tokio::time::sleep(Duration::from_millis(5 + (i % 3) * 5)).await;
                gauge.exit();
                Ok::<_, String>(i)
            }
        });

        let outcomes = run_bounded(tasks, limit).await;

        assert_eq!(outcomes.len(), 10, "one outcome per task");
        let peak = gauge.peak.load(Ordering::SeqCst);
        assert!(peak <= limit, "peak {peak} exceeded limit {limit}");
        assert_eq!(peak, limit, "limit {limit} should be saturated with 10 tasks");
    }
}

#[tokio::test]
async fn test_zero_limit_runs_sequentially() {
    let gauge = Arc::new(Gauge::default());

    let tasks = (0..4).map(|i| {
        let gauge = gauge.clone();
        move || async move {
            gauge.enter();
            tokio::time::sleep(Duration::from_millis(5)).await;
            gauge.exit();
            Ok::<_, String>(i)
        }
    });

    let outcomes = run_bounded(tasks, 0).await;

    assert_eq!(outcomes.len(), 4);
    assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failures_do_not_cancel_siblings() {
    let completed = Arc::new(AtomicUsize::new(0));

    let tasks = (0..7).map(|i| {
        let completed = completed.clone();
        move || async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            completed.fetch_add(1, Ordering::SeqCst);
            if i % 3 == 0 {
                Err(format!("task {i} failed"))
            } else {
                Ok(i)
            }
        }
    });

    let outcomes = run_bounded(tasks, 2).await;

    assert_eq!(completed.load(Ordering::SeqCst), 7, "every task must run");
    assert_eq!(tally(&outcomes), (4, 3));
    assert_eq!(outcomes[3].error().map(String::as_str), Some("task 3 failed"));
    assert_eq!(outcomes[4].value(), Some(&4));
}

#[tokio::test]
async fn test_admission_slides_instead_of_batching() {
    let log = Arc::new(Mutex::new(Vec::<String>::new()));

    // Task 0 is slow; with batch-by-batch chunking task 2 could not start before it ends
    let tasks = (0..5u64).map(|i| {
        let log = log.clone();
        move || async move {
            log.lock().unwrap().push(format!("start {i}"));
            let ms = if i == 0 { 200 } else { 10 };
            tokio::time::sleep(Duration::from_millis(ms)).await;
            log.lock().unwrap().push(format!("end {i}"));
            Ok::<_, String>(i)
        }
    });

    run_bounded(tasks, 2).await;

    let log = log.lock().unwrap().clone();
    let position = |entry: &str| log.iter().position(|e| e == entry).unwrap();
    assert!(
        position("start 2") < position("end 0"),
        "task 2 should be admitted while task 0 is still running: {log:?}"
    );
    assert!(position("start 4") < position("end 0"), "{log:?}");
}

#[tokio::test]
async fn test_tasks_start_in_input_order() {
    let log = Arc::new(Mutex::new(Vec::<usize>::new()));

    let tasks = (0..6).map(|i| {
        let log = log.clone();
        move || async move {
            log.lock().unwrap().push(i);
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok::<_, String>(())
        }
    });

    run_bounded(tasks, 1).await;

    assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_empty_input() {
    let tasks: Vec<fn() -> std::future::Ready<Result<(), String>>> = Vec::new();
    let outcomes = run_bounded(tasks, 3).await;
    assert!(outcomes.is_empty());
}
