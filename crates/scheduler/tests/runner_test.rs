mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use chrono_tz::Tz;
use eyre::eyre;
use tokio::sync::watch;
use tutorsync_core::store::LeaseStore;
use tutorsync_db::mock::memory::MemoryStore;
use tutorsync_scheduler::{
    cadence::RecurringSchedule,
    clock::{Clock, ManualClock},
    runner::{JobLease, RecurringTask, ScheduledJob, TickOutcome},
};

use common::at;

#[derive(Default)]
struct CountingJob {
    runs: AtomicUsize,
    fail: bool,
    panic: bool,
}

#[async_trait]
impl ScheduledJob for CountingJob {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn run(&self) -> eyre::Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.panic {
            panic!("job blew up");
        }
        if self.fail {
            return Err(eyre!("job failed"));
        }
        Ok(())
    }
}

fn hourly() -> RecurringSchedule {
    RecurringSchedule::parse("0 0 * * * *", Tz::UTC).unwrap()
}

fn lease(store: &Arc<MemoryStore>, holder: &str) -> JobLease {
    JobLease::new(store.clone(), holder, Duration::minutes(10))
}

#[tokio::test]
async fn test_tick_runs_job() {
    let job = Arc::new(CountingJob::default());
    let task = RecurringTask::new(job.clone(), hourly(), Arc::new(ManualClock::new(at(2024, 1, 1, 0, 0))));

    assert_eq!(task.tick().await, TickOutcome::Completed);
    assert_eq!(job.runs.load(Ordering::SeqCst), 1);
}

#[test_log::test(tokio::test)]
async fn test_failing_and_panicking_jobs_are_contained() {
    let clock = Arc::new(ManualClock::new(at(2024, 1, 1, 0, 0)));
    let failing = Arc::new(CountingJob {
        fail: true,
        ..Default::default()
    });
    let panicking = Arc::new(CountingJob {
        panic: true,
        ..Default::default()
    });

    let failing_task = RecurringTask::new(failing.clone(), hourly(), clock.clone());
    let panicking_task = RecurringTask::new(panicking.clone(), hourly(), clock);

    assert_eq!(failing_task.tick().await, TickOutcome::Failed);
    assert_eq!(failing_task.tick().await, TickOutcome::Failed);
    assert_eq!(panicking_task.tick().await, TickOutcome::Failed);
    assert_eq!(failing.runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_only_one_instance_holds_the_lease() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(at(2024, 1, 1, 0, 0)));
    let job = Arc::new(CountingJob::default());

    let first = RecurringTask::new(job.clone(), hourly(), clock.clone()).with_lease(lease(&store, "instance-a"));
    let second = RecurringTask::new(job.clone(), hourly(), clock.clone()).with_lease(lease(&store, "instance-b"));

    assert_eq!(first.tick().await, TickOutcome::Completed);
    assert_eq!(second.tick().await, TickOutcome::Skipped);

    clock.advance(Duration::minutes(11));
    assert_eq!(second.tick().await, TickOutcome::Completed);
    assert_eq!(job.runs.load(Ordering::SeqCst), 2);
    assert_eq!(store.lease_holder("counting").await.as_deref(), Some("instance-b"));
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_ticks_until_cancelled() {
    let store = Arc::new(MemoryStore::new());
    let job = Arc::new(CountingJob::default());
    let task = RecurringTask::new(job.clone(), hourly(), Arc::new(ManualClock::new(at(2024, 1, 1, 0, 0))))
        .with_lease(lease(&store, "instance-a"))
        .run_on_startup(true);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let handle = tokio::spawn(task.run(cancel_rx));
    tokio::time::sleep(StdDuration::from_secs(3 * 3600 + 60)).await;
    cancel_tx.send(true).unwrap();
    tokio::time::timeout(StdDuration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    // One startup run plus one per elapsed hour.
    assert!(job.runs.load(Ordering::SeqCst) >= 3);
    // The lease is released on shutdown.
    assert_eq!(store.lease_holder("counting").await, None);
    assert!(store
        .try_acquire_lease("counting", "instance-b", at(2024, 1, 1, 0, 0), Duration::minutes(10))
        .await
        .unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_task_without_upcoming_runs_waits_for_cancel() {
    let job = Arc::new(CountingJob::default());
    let expired = RecurringSchedule::parse("0 0 0 1 1 * 2020", Tz::UTC).unwrap();
    let task = RecurringTask::new(job.clone(), expired, Arc::new(ManualClock::new(at(2024, 1, 1, 0, 0))));
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let handle = tokio::spawn(task.run(cancel_rx));
    tokio::time::sleep(StdDuration::from_secs(48 * 3600)).await;
    assert!(!handle.is_finished());

    cancel_tx.send(true).unwrap();
    tokio::time::timeout(StdDuration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_manual_claim_blocks_the_recurring_tick() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(at(2024, 1, 1, 0, 0)));
    let job = Arc::new(CountingJob::default());
    let other = lease(&store, "instance-b");

    assert!(other.acquire("counting", clock.now()).await.unwrap());
    let task = RecurringTask::new(job.clone(), hourly(), clock.clone()).with_lease(lease(&store, "instance-a"));
    assert_eq!(task.tick().await, TickOutcome::Skipped);

    other.release("counting").await.unwrap();
    assert_eq!(task.tick().await, TickOutcome::Completed);
    assert_eq!(other.holder(), "instance-b");
}
