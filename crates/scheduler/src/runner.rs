//! Recurring task loop: sleep until the next fire time, claim the job lease, run, repeat.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use tutorsync_core::store::LeaseStore;

use crate::cadence::RecurringSchedule;
use crate::clock::Clock;

/// A unit of periodic work.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    /// Stable name, also used as the lease key.
    fn name(&self) -> &'static str;

    async fn run(&self) -> eyre::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed,
    Failed,
    /// Another instance holds the lease for this job.
    Skipped,
}

/// A TTL-bounded claim on a named job, shared by every instance through the store.
#[derive(Clone)]
pub struct JobLease {
    store: Arc<dyn LeaseStore>,
    holder: String,
    ttl: Duration,
}

impl JobLease {
    pub fn new(store: Arc<dyn LeaseStore>, holder: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            holder: holder.into(),
            ttl,
        }
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Claims `job` until `now + ttl`. `false` while another instance holds it.
    pub async fn acquire(&self, job: &str, now: DateTime<Utc>) -> eyre::Result<bool> {
        self.store.try_acquire_lease(job, &self.holder, now, self.ttl).await
    }

    pub async fn release(&self, job: &str) -> eyre::Result<()> {
        self.store.release_lease(job, &self.holder).await
    }
}

pub struct RecurringTask {
    job: Arc<dyn ScheduledJob>,
    schedule: RecurringSchedule,
    clock: Arc<dyn Clock>,
    lease: Option<JobLease>,
    run_on_startup: bool,
}

impl RecurringTask {
    pub fn new(job: Arc<dyn ScheduledJob>, schedule: RecurringSchedule, clock: Arc<dyn Clock>) -> Self {
        Self {
            job,
            schedule,
            clock,
            lease: None,
            run_on_startup: false,
        }
    }

    /// Only run a tick after claiming the job's lease.
    pub fn with_lease(mut self, lease: JobLease) -> Self {
        self.lease = Some(lease);
        self
    }

    pub fn run_on_startup(mut self, enabled: bool) -> Self {
        self.run_on_startup = enabled;
        self
    }

    /// Runs until `cancel` turns true or its sender is dropped.
    pub async fn run(self, mut cancel: watch::Receiver<bool>) {
        let name = self.job.name();
        info!("Recurring task '{}' started", name);

        let mut rng = StdRng::from_entropy();

        if self.run_on_startup && !*cancel.borrow() {
            self.tick().await;
        }

        loop {
            if *cancel.borrow() {
                break;
            }

            let now = self.clock.now();
            let Some(next) = self.schedule.next_run_after(now, &mut rng) else {
                warn!("Task '{}' has no upcoming run for '{}'", name, self.schedule.expression());
                let _ = cancel.wait_for(|stop| *stop).await;
                break;
            };
            let wait = (next - now).to_std().unwrap_or_default();
            debug!("Task '{}' next run at {}", name, next);

            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(wait) => {
                    self.tick().await;
                }
            }
        }

        self.release().await;
        info!("Recurring task '{}' stopped", name);
    }

    /// Runs the job once. Failures and panics are logged and the next tick retries.
    pub async fn tick(&self) -> TickOutcome {
        let name = self.job.name();

        if let Some(lease) = &self.lease {
            match lease.acquire(name, self.clock.now()).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Task '{}' skipped: lease held by another instance", name);
                    return TickOutcome::Skipped;
                }
                Err(e) => {
                    error!("Task '{}' could not claim its lease: {:?}", name, e);
                    return TickOutcome::Failed;
                }
            }
        }

        let job = Arc::clone(&self.job);
        match tokio::spawn(async move { job.run().await }).await {
            Ok(Ok(())) => TickOutcome::Completed,
            Ok(Err(e)) => {
                error!("Task '{}' failed: {:?}", name, e);
                TickOutcome::Failed
            }
            Err(e) => {
                error!("Task '{}' aborted: {}", name, e);
                TickOutcome::Failed
            }
        }
    }

    async fn release(&self) {
        if let Some(lease) = &self.lease {
            if let Err(e) = lease.release(self.job.name()).await {
                warn!("Task '{}' could not release its lease: {:?}", self.job.name(), e);
            }
        }
    }
}
