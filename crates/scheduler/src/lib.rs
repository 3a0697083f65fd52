pub mod cadence;
pub mod clock;
pub mod config;
pub mod conflict;
pub mod generator;
pub mod mock;
pub mod notifier;
pub mod reminders;
pub mod runner;
pub mod scanner;
pub mod templates;

use std::sync::Arc;

use eyre::Result;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use tutorsync_core::store::{LeaseStore, SchedulingStore};

use crate::cadence::RecurringSchedule;
use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::generator::{GeneratorSettings, OccurrenceGenerator};
use crate::notifier::email::{ChannelEmailQueue, EmailWorker, LogTransport, MailTransport};
use crate::notifier::push::ConnectionRegistry;
use crate::notifier::strings::{BundledStrings, StringResources};
use crate::notifier::template::EmailTemplates;
use crate::notifier::{Notifier, NotifierSettings};
use crate::reminders::ReminderJob;
use crate::runner::{JobLease, RecurringTask, ScheduledJob};
use crate::templates::TemplateManager;

/// The wired set of jobs and services, ready to be started.
pub struct Scheduler {
    pub generator: Arc<OccurrenceGenerator>,
    pub reminders: Arc<ReminderJob>,
    pub templates: Arc<TemplateManager>,
    pub connections: Arc<ConnectionRegistry>,
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    lease: JobLease,
    generation_schedule: RecurringSchedule,
    reminder_schedule: RecurringSchedule,
    email_worker: Option<EmailWorker>,
}

impl Scheduler {
    pub fn build<S>(config: SchedulerConfig, store: Arc<S>, clock: Arc<dyn Clock>) -> Result<Self>
    where
        S: SchedulingStore + 'static,
    {
        Self::build_with_transport(config, store, clock, Arc::new(LogTransport))
    }

    pub fn build_with_transport<S>(
        config: SchedulerConfig,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self>
    where
        S: SchedulingStore + 'static,
    {
        config.validate()?;
        let generation_schedule = config.generation.schedule(config.timezone, config.jitter)?;
        let reminder_schedule = config.reminders.schedule(config.timezone, config.jitter)?;

        let leases: Arc<dyn LeaseStore> = store.clone();
        let lease = JobLease::new(leases, config.instance_id.clone(), config.lease_ttl);
        let store: Arc<dyn SchedulingStore> = store;

        let strings: Arc<dyn StringResources> = match &config.strings_file {
            Some(path) => Arc::new(BundledStrings::from_json_file(path)?),
            None => Arc::new(BundledStrings::english()),
        };

        let connections = Arc::new(ConnectionRegistry::new());
        let (email_queue, email_receiver) = ChannelEmailQueue::new(config.email_queue_capacity);

        let notifier = Arc::new(Notifier::new(
            Arc::clone(&store),
            connections.clone(),
            Arc::new(email_queue),
            strings,
            EmailTemplates::new(config.email_template_dir.clone()),
            Arc::clone(&clock),
            NotifierSettings {
                web_base_url: config.web_base_url.clone(),
                contact_email: config.contact_email.clone(),
                contact_phone: config.contact_phone.clone(),
            },
        ));

        let generator = Arc::new(OccurrenceGenerator::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
            Arc::clone(&clock),
            GeneratorSettings {
                timezone: config.timezone,
                horizon_days: config.horizon_days,
                min_session: config.min_session,
                conflict_policy: config.conflict_policy,
            },
        ));

        let reminders = Arc::new(ReminderJob::new(
            Arc::clone(&store),
            notifier,
            Arc::clone(&clock),
            config.timezone,
            config.lookahead_days,
        ));

        let templates = Arc::new(TemplateManager::new(
            store,
            Arc::clone(&clock),
            config.timezone,
            config.min_session,
            config.template_edit_policy,
        ));

        Ok(Self {
            generator,
            reminders,
            templates,
            connections,
            config,
            clock,
            lease,
            generation_schedule,
            reminder_schedule,
            email_worker: Some(EmailWorker::new(email_receiver, transport)),
        })
    }

    /// Spawns the generation and reminder loops and the email worker. Subsequent calls only
    /// spawn the loops again, never a second email worker.
    pub fn start(&mut self, cancel: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        if let Some(worker) = self.email_worker.take() {
            handles.push(tokio::spawn(worker.run(cancel.clone())));
        }

        handles.push(tokio::spawn(
            self.task(self.generator.clone(), self.generation_schedule.clone())
                .run(cancel.clone()),
        ));
        handles.push(tokio::spawn(
            self.task(self.reminders.clone(), self.reminder_schedule.clone())
                .run(cancel),
        ));

        info!(
            "Scheduler started as '{}' in {} (generation '{}', reminders '{}', horizon {} days, lookahead {} days)",
            self.config.instance_id,
            self.config.timezone,
            self.generation_schedule.expression(),
            self.reminder_schedule.expression(),
            self.config.horizon_days,
            self.config.lookahead_days
        );
        handles
    }

    /// The lease the recurring loops claim, for callers that trigger a job by hand.
    pub fn lease(&self) -> JobLease {
        self.lease.clone()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    fn task(&self, job: Arc<dyn ScheduledJob>, schedule: RecurringSchedule) -> RecurringTask {
        RecurringTask::new(job, schedule, Arc::clone(&self.clock))
            .with_lease(self.lease.clone())
            .run_on_startup(self.config.run_on_startup)
    }
}
