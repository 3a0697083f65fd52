//! Delivers reminders: a persisted in-app record, a live push and an email.
//!
//! The record is the source of truth. Push and email are best effort and their failures
//! are logged without undoing the record.

pub mod email;
pub mod push;
pub mod strings;
pub mod template;

use std::sync::Arc;

use chrono::NaiveDate;
use eyre::Result;
use tracing::{debug, warn};
use uuid::Uuid;

use tutorsync_core::{
    models::{
        notification::{reminder_dedup_key, NotificationRecord, ReminderKind},
        relationship::Contact,
        schedule::ScheduleOccurrence,
    },
    store::{NotificationStore, SchedulingStore},
};

use crate::clock::Clock;
use crate::conflict::SlotConflict;
use email::{EmailMessage, EmailQueue};
use push::{PushChannel, NOTIFICATION_EVENT};
use strings::{StringResources, SCHEDULE_CONFLICT_NOTICE, UNASSIGNED_EXERCISE_REMINDER, UNASSIGNED_EXERCISE_SUBJECT};
use template::{EmailTemplates, ReminderEmail, UNASSIGNED_EXERCISE_TEMPLATE};

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub web_base_url: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotifyOutcome {
    /// The stored record, or `None` when this reminder was already sent in the cycle.
    pub record: Option<NotificationRecord>,
    pub pushed: bool,
    pub emailed: bool,
}

impl NotifyOutcome {
    pub fn is_duplicate(&self) -> bool {
        self.record.is_none()
    }
}

pub struct Notifier {
    store: Arc<dyn SchedulingStore>,
    push: Arc<dyn PushChannel>,
    email: Arc<dyn EmailQueue>,
    strings: Arc<dyn StringResources>,
    templates: EmailTemplates,
    clock: Arc<dyn Clock>,
    settings: NotifierSettings,
}

impl Notifier {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        push: Arc<dyn PushChannel>,
        email: Arc<dyn EmailQueue>,
        strings: Arc<dyn StringResources>,
        templates: EmailTemplates,
        clock: Arc<dyn Clock>,
        settings: NotifierSettings,
    ) -> Self {
        Self {
            store,
            push,
            email,
            strings,
            templates,
            clock,
            settings,
        }
    }

    /// Reminds `tutor` that `occurrence` has no exercise. At most once per occurrence and
    /// `cycle` date.
    pub async fn notify_unassigned(
        &self,
        occurrence: &ScheduleOccurrence,
        tutor: &Contact,
        cycle: NaiveDate,
    ) -> Result<NotifyOutcome> {
        let date = occurrence.date.format(DATE_FORMAT).to_string();
        let start = occurrence.start_time.format(TIME_FORMAT).to_string();
        let end = occurrence.end_time.format(TIME_FORMAT).to_string();

        let message = self
            .strings
            .get_string(UNASSIGNED_EXERCISE_REMINDER, &[&date, &start, &end]);
        let link = self.occurrence_link(occurrence);
        let record = NotificationRecord::new(tutor.user_id, message, link.clone(), self.clock.now())
            .with_dedup_key(reminder_dedup_key(occurrence.id, ReminderKind::UnassignedExercise, cycle));

        let Some(record) = self.store.insert_notification(&record).await? else {
            debug!("Occurrence {} already reminded for {}", occurrence.id, cycle);
            return Ok(NotifyOutcome::default());
        };

        let pushed = self.push_record(&record).await;

        let email = ReminderEmail {
            tutor_name: tutor.display_name.clone(),
            date: date.clone(),
            start_time: start,
            end_time: end,
            link,
            contact_email: self.settings.contact_email.clone(),
            contact_phone: self.settings.contact_phone.clone().unwrap_or_default(),
        };
        let emailed = match self.send_reminder_email(tutor, &date, &email).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Reminder email for occurrence {} not queued: {:?}", occurrence.id, e);
                false
            }
        };

        Ok(NotifyOutcome {
            record: Some(record),
            pushed,
            emailed,
        })
    }

    /// Tells the tutor a template date was skipped because of an overlap. In-app only.
    pub async fn notify_conflict(&self, tutor_id: Uuid, conflict: &SlotConflict) -> Result<NotifyOutcome> {
        let message = self.strings.get_string(
            SCHEDULE_CONFLICT_NOTICE,
            &[
                &conflict.date.format(DATE_FORMAT).to_string(),
                &conflict.requested.start.format(TIME_FORMAT).to_string(),
                &conflict.requested.end.format(TIME_FORMAT).to_string(),
                &conflict.existing.start.format(TIME_FORMAT).to_string(),
                &conflict.existing.end.format(TIME_FORMAT).to_string(),
            ],
        );
        let link = self.schedule_link(conflict.date, None);
        let record = NotificationRecord::new(tutor_id, message, link, self.clock.now()).with_dedup_key(
            reminder_dedup_key(conflict.template_id, ReminderKind::ScheduleConflict, conflict.date),
        );

        let Some(record) = self.store.insert_notification(&record).await? else {
            return Ok(NotifyOutcome::default());
        };
        let pushed = self.push_record(&record).await;

        Ok(NotifyOutcome {
            record: Some(record),
            pushed,
            emailed: false,
        })
    }

    async fn push_record(&self, record: &NotificationRecord) -> bool {
        let Some(connection_id) = self.push.connection_id(record.receiver_id).await else {
            debug!("User {} has no live connection", record.receiver_id);
            return false;
        };

        let payload = match serde_json::to_value(record) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize notification {}: {}", record.id, e);
                return false;
            }
        };

        match self
            .push
            .send_to_connection(&connection_id, NOTIFICATION_EVENT, payload)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Push to user {} failed: {:?}", record.receiver_id, e);
                false
            }
        }
    }

    async fn send_reminder_email(&self, tutor: &Contact, date: &str, values: &ReminderEmail) -> Result<()> {
        let html_body = self.templates.render(UNASSIGNED_EXERCISE_TEMPLATE, values).await?;
        let subject = self.strings.get_string(UNASSIGNED_EXERCISE_SUBJECT, &[date]);

        self.email
            .enqueue(EmailMessage {
                to: tutor.email.clone(),
                subject,
                html_body,
            })
            .await
    }

    fn occurrence_link(&self, occurrence: &ScheduleOccurrence) -> String {
        self.schedule_link(occurrence.date, Some(occurrence.id))
    }

    fn schedule_link(&self, date: NaiveDate, occurrence_id: Option<Uuid>) -> String {
        let mut link = format!(
            "{}/tutor/schedule?date={}",
            self.settings.web_base_url,
            urlencoding::encode(&date.format("%Y-%m-%d").to_string())
        );
        if let Some(id) = occurrence_id {
            link.push_str(&format!("&occurrenceId={}", id));
        }
        link
    }
}
