#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use tempfile::TempDir;
use uuid::Uuid;

use tutorsync_core::models::{
    relationship::{Contact, Relationship, RelationshipStatus},
    schedule::{OccurrenceStatus, ScheduleOccurrence},
    time_slot::TimeSlotTemplate,
};
use tutorsync_db::mock::memory::MemoryStore;
use tutorsync_scheduler::{
    clock::{Clock, ManualClock},
    config::{ConflictPolicy, TemplateEditPolicy},
    generator::{GeneratorSettings, OccurrenceGenerator},
    notifier::{
        email::{ChannelEmailQueue, EmailQueue},
        push::{ConnectionRegistry, PushChannel},
        strings::BundledStrings,
        template::{EmailTemplates, UNASSIGNED_EXERCISE_TEMPLATE},
        Notifier, NotifierSettings,
    },
    reminders::ReminderJob,
    templates::TemplateManager,
};

pub const REMINDER_HTML: &str = "<p>Hi {{ tutor_name }},</p>\
<p>Your session on {{date}} from {{start_time}} to {{end_time}} has no exercise yet.</p>\
<a href=\"{{link}}\">Assign one</a>\
<p>Questions? {{contact_email}}</p>";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, mi, 0).unwrap()
}

pub fn contact(name: &str) -> Contact {
    Contact {
        user_id: Uuid::new_v4(),
        display_name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: None,
    }
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub tutor: Contact,
    pub student: Contact,
    pub relationship: Relationship,
    pub template_dir: TempDir,
}

impl Fixture {
    /// A teaching relationship with the clock on Monday 2024-01-01 06:00 UTC.
    pub async fn new() -> Self {
        Self::at(at(2024, 1, 1, 6, 0)).await
    }

    pub async fn at(now: DateTime<Utc>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let tutor = contact("Tutor");
        let student = contact("Student");
        store.add_contact(tutor.clone()).await;
        store.add_contact(student.clone()).await;

        let relationship = Relationship {
            id: Uuid::new_v4(),
            tutor_id: tutor.user_id,
            student_id: student.user_id,
            status: RelationshipStatus::Teaching,
        };
        store.add_relationship(relationship.clone()).await;

        let template_dir = TempDir::new().unwrap();
        std::fs::write(
            template_dir.path().join(format!("{}.html", UNASSIGNED_EXERCISE_TEMPLATE)),
            REMINDER_HTML,
        )
        .unwrap();

        Self {
            store,
            clock: Arc::new(ManualClock::new(now)),
            tutor,
            student,
            relationship,
            template_dir,
        }
    }

    /// A second teaching relationship of the same tutor with a new student.
    pub async fn another_student(&self, name: &str) -> Relationship {
        let student = contact(name);
        self.store.add_contact(student.clone()).await;
        let relationship = Relationship {
            id: Uuid::new_v4(),
            tutor_id: self.tutor.user_id,
            student_id: student.user_id,
            status: RelationshipStatus::Teaching,
        };
        self.store.add_relationship(relationship.clone()).await;
        relationship
    }

    /// A teaching relationship with a new tutor, returning it with the tutor's contact.
    pub async fn another_tutor(&self, name: &str) -> (Relationship, Contact) {
        let tutor = contact(name);
        let student = contact(&format!("{}Student", name));
        self.store.add_contact(tutor.clone()).await;
        self.store.add_contact(student.clone()).await;
        let relationship = Relationship {
            id: Uuid::new_v4(),
            tutor_id: tutor.user_id,
            student_id: student.user_id,
            status: RelationshipStatus::Teaching,
        };
        self.store.add_relationship(relationship.clone()).await;
        (relationship, tutor)
    }

    pub async fn add_template(
        &self,
        relationship_id: Uuid,
        weekday: Weekday,
        start: NaiveTime,
        end: NaiveTime,
    ) -> TimeSlotTemplate {
        let template = TimeSlotTemplate::new(relationship_id, weekday, start, end, self.clock.now());
        self.store.add_template(template.clone()).await;
        // Keeps creation order stable for stores that sort by it.
        self.clock.advance(Duration::seconds(1));
        template
    }

    pub fn notifier(&self, push: Arc<dyn PushChannel>, email: Arc<dyn EmailQueue>) -> Arc<Notifier> {
        Arc::new(Notifier::new(
            self.store.clone(),
            push,
            email,
            Arc::new(BundledStrings::english()),
            EmailTemplates::new(self.template_dir.path()),
            self.clock.clone(),
            NotifierSettings {
                web_base_url: "https://app.example.com".to_string(),
                contact_email: "help@example.com".to_string(),
                contact_phone: None,
            },
        ))
    }

    pub fn generator(&self, notifier: Arc<Notifier>, policy: ConflictPolicy) -> OccurrenceGenerator {
        OccurrenceGenerator::new(
            self.store.clone(),
            notifier,
            self.clock.clone(),
            GeneratorSettings {
                timezone: Tz::UTC,
                horizon_days: 14,
                min_session: Duration::minutes(30),
                conflict_policy: policy,
            },
        )
    }

    pub fn reminder_job(&self, notifier: Arc<Notifier>) -> ReminderJob {
        ReminderJob::new(self.store.clone(), notifier, self.clock.clone(), Tz::UTC, 1)
    }

    pub fn template_manager(&self, policy: TemplateEditPolicy) -> TemplateManager {
        TemplateManager::new(
            self.store.clone(),
            self.clock.clone(),
            Tz::UTC,
            Duration::minutes(30),
            policy,
        )
    }
}

/// A one-off session not produced by any template.
pub fn occurrence(relationship_id: Uuid, on: NaiveDate, start: NaiveTime, end: NaiveTime) -> ScheduleOccurrence {
    ScheduleOccurrence {
        id: Uuid::new_v4(),
        relationship_id,
        template_id: None,
        date: on,
        start_time: start,
        end_time: end,
        exercise_id: None,
        exercise_type_id: None,
        is_hidden: false,
        status: OccurrenceStatus::Teaching,
        created_at: at(2023, 12, 1, 0, 0),
    }
}

/// A notifier whose push and email side effects go nowhere.
pub fn quiet_notifier(fixture: &Fixture) -> Arc<Notifier> {
    let (queue, _receiver) = ChannelEmailQueue::new(16);
    fixture.notifier(Arc::new(ConnectionRegistry::new()), Arc::new(queue))
}
