use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use pretty_assertions::assert_eq;
use tutorsync_core::{
    models::{
        notification::NotificationRecord,
        relationship::{Relationship, RelationshipStatus},
        schedule::{OccurrenceStatus, ScheduleOccurrence},
        time_slot::TimeSlotTemplate,
    },
    store::{LeaseStore, NotificationStore, OccurrenceStore, TemplateStore},
};
use tutorsync_db::mock::memory::MemoryStore;
use uuid::Uuid;

fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

async fn seeded_store(status: RelationshipStatus) -> (MemoryStore, Relationship, TimeSlotTemplate) {
    let store = MemoryStore::new();
    let relationship = Relationship {
        id: Uuid::new_v4(),
        tutor_id: Uuid::new_v4(),
        student_id: Uuid::new_v4(),
        status,
    };
    store.add_relationship(relationship.clone()).await;

    let template = TimeSlotTemplate::new(
        relationship.id,
        Weekday::Mon,
        time("14:00"),
        time("15:00"),
        Utc::now(),
    );
    store.add_template(template.clone()).await;

    (store, relationship, template)
}

#[tokio::test]
async fn test_active_templates_only_for_teaching_relationships() {
    let (store, relationship, template) = seeded_store(RelationshipStatus::Teaching).await;

    let active = store.active_templates().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].template.id, template.id);

    store
        .set_relationship_status(relationship.id, RelationshipStatus::Paused)
        .await;
    assert!(store.active_templates().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_insert_occurrences_skips_duplicate_slots() {
    let (store, _, template) = seeded_store(RelationshipStatus::Teaching).await;
    let first = ScheduleOccurrence::from_template(&template, date(19), Utc::now());
    let duplicate = ScheduleOccurrence::from_template(&template, date(19), Utc::now());

    assert_eq!(store.insert_occurrences(&[first.clone()]).await.unwrap(), 1);
    assert_eq!(store.insert_occurrences(&[duplicate]).await.unwrap(), 0);
    assert!(store
        .occurrence_exists(template.relationship_id, date(19), time("14:00"))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_hidden_occurrence_frees_its_slot() {
    let (store, _, template) = seeded_store(RelationshipStatus::Teaching).await;
    let first = ScheduleOccurrence::from_template(&template, date(19), Utc::now());
    store.insert_occurrences(&[first.clone()]).await.unwrap();

    assert_eq!(store.hide_occurrences(&[first.id]).await.unwrap(), 1);
    assert!(!store
        .occurrence_exists(template.relationship_id, date(19), time("14:00"))
        .await
        .unwrap());

    let again = ScheduleOccurrence::from_template(&template, date(19), Utc::now());
    assert_eq!(store.insert_occurrences(&[again]).await.unwrap(), 1);
    assert_eq!(store.occurrences().await.len(), 2);
}

#[tokio::test]
async fn test_unassigned_window_is_open_at_start() {
    let (store, _, template) = seeded_store(RelationshipStatus::Teaching).await;
    for day in [18, 19, 20] {
        store
            .add_occurrence(ScheduleOccurrence::from_template(&template, date(day), Utc::now()))
            .await;
    }

    let gaps = store.unassigned_occurrences(date(18), date(19)).await.unwrap();

    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].date, date(19));
}

#[tokio::test]
async fn test_complete_occurrences_before_leaves_hidden_rows() {
    let (store, _, template) = seeded_store(RelationshipStatus::Teaching).await;
    let past = ScheduleOccurrence::from_template(&template, date(12), Utc::now());
    let mut hidden = ScheduleOccurrence::from_template(&template, date(5), Utc::now());
    hidden.is_hidden = true;
    store.add_occurrence(past.clone()).await;
    store.add_occurrence(hidden.clone()).await;

    assert_eq!(store.complete_occurrences_before(date(18)).await.unwrap(), 1);

    let stored = store.get_occurrence(past.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OccurrenceStatus::Completed);
    let stored = store.get_occurrence(hidden.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OccurrenceStatus::Teaching);
}

#[tokio::test]
async fn test_notification_dedup_key_is_unique() {
    let store = MemoryStore::new();
    let receiver = Uuid::new_v4();
    let record = NotificationRecord::new(receiver, "a".into(), "/a".into(), Utc::now())
        .with_dedup_key("occ:unassigned_exercise:2026-10-18".into());
    let again = NotificationRecord::new(receiver, "b".into(), "/b".into(), Utc::now())
        .with_dedup_key("occ:unassigned_exercise:2026-10-18".into());

    assert!(store.insert_notification(&record).await.unwrap().is_some());
    assert!(store.insert_notification(&again).await.unwrap().is_none());
    assert_eq!(store.notifications_for(receiver, true).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_lease_is_exclusive_until_expiry() {
    let store = MemoryStore::new();
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 0, 5, 0).unwrap();
    let ttl = Duration::minutes(10);

    assert!(store.try_acquire_lease("generate", "a", now, ttl).await.unwrap());
    assert!(!store.try_acquire_lease("generate", "b", now, ttl).await.unwrap());
    assert!(store.try_acquire_lease("generate", "a", now, ttl).await.unwrap());
    assert!(store
        .try_acquire_lease("generate", "b", now + Duration::minutes(10), ttl)
        .await
        .unwrap());
    assert_eq!(store.lease_holder("generate").await.as_deref(), Some("b"));

    store.release_lease("generate", "a").await.unwrap();
    assert_eq!(store.lease_holder("generate").await.as_deref(), Some("b"));
    store.release_lease("generate", "b").await.unwrap();
    assert_eq!(store.lease_holder("generate").await, None);
}
